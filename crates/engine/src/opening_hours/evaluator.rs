use std::borrow::Cow;

use super::{ClockTime, OpeningHours};

/// Where a pharmacy's hours come from.
#[derive(Clone, Copy, Debug)]
pub enum HoursSource<'a> {
    /// Already decoded.
    Structured(&'a OpeningHours),
    /// JSON text, as stored in `pharmacies.opening_hours`.
    Text(&'a str),
    /// No hours recorded.
    Absent,
}

impl<'a> From<&'a OpeningHours> for HoursSource<'a> {
    fn from(value: &'a OpeningHours) -> Self {
        Self::Structured(value)
    }
}

impl<'a> From<Option<&'a str>> for HoursSource<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Absent, Self::Text)
    }
}

impl<'a> HoursSource<'a> {
    /// Decodes the source into hours.
    ///
    /// Absent or empty hours are closed every day. Malformed slots are
    /// dropped with a warning; text that is not a day map at all is logged and
    /// treated as closed. Errors never reach the caller.
    pub fn resolve(self) -> Cow<'a, OpeningHours> {
        match self {
            Self::Structured(hours) => Cow::Borrowed(hours),
            Self::Absent => Cow::Owned(OpeningHours::default()),
            Self::Text(raw) if raw.trim().is_empty() => Cow::Owned(OpeningHours::default()),
            Self::Text(raw) => match OpeningHours::from_json_lenient(raw) {
                Ok((hours, dropped)) => {
                    if dropped > 0 {
                        tracing::warn!("skipped {dropped} malformed opening-hours slot(s)");
                    }
                    Cow::Owned(hours)
                }
                Err(err) => {
                    tracing::error!("failed to decode opening hours: {err}");
                    Cow::Owned(OpeningHours::default())
                }
            },
        }
    }
}

/// Whether a pharmacy with hours from `source` is open on `day` at `time`.
pub fn is_open(source: HoursSource<'_>, day: &str, time: ClockTime) -> bool {
    source.resolve().is_open_at(day, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opening_hours::{Interval, WEEKDAYS};

    fn t(raw: &str) -> ClockTime {
        raw.parse().unwrap()
    }

    fn overnight_monday() -> OpeningHours {
        let mut hours = OpeningHours::default();
        hours.push("Mon", Interval::new(t("22:00"), t("03:00")));
        hours
    }

    #[test]
    fn wraparound_interval() {
        let hours = overnight_monday();
        assert!(is_open((&hours).into(), "Mon", t("01:00")));
        assert!(!is_open((&hours).into(), "Mon", t("12:00")));
    }

    #[test]
    fn absent_day_is_closed() {
        let hours = overnight_monday();
        assert!(!is_open((&hours).into(), "Tue", t("23:00")));
    }

    #[test]
    fn first_matching_interval_wins() {
        let mut hours = OpeningHours::default();
        hours.push("Wed", Interval::new(t("08:00"), t("12:00")));
        hours.push("Wed", Interval::new(t("14:00"), t("18:00")));
        assert!(is_open((&hours).into(), "Wed", t("15:00")));
        assert!(!is_open((&hours).into(), "Wed", t("13:00")));
    }

    #[test]
    fn text_source_is_decoded() {
        let raw = r#"{"Fri":[{"open":"09:00","close":"17:00"}]}"#;
        assert!(is_open(HoursSource::Text(raw), "Fri", t("09:00")));
        assert!(!is_open(HoursSource::Text(raw), "Thu", t("09:00")));
    }

    #[test]
    fn empty_absent_or_malformed_is_closed_everywhere() {
        for day in WEEKDAYS {
            for source in [
                HoursSource::Absent,
                HoursSource::Text(""),
                HoursSource::Text("{}"),
                HoursSource::Text("not json"),
                HoursSource::Text(r#"{"Mon":[{"open":"25:00","close":"26:00"}]}"#),
            ] {
                assert!(!is_open(source, day, t("12:00")));
            }
        }
    }

    #[test]
    fn malformed_slot_does_not_close_the_other_slots() {
        let raw = r#"{"Mon":[{"close":"12:00"},{"open":"14:00","close":"18:00"}],"Wed":[{"open":"08:00","close":"12:00"}]}"#;
        assert!(is_open(HoursSource::Text(raw), "Mon", t("15:00")));
        assert!(!is_open(HoursSource::Text(raw), "Mon", t("11:00")));
        assert!(is_open(HoursSource::Text(raw), "Wed", t("08:00")));
    }

    /// Reference truth table for `Mon - Fri 08:00 - 12:00 / Sat, Sun 22:00 - 02:00`,
    /// evaluated for every minute of the week.
    #[test]
    fn parsed_schedule_matches_truth_table_for_every_minute() {
        let hours = OpeningHours::parse("Mon - Fri 08:00 - 12:00 / Sat, Sun 22:00 - 02:00");
        let stored = hours.to_json().unwrap();

        for (index, day) in WEEKDAYS.iter().enumerate() {
            for minute in 0..(24 * 60) {
                let time = ClockTime::from_hm(minute / 60, minute % 60).unwrap();
                let expected = if index < 5 {
                    (8 * 60..=12 * 60).contains(&minute)
                } else {
                    minute >= 22 * 60 || minute <= 2 * 60
                };
                assert_eq!(
                    is_open((&hours).into(), day, time),
                    expected,
                    "{day} {time}"
                );
                assert_eq!(is_open(HoursSource::Text(&stored), day, time), expected);
            }
        }
    }
}
