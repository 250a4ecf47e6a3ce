//! Weekly opening hours of a pharmacy.
//!
//! Hours are kept per day-of-week key (`Mon`..`Sun`) as an ordered list of
//! open/close intervals. A day without a key, or with an empty list, is
//! closed all day. An interval whose close time is earlier than its open time
//! runs past midnight.
//!
//! [`OpeningHours::parse`] turns the free-form schedule found in the import
//! files into this structure; [`is_open`] answers "open at `day`/`time`?" for
//! any of the shapes the hours can be stored in.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

pub use evaluator::{HoursSource, is_open};

mod evaluator;
mod parser;

/// Canonical weekday order used by day ranges.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A wall-clock time of day with minute precision, written `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Builds a time from hour (0..24) and minute (0..60).
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self((hour * 60 + minute) as u16))
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(value: NaiveTime) -> Self {
        Self((value.hour() * 60 + value.minute()) as u16)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = EngineError;

    /// Parses exactly `HH:MM` (two digits each, 24-hour clock).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidInput(format!("invalid time of day: {s}"));

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.chars().all(|c| c.is_ascii_digit());
        if !two_digits(hour) || !two_digits(minute) {
            return Err(invalid());
        }

        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One open/close pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub open: ClockTime,
    pub close: ClockTime,
}

impl Interval {
    pub fn new(open: ClockTime, close: ClockTime) -> Self {
        Self { open, close }
    }

    /// `true` when the interval runs past midnight (`22:00 - 03:00`).
    pub fn wraps_midnight(&self) -> bool {
        self.close < self.open
    }

    /// Inclusive on both ends.
    pub fn contains(&self, time: ClockTime) -> bool {
        if self.wraps_midnight() {
            time >= self.open || time <= self.close
        } else {
            self.open <= time && time <= self.close
        }
    }
}

/// Opening hours keyed by day.
///
/// Keys are normally the canonical abbreviations in [`WEEKDAYS`]; tokens the
/// parser does not recognise are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningHours(BTreeMap<String, Vec<Interval>>);

impl OpeningHours {
    /// Parses a schedule such as `"Mon - Fri 08:00 - 17:00 / Sat 10:00 - 12:00"`.
    ///
    /// Never fails: clauses that do not match the expected shape are skipped.
    pub fn parse(raw: &str) -> Self {
        parser::parse(raw)
    }

    /// Appends an interval to `day`, after the ones already present.
    pub fn push(&mut self, day: impl Into<String>, interval: Interval) {
        self.0.entry(day.into()).or_default().push(interval);
    }

    /// Intervals of `day` in insertion order; empty when the day is absent.
    pub fn intervals(&self, day: &str) -> &[Interval] {
        self.0.get(day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_day(&self, day: &str) -> bool {
        self.0.contains_key(day)
    }

    pub fn days(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` when one of the intervals of `day` contains `time`.
    pub fn is_open_at(&self, day: &str, time: ClockTime) -> bool {
        self.intervals(day)
            .iter()
            .any(|interval| interval.contains(time))
    }

    /// JSON text stored in `pharmacies.opening_hours`.
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self)
            .map_err(|err| EngineError::InvalidInput(format!("cannot encode opening hours: {err}")))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Like [`from_json`](Self::from_json), but a slot without a valid
    /// `open`/`close` pair is dropped instead of failing the whole map.
    /// Returns the hours and the number of dropped slots.
    pub fn from_json_lenient(raw: &str) -> Result<(Self, usize), serde_json::Error> {
        let days: BTreeMap<String, Vec<serde_json::Value>> = serde_json::from_str(raw)?;

        let mut hours = Self::default();
        let mut dropped = 0;
        for (day, slots) in days {
            let total = slots.len();
            let intervals: Vec<Interval> = slots
                .into_iter()
                .filter_map(|slot| serde_json::from_value(slot).ok())
                .collect();
            dropped += total - intervals.len();
            hours.0.insert(day, intervals);
        }
        Ok((hours, dropped))
    }
}
