//! Free-form schedule parser.
//!
//! A schedule is a `/`-separated list of clauses. Each clause is a day list
//! followed by one interval:
//!
//! - `Mon, Wed, Fri 08:00 - 12:00` (explicit days, short or full names)
//! - `Mon - Fri 08:00 - 17:00` (range, wraps around the week: `Fri - Mon`)
//!
//! Parsing is permissive: non-matching clauses are skipped and day tokens that
//! are not weekday names are kept as they are.

use std::sync::OnceLock;

use regex::Regex;

use super::{ClockTime, Interval, OpeningHours, WEEKDAYS};

const FULL_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[allow(clippy::expect_used)]
fn clause_regex() -> &'static Regex {
    static CLAUSE: OnceLock<Regex> = OnceLock::new();
    CLAUSE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z,\s-]+)\s+(\d{2}:\d{2})\s*-\s*(\d{2}:\d{2})$")
            .expect("clause pattern compiles")
    })
}

#[allow(clippy::expect_used)]
fn range_regex() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z]{3})\s*-\s*([a-zA-Z]{3})$").expect("range pattern compiles")
    })
}

pub(super) fn parse(raw: &str) -> OpeningHours {
    let mut hours = OpeningHours::default();
    for clause in raw.split('/') {
        parse_clause(clause.trim(), &mut hours);
    }
    hours
}

fn parse_clause(clause: &str, hours: &mut OpeningHours) {
    let Some(captures) = clause_regex().captures(clause) else {
        return;
    };

    let (Ok(open), Ok(close)) = (
        captures[2].parse::<ClockTime>(),
        captures[3].parse::<ClockTime>(),
    ) else {
        return;
    };

    let interval = Interval::new(open, close);
    for day in parse_days(captures[1].trim()) {
        hours.push(day, interval);
    }
}

fn parse_days(days: &str) -> Vec<String> {
    if days.contains(',') {
        return days.split(',').map(|day| normalize_day(day.trim())).collect();
    }

    if let Some(captures) = range_regex().captures(days) {
        let start = WEEKDAYS.iter().position(|d| *d == &captures[1]);
        let end = WEEKDAYS.iter().position(|d| *d == &captures[2]);
        if let (Some(start), Some(end)) = (start, end) {
            return day_range(start, end);
        }
    }

    vec![normalize_day(days)]
}

/// Days from `start` to `end` inclusive, wrapping past Sunday.
fn day_range(start: usize, end: usize) -> Vec<String> {
    let len = if start <= end {
        end - start + 1
    } else {
        WEEKDAYS.len() - start + end + 1
    };
    WEEKDAYS
        .iter()
        .cycle()
        .skip(start)
        .take(len)
        .map(|day| (*day).to_string())
        .collect()
}

fn normalize_day(token: &str) -> String {
    FULL_NAMES
        .iter()
        .position(|full| *full == token)
        .map_or_else(|| token.to_string(), |index| WEEKDAYS[index].to_string())
}
