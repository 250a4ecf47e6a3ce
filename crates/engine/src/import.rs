//! Seed data files.
//!
//! Two JSON documents feed the store: a pharmacy catalog and a member list
//! with past purchases. Amounts are decimal numbers and are converted to
//! [`Money`](crate::Money) when the records are written.

use std::{fs, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyRecord {
    pub name: String,
    /// Free-form schedule, e.g. `Mon - Fri 08:00 - 17:00 / Sat 10:00 - 12:00`.
    #[serde(default)]
    pub opening_hours: String,
    pub cash_balance: f64,
    #[serde(default)]
    pub masks: Vec<MaskRecord>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MaskRecord {
    pub name: String,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub name: String,
    pub cash_balance: f64,
    #[serde(default)]
    pub purchase_histories: Vec<HistoryRecord>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub pharmacy_name: String,
    pub mask_name: String,
    pub transaction_amount: f64,
    /// `YYYY-MM-DD HH:MM:SS` (UTC) or RFC 3339.
    pub transaction_date: String,
}

/// What an import wrote, and how many history rows it had to skip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub pharmacies: usize,
    pub masks: usize,
    pub members: usize,
    pub histories: usize,
    pub skipped_histories: usize,
}

pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> ResultEngine<Vec<T>> {
    if !path.is_file() {
        return Err(EngineError::Import(format!(
            "file does not exist: {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| EngineError::Import(format!("cannot read {}: {err}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|err| EngineError::Import(format!("invalid JSON in {}: {err}", path.display())))
}

pub(crate) fn parse_transaction_date(raw: &str) -> ResultEngine<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(date.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(EngineError::Import(format!(
        "invalid transaction date: {raw}"
    )))
}
