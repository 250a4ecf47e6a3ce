//! Command and filter structs for engine operations.
//!
//! These types group parameters for the purchase and for the report queries,
//! keeping call sites readable and avoiding long argument lists. Every value
//! here is already validated: building one from raw input is the caller's
//! job.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::{EngineError, Money, ResultEngine};

/// Buy one mask from a pharmacy on behalf of a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseCmd {
    pub member_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
}

impl PurchaseCmd {
    #[must_use]
    pub fn new(member_id: i64, pharmacy_id: i64, mask_id: i64) -> Self {
        Self {
            member_id,
            pharmacy_id,
            mask_id,
        }
    }
}

/// Comparison applied to the number of masks in a price band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountOperator {
    Gt,
    #[default]
    Ge,
    Lt,
    Le,
    Eq,
}

impl CountOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
        }
    }
}

impl TryFrom<&str> for CountOperator {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            "=" => Ok(Self::Eq),
            other => Err(EngineError::InvalidInput(format!(
                "invalid operator: {other}"
            ))),
        }
    }
}

/// Pharmacies whose count of masks priced in `[min_price, max_price]`
/// satisfies `operator mask_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskCountFilter {
    pub min_price: Money,
    pub max_price: Money,
    pub mask_count: u64,
    pub operator: CountOperator,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskSortKey {
    Name,
    #[default]
    Price,
}

impl TryFrom<&str> for MaskSortKey {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            other => Err(EngineError::InvalidInput(format!(
                "cannot sort masks by {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl TryFrom<&str> for SortOrder {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(EngineError::InvalidInput(format!(
                "invalid sort order: {value}"
            ))),
        }
    }
}

/// Ordering of a pharmacy's masks. Defaults to most expensive first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskSort {
    pub key: MaskSortKey,
    pub order: SortOrder,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchScope {
    Pharmacy,
    Mask,
    #[default]
    Both,
}

impl SearchScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pharmacy => "pharmacy",
            Self::Mask => "mask",
            Self::Both => "both",
        }
    }

    pub fn includes_pharmacies(self) -> bool {
        matches!(self, Self::Pharmacy | Self::Both)
    }

    pub fn includes_masks(self) -> bool {
        matches!(self, Self::Mask | Self::Both)
    }
}

impl TryFrom<&str> for SearchScope {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pharmacy" => Ok(Self::Pharmacy),
            "mask" => Ok(Self::Mask),
            "both" => Ok(Self::Both),
            other => Err(EngineError::InvalidInput(format!(
                "invalid search type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub scope: SearchScope,
    pub limit: u64,
}

/// Half-open UTC interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Whole calendar days from `start` to `end`, both included.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if end < start {
            return Err(EngineError::InvalidInput(
                "end date must not be before start date".to_string(),
            ));
        }
        let end = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| EngineError::InvalidInput("end date out of range".to_string()))?;
        Ok(Self {
            start: start.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: end.and_time(chrono::NaiveTime::MIN).and_utc(),
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SalesFilter {
    pub range: Option<DateRange>,
    pub mask_id: Option<i64>,
    pub pharmacy_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopMembersFilter {
    pub limit: u64,
    pub range: Option<DateRange>,
    pub with_transactions: bool,
}

impl Default for TopMembersFilter {
    fn default() -> Self {
        Self {
            limit: 10,
            range: None,
            with_transactions: false,
        }
    }
}
