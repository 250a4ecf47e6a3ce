//! Request validation.
//!
//! Each endpoint has one function turning its raw query/body into engine
//! command or filter values. All fields are checked before returning, so a
//! client sees every problem in one response.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;

use api_types::{
    mask::{MaskListQuery, SummaryQuery},
    member::TopMembersQuery,
    pharmacy::{MaskCountQuery, OpenQuery},
    purchase::PurchaseRequest,
    search::SearchQuery as RawSearchQuery,
};
use engine::{
    ClockTime, CountOperator, DateRange, MaskCountFilter, MaskSort, MaskSortKey, Money,
    PurchaseCmd, SalesFilter, SearchQuery, SearchScope, SortOrder, TopMembersFilter, WEEKDAYS,
};

/// Field name to messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// First message, used as the summary line of the response.
    pub fn first(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|messages| messages.first())
            .map(String::as_str)
            .next()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// `Ok(value)` when no error was recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_integer(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&str>,
    min: i64,
    max: Option<i64>,
) -> Option<i64> {
    let raw = raw?;
    let Ok(value) = raw.parse::<i64>() else {
        errors.add(field, format!("The {field} field must be an integer."));
        return None;
    };
    if value < min {
        errors.add(field, format!("The {field} field must be at least {min}."));
        return None;
    }
    if let Some(max) = max
        && value > max
    {
        errors.add(
            field,
            format!("The {field} field must not be greater than {max}."),
        );
        return None;
    }
    Some(value)
}

/// Any finite decimal number, without a limit on decimals.
fn parse_number(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<f64> {
    let Some(raw) = raw else {
        errors.add(field, format!("The {field} field is required."));
        return None;
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.add(field, format!("The {field} field must be a number."));
            None
        }
    }
}

fn cents(
    errors: &mut FieldErrors,
    field: &str,
    amount: Result<Money, engine::EngineError>,
) -> Option<Money> {
    match amount {
        Ok(amount) => Some(amount),
        Err(_) => {
            errors.add(field, format!("The {field} field is too large."));
            None
        }
    }
}

fn parse_date(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(
                field,
                format!("The {field} field must be a valid date (YYYY-MM-DD)."),
            );
            None
        }
    }
}

/// `start_date` and `end_date` come together, and the end is not before the
/// start.
fn parse_range(
    errors: &mut FieldErrors,
    start: Option<&str>,
    end: Option<&str>,
) -> Option<DateRange> {
    match (start, end) {
        (None, None) => return None,
        (Some(_), None) => {
            errors.add(
                "end_date",
                "The end_date field is required when start_date is present.",
            );
        }
        (None, Some(_)) => {
            errors.add(
                "start_date",
                "The start_date field is required when end_date is present.",
            );
        }
        (Some(_), Some(_)) => {}
    }

    let start = parse_date(errors, "start_date", start)?;
    let end = parse_date(errors, "end_date", end)?;
    match DateRange::from_dates(start, end) {
        Ok(range) => Some(range),
        Err(_) => {
            errors.add(
                "end_date",
                "The end_date field must be a date after or equal to start_date.",
            );
            None
        }
    }
}

fn parse_bool(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None => false,
        Some("1" | "true" | "on" | "yes") => true,
        Some("0" | "false" | "off" | "no") => false,
        Some(_) => {
            errors.add(field, format!("The {field} field must be true or false."));
            false
        }
    }
}

/// Day and time for `/pharmacies/open`; missing values are taken from `now`.
pub fn open_params<Tz>(
    query: &OpenQuery,
    now: DateTime<Tz>,
) -> Result<(String, ClockTime), FieldErrors>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut errors = FieldErrors::default();

    let day = match present(&query.day) {
        Some(day) if WEEKDAYS.contains(&day) => Some(day.to_string()),
        Some(_) => {
            errors.add(
                "day",
                format!("The day field must be one of: {}.", WEEKDAYS.join(", ")),
            );
            None
        }
        None => Some(now.format("%a").to_string()),
    };

    let time = match present(&query.time) {
        Some(raw) => match raw.parse::<ClockTime>() {
            Ok(time) => Some(time),
            Err(_) => {
                errors.add("time", "The time field must match the format H:i.");
                None
            }
        },
        None => Some(ClockTime::from(now.time())),
    };

    match (day, time) {
        (Some(day), Some(time)) if errors.is_empty() => Ok((day, time)),
        _ => Err(errors),
    }
}

pub fn mask_count_filter(query: &MaskCountQuery) -> Result<MaskCountFilter, FieldErrors> {
    let mut errors = FieldErrors::default();

    let min_price = parse_number(&mut errors, "min_price", present(&query.min_price));
    if min_price.is_some_and(|min| min < 0.0) {
        errors.add("min_price", "The min_price field must be at least 0.");
    }
    let max_price = parse_number(&mut errors, "max_price", present(&query.max_price));
    if let (Some(min), Some(max)) = (min_price, max_price)
        && max <= min
    {
        errors.add(
            "max_price",
            "The max_price field must be greater than min_price.",
        );
    }

    // Prices are whole cents, so the inclusive band narrows to the cents
    // inside it.
    let min_price =
        min_price.and_then(|min| cents(&mut errors, "min_price", Money::ceil_from_major(min)));
    let max_price =
        max_price.and_then(|max| cents(&mut errors, "max_price", Money::floor_from_major(max)));

    let mask_count = match present(&query.mask_count) {
        None => {
            errors.add("mask_count", "The mask_count field is required.");
            None
        }
        raw => parse_integer(&mut errors, "mask_count", raw, 1, None),
    };

    let operator = match present(&query.operator) {
        None => Some(CountOperator::default()),
        Some(raw) => match CountOperator::try_from(raw) {
            Ok(operator) => Some(operator),
            Err(_) => {
                errors.add("operator", "The selected operator is invalid.");
                None
            }
        },
    };

    match (min_price, max_price, mask_count, operator) {
        (Some(min_price), Some(max_price), Some(mask_count), Some(operator)) => {
            errors.finish(|| MaskCountFilter {
                min_price,
                max_price,
                mask_count: mask_count.unsigned_abs(),
                operator,
            })
        }
        _ => Err(errors),
    }
}

pub fn search_query(query: &RawSearchQuery) -> Result<SearchQuery, FieldErrors> {
    let mut errors = FieldErrors::default();

    let text = match present(&query.query) {
        Some(text) if text.chars().count() >= 2 => Some(text.to_string()),
        Some(_) => {
            errors.add("query", "The query field must be at least 2 characters.");
            None
        }
        None => {
            errors.add("query", "The query field is required.");
            None
        }
    };

    let scope = match present(&query.kind) {
        None => Some(SearchScope::default()),
        Some(raw) => match SearchScope::try_from(raw) {
            Ok(scope) => Some(scope),
            Err(_) => {
                errors.add("type", "The selected type is invalid.");
                None
            }
        },
    };

    let limit = match present(&query.limit) {
        None => Some(10),
        raw => parse_integer(&mut errors, "limit", raw, 1, Some(50)),
    };

    match (text, scope, limit) {
        (Some(text), Some(scope), Some(limit)) => errors.finish(|| SearchQuery {
            text,
            scope,
            limit: limit.unsigned_abs(),
        }),
        _ => Err(errors),
    }
}

pub fn mask_sort(query: &MaskListQuery) -> Result<MaskSort, FieldErrors> {
    let mut errors = FieldErrors::default();

    let key = match present(&query.sort_by) {
        None => MaskSortKey::default(),
        Some(raw) => MaskSortKey::try_from(raw).unwrap_or_else(|_| {
            errors.add("sort_by", "The sort_by field must be one of: name, price.");
            MaskSortKey::default()
        }),
    };
    let order = match present(&query.order) {
        None => SortOrder::default(),
        Some(raw) => SortOrder::try_from(raw).unwrap_or_else(|_| {
            errors.add("order", "The order field must be one of: asc, desc.");
            SortOrder::default()
        }),
    };

    errors.finish(|| MaskSort { key, order })
}

/// Shape checks for `/masks/summary`. Existence of the referenced mask and
/// pharmacy is checked by the handler.
pub fn sales_filter(query: &SummaryQuery) -> Result<SalesFilter, FieldErrors> {
    let mut errors = FieldErrors::default();

    let range = parse_range(
        &mut errors,
        present(&query.start_date),
        present(&query.end_date),
    );
    let mask_id = parse_integer(&mut errors, "mask_id", present(&query.mask_id), 1, None);
    let pharmacy_id = parse_integer(
        &mut errors,
        "pharmacy_id",
        present(&query.pharmacy_id),
        1,
        None,
    );

    errors.finish(|| SalesFilter {
        range,
        mask_id,
        pharmacy_id,
    })
}

pub fn top_members_filter(query: &TopMembersQuery) -> Result<TopMembersFilter, FieldErrors> {
    let mut errors = FieldErrors::default();

    let limit = match present(&query.limit) {
        None => Some(10),
        raw => parse_integer(&mut errors, "limit", raw, 1, Some(100)),
    };
    let range = parse_range(
        &mut errors,
        present(&query.start_date),
        present(&query.end_date),
    );
    let with_transactions = parse_bool(
        &mut errors,
        "with_transactions",
        present(&query.with_transactions),
    );

    match limit {
        Some(limit) => errors.finish(|| TopMembersFilter {
            limit: limit.unsigned_abs(),
            range,
            with_transactions,
        }),
        None => Err(errors),
    }
}

fn parse_id(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&serde_json::Value>,
) -> Option<i64> {
    let Some(raw) = raw.filter(|value| !value.is_null()) else {
        errors.add(field, format!("The {field} field is required."));
        return None;
    };
    let id = match raw {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    if id.is_none() {
        errors.add(field, format!("The {field} field must be an integer."));
    }
    id
}

pub fn purchase_cmd(request: &PurchaseRequest) -> Result<PurchaseCmd, FieldErrors> {
    let mut errors = FieldErrors::default();

    let member_id = parse_id(&mut errors, "user_id", request.user_id.as_ref());
    let pharmacy_id = parse_id(&mut errors, "pharmacy_id", request.pharmacy_id.as_ref());
    let mask_id = parse_id(&mut errors, "mask_id", request.mask_id.as_ref());

    match (member_id, pharmacy_id, mask_id) {
        (Some(member_id), Some(pharmacy_id), Some(mask_id)) => {
            errors.finish(|| PurchaseCmd::new(member_id, pharmacy_id, mask_id))
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn open_defaults_to_now() {
        // 2024-01-01 was a Monday.
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        let (day, time) = open_params(&OpenQuery::default(), now).unwrap();
        assert_eq!(day, "Mon");
        assert_eq!(time.to_string(), "09:30");

        let query = OpenQuery {
            day: some("Sat"),
            time: None,
        };
        let (day, time) = open_params(&query, now).unwrap();
        assert_eq!((day.as_str(), time.to_string().as_str()), ("Sat", "09:30"));
    }

    #[test]
    fn open_rejects_bad_day_and_time_together() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        let query = OpenQuery {
            day: some("Monday"),
            time: some("9:30"),
        };
        let errors = open_params(&query, now).unwrap_err();
        assert!(errors.contains("day"));
        assert!(errors.contains("time"));
    }

    #[test]
    fn mask_count_requires_band_and_count() {
        let errors = mask_count_filter(&MaskCountQuery::default()).unwrap_err();
        for field in ["min_price", "max_price", "mask_count"] {
            assert!(errors.contains(field), "{field}");
        }

        let query = MaskCountQuery {
            min_price: some("20"),
            max_price: some("10"),
            mask_count: some("0"),
            operator: some("!="),
        };
        let errors = mask_count_filter(&query).unwrap_err();
        for field in ["max_price", "mask_count", "operator"] {
            assert!(errors.contains(field), "{field}");
        }
    }

    #[test]
    fn mask_count_defaults_operator() {
        let query = MaskCountQuery {
            min_price: some("10"),
            max_price: some("35.5"),
            mask_count: some("2"),
            operator: None,
        };
        let filter = mask_count_filter(&query).unwrap();
        assert_eq!(filter.min_price, Money::new(10_00));
        assert_eq!(filter.max_price, Money::new(35_50));
        assert_eq!(filter.operator, CountOperator::Ge);
    }

    #[test]
    fn mask_count_accepts_bounds_finer_than_a_cent() {
        let query = MaskCountQuery {
            min_price: some("10.005"),
            max_price: some("35.559"),
            mask_count: some("1"),
            operator: some(">"),
        };
        let filter = mask_count_filter(&query).unwrap();
        assert_eq!(filter.min_price, Money::new(10_01));
        assert_eq!(filter.max_price, Money::new(35_55));

        let query = MaskCountQuery {
            min_price: some("-0.5"),
            max_price: some("abc"),
            mask_count: some("1"),
            operator: None,
        };
        let errors = mask_count_filter(&query).unwrap_err();
        assert!(errors.contains("min_price"));
        assert!(errors.contains("max_price"));
    }

    #[test]
    fn search_bounds() {
        let query = RawSearchQuery {
            query: some("m"),
            kind: some("shop"),
            limit: some("51"),
        };
        let errors = search_query(&query).unwrap_err();
        for field in ["query", "type", "limit"] {
            assert!(errors.contains(field), "{field}");
        }

        let query = RawSearchQuery {
            query: some("mask"),
            ..Default::default()
        };
        let parsed = search_query(&query).unwrap();
        assert_eq!((parsed.scope, parsed.limit), (SearchScope::Both, 10));
    }

    #[test]
    fn mask_sort_rejects_unknown_columns() {
        let query = MaskListQuery {
            sort_by: some("quantity; DROP TABLE masks"),
            order: some("ASC"),
        };
        assert!(mask_sort(&query).unwrap_err().contains("sort_by"));
    }

    #[test]
    fn date_range_rules() {
        let query = SummaryQuery {
            start_date: some("2021-01-10"),
            ..Default::default()
        };
        assert!(sales_filter(&query).unwrap_err().contains("end_date"));

        let query = SummaryQuery {
            start_date: some("2021-01-10"),
            end_date: some("2021-01-01"),
            ..Default::default()
        };
        assert!(sales_filter(&query).unwrap_err().contains("end_date"));

        let query = SummaryQuery {
            start_date: some("2021-01-01"),
            end_date: some("2021-01-01"),
            mask_id: some("3"),
            ..Default::default()
        };
        let filter = sales_filter(&query).unwrap();
        assert!(filter.range.is_some());
        assert_eq!(filter.mask_id, Some(3));
    }

    #[test]
    fn top_members_limit_and_flag() {
        let query = TopMembersQuery {
            limit: some("101"),
            with_transactions: some("maybe"),
            ..Default::default()
        };
        let errors = top_members_filter(&query).unwrap_err();
        assert!(errors.contains("limit"));
        assert!(errors.contains("with_transactions"));

        let query = TopMembersQuery {
            with_transactions: some("1"),
            ..Default::default()
        };
        let filter = top_members_filter(&query).unwrap();
        assert_eq!(filter.limit, 10);
        assert!(filter.with_transactions);
    }

    #[test]
    fn purchase_ids_are_required_integers() {
        let request = PurchaseRequest {
            user_id: Some(json!(1)),
            pharmacy_id: Some(json!("2")),
            mask_id: Some(json!(3)),
        };
        assert_eq!(purchase_cmd(&request).unwrap(), PurchaseCmd::new(1, 2, 3));

        let request = PurchaseRequest {
            user_id: None,
            pharmacy_id: Some(json!("two")),
            mask_id: Some(json!(null)),
        };
        let errors = purchase_cmd(&request).unwrap_err();
        for field in ["user_id", "pharmacy_id", "mask_id"] {
            assert!(errors.contains(field), "{field}");
        }
    }
}
