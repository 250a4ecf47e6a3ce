//! JSON shapes of the HTTP API.
//!
//! Money is always carried as integer minor units (`*_minor`, cents).
//! Query structs keep every parameter as an optional string so the server can
//! report every invalid field at once instead of failing on the first one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error {
    use super::*;

    /// Body of every non-2xx response.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: String,
        /// Field name to messages, for validation failures.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        pub fields: BTreeMap<String, Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub required_minor: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub current_balance_minor: Option<i64>,
        /// Present only when the server runs in debug mode.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub details: Option<String>,
    }
}

pub mod pharmacy {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OpeningInterval {
        pub open: String,
        pub close: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Pharmacy {
        pub id: i64,
        pub name: String,
        pub cash_balance_minor: i64,
        pub opening_hours: BTreeMap<String, Vec<OpeningInterval>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OpenQuery {
        pub day: Option<String>,
        pub time: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OpenResponse {
        pub day: String,
        pub time: String,
        pub data: Vec<Pharmacy>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaskCountQuery {
        pub min_price: Option<String>,
        pub max_price: Option<String>,
        pub mask_count: Option<String>,
        pub operator: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PharmacyMaskCount {
        pub id: i64,
        pub name: String,
        pub cash_balance_minor: i64,
        pub masks_count: u64,
        pub masks: Vec<super::mask::Mask>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaskCountMeta {
        pub min_price_minor: i64,
        pub max_price_minor: i64,
        pub mask_count: u64,
        pub operator: String,
        pub total_pharmacies: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaskCountResponse {
        pub data: Vec<PharmacyMaskCount>,
        pub meta: MaskCountMeta,
    }
}

pub mod mask {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Mask {
        pub id: i64,
        pub pharmacy_id: i64,
        pub name: String,
        pub price_minor: i64,
        pub quantity: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaskListQuery {
        pub sort_by: Option<String>,
        pub order: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub mask_id: Option<String>,
        pub pharmacy_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryTotals {
        pub total_amount_minor: i64,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub mask_id: Option<i64>,
        pub pharmacy_id: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryDetail {
        pub mask_id: i64,
        pub mask_name: String,
        pub pharmacy_id: i64,
        pub pharmacy_name: String,
        pub total_amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryResponse {
        pub summary: SummaryTotals,
        pub details: Vec<SummaryDetail>,
    }
}

pub mod search {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SearchQuery {
        pub query: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub limit: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum SearchHit {
        Pharmacy {
            id: i64,
            name: String,
            cash_balance_minor: i64,
            relevance: f64,
        },
        Mask {
            id: i64,
            name: String,
            price_minor: i64,
            pharmacy_id: i64,
            pharmacy_name: String,
            relevance: f64,
        },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SearchMeta {
        pub query: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub total_results: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SearchResponse {
        pub data: Vec<SearchHit>,
        pub meta: SearchMeta,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TopMembersQuery {
        pub limit: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub with_transactions: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Transaction {
        pub id: i64,
        pub pharmacy_id: i64,
        pub mask_id: i64,
        pub amount_minor: i64,
        pub unit_price_minor: Option<i64>,
        pub transaction_date: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RankedMember {
        pub id: i64,
        pub name: String,
        pub cash_balance_minor: i64,
        pub total_spent_minor: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub purchase_histories: Option<Vec<Transaction>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopMembersMeta {
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub limit: u64,
        pub total_members: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopMembersResponse {
        pub data: Vec<RankedMember>,
        pub meta: TopMembersMeta,
    }
}

pub mod purchase {
    use super::*;

    /// Ids are loose JSON values so that a wrong type is reported as a field
    /// error rather than a body rejection.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PurchaseRequest {
        pub user_id: Option<serde_json::Value>,
        pub pharmacy_id: Option<serde_json::Value>,
        pub mask_id: Option<serde_json::Value>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Receipt {
        pub message: String,
        pub transaction_id: i64,
        pub mask_name: String,
        pub pharmacy_name: String,
        pub unit_price_minor: i64,
        pub total_amount_minor: i64,
        pub user_new_balance_minor: i64,
        pub pharmacy_new_balance_minor: i64,
        pub transaction_date: DateTime<Utc>,
    }
}
