//! Purchase ledger.
//!
//! A `PurchaseHistory` row is written once per completed purchase (or per
//! imported history entry) and never updated afterwards.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseHistory {
    pub id: i64,
    pub member_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    /// Mask price at purchase time; unknown for imported history.
    pub unit_price: Option<Money>,
    pub amount: Money,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchase_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub member_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub unit_price_minor: Option<i64>,
    pub amount_minor: i64,
    pub transaction_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_delete = "Cascade"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::pharmacies::Entity",
        from = "Column::PharmacyId",
        to = "super::pharmacies::Column::Id",
        on_delete = "Cascade"
    )]
    Pharmacies,
    #[sea_orm(
        belongs_to = "super::masks::Entity",
        from = "Column::MaskId",
        to = "super::masks::Column::Id",
        on_delete = "Cascade"
    )]
    Masks,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::pharmacies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pharmacies.def()
    }
}

impl Related<super::masks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Masks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PurchaseHistory {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            member_id: model.member_id,
            pharmacy_id: model.pharmacy_id,
            mask_id: model.mask_id,
            unit_price: model.unit_price_minor.map(Money::new),
            amount: Money::new(model.amount_minor),
            transaction_date: model.transaction_date,
        }
    }
}

pub(crate) struct NewPurchaseHistory {
    pub member_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub unit_price: Option<Money>,
    pub amount: Money,
    pub transaction_date: DateTime<Utc>,
}

impl From<NewPurchaseHistory> for ActiveModel {
    fn from(row: NewPurchaseHistory) -> Self {
        Self {
            id: ActiveValue::NotSet,
            member_id: ActiveValue::Set(row.member_id),
            pharmacy_id: ActiveValue::Set(row.pharmacy_id),
            mask_id: ActiveValue::Set(row.mask_id),
            unit_price_minor: ActiveValue::Set(row.unit_price.map(Money::minor)),
            amount_minor: ActiveValue::Set(row.amount.minor()),
            transaction_date: ActiveValue::Set(row.transaction_date),
        }
    }
}
