//! The module contains `Member` and the `members` table.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::Money;

/// A buyer with a cash balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub cash_balance: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub cash_balance_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_histories::Entity")]
    PurchaseHistories,
}

impl Related<super::purchase_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Member {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            cash_balance: Money::new(model.cash_balance_minor),
        }
    }
}

pub(crate) fn new_active_model(name: &str, cash_balance: Money) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::NotSet,
        name: ActiveValue::Set(name.to_string()),
        cash_balance_minor: ActiveValue::Set(cash_balance.minor()),
    }
}
