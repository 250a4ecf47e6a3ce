//! The module contains `Pharmacy` and the `pharmacies` table.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{HoursSource, Money, OpeningHours, ResultEngine};

/// A seller with a cash balance and a catalog of masks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pharmacy {
    pub id: i64,
    pub name: String,
    pub opening_hours: OpeningHours,
    pub cash_balance: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pharmacies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// `OpeningHours` encoded as JSON.
    #[sea_orm(column_type = "Text")]
    pub opening_hours: String,
    pub cash_balance_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::masks::Entity")]
    Masks,
    #[sea_orm(has_many = "super::purchase_histories::Entity")]
    PurchaseHistories,
}

impl Related<super::masks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Masks.def()
    }
}

impl Related<super::purchase_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn hours_source(&self) -> HoursSource<'_> {
        HoursSource::Text(&self.opening_hours)
    }
}

impl From<Model> for Pharmacy {
    fn from(model: Model) -> Self {
        let opening_hours = model.hours_source().resolve().into_owned();
        Self {
            id: model.id,
            name: model.name,
            opening_hours,
            cash_balance: Money::new(model.cash_balance_minor),
        }
    }
}

/// Builds the row for a new pharmacy; the id is assigned by the store.
pub(crate) fn new_active_model(
    name: &str,
    opening_hours: &OpeningHours,
    cash_balance: Money,
) -> ResultEngine<ActiveModel> {
    Ok(ActiveModel {
        id: ActiveValue::NotSet,
        name: ActiveValue::Set(name.to_string()),
        opening_hours: ActiveValue::Set(opening_hours.to_json()?),
        cash_balance_minor: ActiveValue::Set(cash_balance.minor()),
    })
}
