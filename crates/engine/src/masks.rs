//! The module contains `Mask` and the `masks` table.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::Money;

/// A priced product sold by exactly one pharmacy.
///
/// `quantity` is stored but not tracked: imports set it to zero and purchases
/// leave it untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub id: i64,
    pub pharmacy_id: i64,
    pub name: String,
    pub price: Money,
    pub quantity: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "masks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pharmacy_id: i64,
    pub name: String,
    pub price_minor: i64,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pharmacies::Entity",
        from = "Column::PharmacyId",
        to = "super::pharmacies::Column::Id",
        on_delete = "Cascade"
    )]
    Pharmacies,
    #[sea_orm(has_many = "super::purchase_histories::Entity")]
    PurchaseHistories,
}

impl Related<super::pharmacies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pharmacies.def()
    }
}

impl Related<super::purchase_histories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Mask {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            pharmacy_id: model.pharmacy_id,
            name: model.name,
            price: Money::new(model.price_minor),
            quantity: model.quantity,
        }
    }
}

pub(crate) fn new_active_model(pharmacy_id: i64, name: &str, price: Money) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::NotSet,
        pharmacy_id: ActiveValue::Set(pharmacy_id),
        name: ActiveValue::Set(name.to_string()),
        price_minor: ActiveValue::Set(price.minor()),
        quantity: ActiveValue::Set(0),
    }
}
