use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    EngineError, MissingRef, Money, PurchaseCmd, ResultEngine, masks, members, pharmacies,
    purchase_histories::{self, NewPurchaseHistory},
};

use super::{Engine, with_tx};

/// Outcome of a completed purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub purchase_id: i64,
    pub member_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub mask_name: String,
    pub pharmacy_name: String,
    pub unit_price: Money,
    pub total_amount: Money,
    pub member_balance: Money,
    pub pharmacy_balance: Money,
    pub transaction_date: DateTime<Utc>,
}

impl Engine {
    /// Buys one mask: debits the member, credits the pharmacy and appends a
    /// purchase history row, all in one transaction.
    ///
    /// Rows are locked member, then pharmacy, then mask. Every missing
    /// reference is reported in a single [`EngineError::NotFound`]. When the
    /// member cannot pay, nothing is written and
    /// [`EngineError::InsufficientFunds`] carries the price and the balance.
    ///
    /// Not idempotent: the same command run twice buys twice.
    pub async fn purchase(&self, cmd: PurchaseCmd) -> ResultEngine<Receipt> {
        let transaction_date = Utc::now();
        with_tx!(self, |db_tx| {
            let (member, pharmacy, mask) = lock_parties(&db_tx, cmd).await?;

            let total_amount = Money::new(mask.price_minor);
            let member_balance = Money::new(member.cash_balance_minor);
            if member_balance < total_amount {
                return Err(EngineError::InsufficientFunds {
                    required: total_amount,
                    available: member_balance,
                });
            }

            let member_balance = member_balance
                .checked_sub(total_amount)
                .ok_or_else(|| EngineError::InvalidAmount("member balance overflow".to_string()))?;
            let pharmacy_balance = Money::new(pharmacy.cash_balance_minor)
                .checked_add(total_amount)
                .ok_or_else(|| {
                    EngineError::InvalidAmount("pharmacy balance overflow".to_string())
                })?;

            members::ActiveModel {
                id: ActiveValue::Unchanged(member.id),
                cash_balance_minor: ActiveValue::Set(member_balance.minor()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            pharmacies::ActiveModel {
                id: ActiveValue::Unchanged(pharmacy.id),
                cash_balance_minor: ActiveValue::Set(pharmacy_balance.minor()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            let history: purchase_histories::ActiveModel = NewPurchaseHistory {
                member_id: member.id,
                pharmacy_id: pharmacy.id,
                mask_id: mask.id,
                unit_price: Some(Money::new(mask.price_minor)),
                amount: total_amount,
                transaction_date,
            }
            .into();
            let history = history.insert(&db_tx).await?;

            tracing::debug!(
                purchase_id = history.id,
                member_id = member.id,
                pharmacy_id = pharmacy.id,
                mask_id = mask.id,
                "purchase recorded"
            );

            Ok(Receipt {
                purchase_id: history.id,
                member_id: member.id,
                pharmacy_id: pharmacy.id,
                mask_id: mask.id,
                mask_name: mask.name,
                pharmacy_name: pharmacy.name,
                unit_price: Money::new(mask.price_minor),
                total_amount,
                member_balance,
                pharmacy_balance,
                transaction_date: history.transaction_date,
            })
        })
    }
}

/// Locks the three rows of a purchase in the fixed order member, pharmacy,
/// mask, and loads them.
///
/// The first statement is a no-op write on the member row. On SQLite it
/// upgrades the transaction to the single writer before anything is read, so
/// two purchases can never both read a balance and then both write it. On
/// backends with row locks the `FOR UPDATE` reads below do the same per row.
async fn lock_parties(
    db_tx: &DatabaseTransaction,
    cmd: PurchaseCmd,
) -> ResultEngine<(members::Model, pharmacies::Model, masks::Model)> {
    members::Entity::update_many()
        .col_expr(
            members::Column::CashBalanceMinor,
            Expr::col(members::Column::CashBalanceMinor).into(),
        )
        .filter(members::Column::Id.eq(cmd.member_id))
        .exec(db_tx)
        .await?;

    let member = members::Entity::find_by_id(cmd.member_id)
        .lock_exclusive()
        .one(db_tx)
        .await?;
    let pharmacy = pharmacies::Entity::find_by_id(cmd.pharmacy_id)
        .lock_exclusive()
        .one(db_tx)
        .await?;
    let mask = masks::Entity::find_by_id(cmd.mask_id)
        .lock_exclusive()
        .one(db_tx)
        .await?;

    match (member, pharmacy, mask) {
        (Some(member), Some(pharmacy), Some(mask)) => Ok((member, pharmacy, mask)),
        (member, pharmacy, mask) => {
            let mut missing = Vec::new();
            if member.is_none() {
                missing.push(MissingRef::Member(cmd.member_id));
            }
            if pharmacy.is_none() {
                missing.push(MissingRef::Pharmacy(cmd.pharmacy_id));
            }
            if mask.is_none() {
                missing.push(MissingRef::Mask(cmd.mask_id));
            }
            Err(EngineError::NotFound(missing))
        }
    }
}
