use std::collections::HashMap;

use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, Select, Statement, TransactionTrait, Value,
    prelude::*,
};

use crate::{
    DateRange, EngineError, Member, Money, PurchaseHistory, ResultEngine, SalesFilter,
    TopMembersFilter,
    purchase_histories,
};

use super::{Engine, with_tx};

/// Purchases of one mask at one pharmacy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesDetail {
    pub mask_id: i64,
    pub mask_name: String,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
    pub total_amount: Money,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SalesSummary {
    pub total_amount: Money,
    pub details: Vec<SalesDetail>,
}

/// A member ranked by spend. `transactions` is set only when requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSpending {
    pub member: Member,
    pub total_spent: Money,
    pub transactions: Option<Vec<PurchaseHistory>>,
}

/// `WHERE` fragments and their bound values, joined with `AND`.
#[derive(Default)]
struct Conditions {
    clauses: Vec<&'static str>,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, clause: &'static str, value: impl Into<Value>) {
        self.clauses.push(clause);
        self.values.push(value.into());
    }

    fn range(&mut self, range: Option<DateRange>) {
        if let Some(range) = range {
            self.push("ph.transaction_date >= ?", range.start);
            self.push("ph.transaction_date < ?", range.end);
        }
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

impl Engine {
    /// Amounts purchased per (mask, pharmacy), optionally restricted to a date
    /// range, a mask and a pharmacy.
    pub async fn mask_sales_summary(&self, filter: SalesFilter) -> ResultEngine<SalesSummary> {
        let mut conditions = Conditions::default();
        conditions.range(filter.range);
        if let Some(mask_id) = filter.mask_id {
            conditions.push("ph.mask_id = ?", mask_id);
        }
        if let Some(pharmacy_id) = filter.pharmacy_id {
            conditions.push("ph.pharmacy_id = ?", pharmacy_id);
        }

        with_tx!(self, |db_tx| {
            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                format!(
                    "SELECT ph.mask_id AS mask_id, m.name AS mask_name, \
                            ph.pharmacy_id AS pharmacy_id, p.name AS pharmacy_name, \
                            SUM(ph.amount_minor) AS total_amount_minor \
                     FROM purchase_histories ph \
                     JOIN masks m ON m.id = ph.mask_id \
                     JOIN pharmacies p ON p.id = ph.pharmacy_id \
                     {} \
                     GROUP BY ph.mask_id, m.name, ph.pharmacy_id, p.name \
                     ORDER BY ph.pharmacy_id, ph.mask_id",
                    conditions.sql()
                ),
                conditions.values,
            );

            let mut summary = SalesSummary::default();
            for row in db_tx.query_all(stmt).await? {
                let total_amount = Money::new(row.try_get("", "total_amount_minor")?);
                summary.total_amount = summary
                    .total_amount
                    .checked_add(total_amount)
                    .ok_or_else(|| EngineError::InvalidAmount("sales total overflow".to_string()))?;
                summary.details.push(SalesDetail {
                    mask_id: row.try_get("", "mask_id")?,
                    mask_name: row.try_get("", "mask_name")?,
                    pharmacy_id: row.try_get("", "pharmacy_id")?,
                    pharmacy_name: row.try_get("", "pharmacy_name")?,
                    total_amount,
                });
            }
            Ok(summary)
        })
    }

    /// Members ranked by total spend, highest first.
    ///
    /// Only members with at least one purchase in the range are ranked.
    pub async fn top_members(&self, filter: TopMembersFilter) -> ResultEngine<Vec<MemberSpending>> {
        let mut conditions = Conditions::default();
        conditions.range(filter.range);
        let mut values = conditions.values.clone();
        values.push(i64::try_from(filter.limit).unwrap_or(i64::MAX).into());

        with_tx!(self, |db_tx| {
            let stmt = Statement::from_sql_and_values(
                db_tx.get_database_backend(),
                format!(
                    "SELECT mb.id AS id, mb.name AS name, \
                            mb.cash_balance_minor AS cash_balance_minor, \
                            SUM(ph.amount_minor) AS total_spent_minor \
                     FROM members mb \
                     JOIN purchase_histories ph ON ph.member_id = mb.id \
                     {} \
                     GROUP BY mb.id, mb.name, mb.cash_balance_minor \
                     ORDER BY total_spent_minor DESC, mb.id \
                     LIMIT ?",
                    conditions.sql()
                ),
                values,
            );

            let mut ranking = Vec::new();
            for row in db_tx.query_all(stmt).await? {
                ranking.push(MemberSpending {
                    member: Member {
                        id: row.try_get("", "id")?,
                        name: row.try_get("", "name")?,
                        cash_balance: Money::new(row.try_get("", "cash_balance_minor")?),
                    },
                    total_spent: Money::new(row.try_get("", "total_spent_minor")?),
                    transactions: None,
                });
            }

            if filter.with_transactions && !ranking.is_empty() {
                let ids: Vec<i64> = ranking.iter().map(|entry| entry.member.id).collect();
                let mut by_member: HashMap<i64, Vec<PurchaseHistory>> = HashMap::new();
                for history in history_query(ids, filter.range).all(&db_tx).await? {
                    by_member
                        .entry(history.member_id)
                        .or_default()
                        .push(PurchaseHistory::from(history));
                }
                for entry in &mut ranking {
                    entry.transactions =
                        Some(by_member.remove(&entry.member.id).unwrap_or_default());
                }
            }

            Ok(ranking)
        })
    }

    /// A member's purchases, newest first.
    pub async fn member_purchases(
        &self,
        member_id: i64,
        range: Option<DateRange>,
    ) -> ResultEngine<Vec<PurchaseHistory>> {
        let models = history_query(vec![member_id], range)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(PurchaseHistory::from).collect())
    }
}

fn history_query(
    member_ids: Vec<i64>,
    range: Option<DateRange>,
) -> Select<purchase_histories::Entity> {
    let mut query = purchase_histories::Entity::find()
        .filter(purchase_histories::Column::MemberId.is_in(member_ids));
    if let Some(range) = range {
        query = query
            .filter(purchase_histories::Column::TransactionDate.gte(range.start))
            .filter(purchase_histories::Column::TransactionDate.lt(range.end));
    }
    query
        .order_by_desc(purchase_histories::Column::TransactionDate)
        .order_by_desc(purchase_histories::Column::Id)
}
