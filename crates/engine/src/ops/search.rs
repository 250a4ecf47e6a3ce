use std::cmp::Ordering;

use sea_orm::{ConnectionTrait, DatabaseTransaction, Statement, TransactionTrait};

use crate::{Money, ResultEngine, SearchQuery};

use super::{Engine, with_tx};

/// One full-text match. `relevance` comes from the store's ranking and is
/// only comparable within one query.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchHit {
    Pharmacy {
        id: i64,
        name: String,
        cash_balance: Money,
        relevance: f64,
    },
    Mask {
        id: i64,
        name: String,
        price: Money,
        pharmacy_id: i64,
        pharmacy_name: String,
        relevance: f64,
    },
}

impl SearchHit {
    pub fn relevance(&self) -> f64 {
        match self {
            Self::Pharmacy { relevance, .. } | Self::Mask { relevance, .. } => *relevance,
        }
    }
}

/// Turns free text into an FTS5 query matching any of its words.
///
/// Every word is quoted, so operators and punctuation in the input are never
/// interpreted by the store.
fn match_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| format!("\"{word}\""))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" OR "))
}

impl Engine {
    /// Full-text search over pharmacy and/or mask names.
    ///
    /// Each side is ranked by the store and capped at `limit`; the merged list
    /// is ordered by relevance (best first) and truncated to `limit`.
    pub async fn search(&self, query: &SearchQuery) -> ResultEngine<Vec<SearchHit>> {
        let Some(expression) = match_expression(&query.text) else {
            return Ok(Vec::new());
        };
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        with_tx!(self, |db_tx| {
            let mut hits = Vec::new();
            if query.scope.includes_pharmacies() {
                hits.extend(search_pharmacies(&db_tx, &expression, limit).await?);
            }
            if query.scope.includes_masks() {
                hits.extend(search_masks(&db_tx, &expression, limit).await?);
            }

            hits.sort_by(|a, b| {
                b.relevance()
                    .partial_cmp(&a.relevance())
                    .unwrap_or(Ordering::Equal)
            });
            hits.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
            Ok(hits)
        })
    }
}

async fn search_pharmacies(
    db_tx: &DatabaseTransaction,
    expression: &str,
    limit: i64,
) -> ResultEngine<Vec<SearchHit>> {
    let stmt = Statement::from_sql_and_values(
        db_tx.get_database_backend(),
        "SELECT p.id AS id, p.name AS name, p.cash_balance_minor AS cash_balance_minor, \
                -bm25(pharmacies_fts) AS relevance \
         FROM pharmacies_fts \
         JOIN pharmacies p ON p.id = pharmacies_fts.rowid \
         WHERE pharmacies_fts MATCH ? \
         ORDER BY relevance DESC, p.id \
         LIMIT ?",
        vec![expression.into(), limit.into()],
    );

    let mut hits = Vec::new();
    for row in db_tx.query_all(stmt).await? {
        hits.push(SearchHit::Pharmacy {
            id: row.try_get("", "id")?,
            name: row.try_get("", "name")?,
            cash_balance: Money::new(row.try_get("", "cash_balance_minor")?),
            relevance: row.try_get("", "relevance")?,
        });
    }
    Ok(hits)
}

async fn search_masks(
    db_tx: &DatabaseTransaction,
    expression: &str,
    limit: i64,
) -> ResultEngine<Vec<SearchHit>> {
    let stmt = Statement::from_sql_and_values(
        db_tx.get_database_backend(),
        "SELECT m.id AS id, m.name AS name, m.price_minor AS price_minor, \
                m.pharmacy_id AS pharmacy_id, p.name AS pharmacy_name, \
                -bm25(masks_fts) AS relevance \
         FROM masks_fts \
         JOIN masks m ON m.id = masks_fts.rowid \
         JOIN pharmacies p ON p.id = m.pharmacy_id \
         WHERE masks_fts MATCH ? \
         ORDER BY relevance DESC, m.id \
         LIMIT ?",
        vec![expression.into(), limit.into()],
    );

    let mut hits = Vec::new();
    for row in db_tx.query_all(stmt).await? {
        hits.push(SearchHit::Mask {
            id: row.try_get("", "id")?,
            name: row.try_get("", "name")?,
            price: Money::new(row.try_get("", "price_minor")?),
            pharmacy_id: row.try_get("", "pharmacy_id")?,
            pharmacy_name: row.try_get("", "pharmacy_name")?,
            relevance: row.try_get("", "relevance")?,
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_expression_quotes_every_word() {
        assert_eq!(
            match_expression("True Barrier (green)").as_deref(),
            Some(r#""True" OR "Barrier" OR "green""#)
        );
    }

    #[test]
    fn match_expression_drops_operators() {
        assert_eq!(
            match_expression(r#"mask" OR NEAR(x"#).as_deref(),
            Some(r#""mask" OR "OR" OR "NEAR" OR "x""#)
        );
        assert_eq!(match_expression(" -*- "), None);
    }
}
