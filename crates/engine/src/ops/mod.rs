use sea_orm::{DatabaseConnection, prelude::*};

use crate::{EngineError, Mask, Member, Pharmacy, ResultEngine, masks, members, pharmacies};

mod catalog;
mod import;
mod purchase;
mod reports;
mod search;

pub use catalog::PharmacyMaskCount;
pub use purchase::Receipt;
pub use reports::{MemberSpending, SalesDetail, SalesSummary};
pub use search::SearchHit;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Return a pharmacy by id.
    pub async fn pharmacy(&self, pharmacy_id: i64) -> ResultEngine<Pharmacy> {
        pharmacies::Entity::find_by_id(pharmacy_id)
            .one(&self.database)
            .await?
            .map(Pharmacy::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("pharmacy {pharmacy_id}")))
    }

    /// Return a member by id.
    pub async fn member(&self, member_id: i64) -> ResultEngine<Member> {
        members::Entity::find_by_id(member_id)
            .one(&self.database)
            .await?
            .map(Member::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("member {member_id}")))
    }

    /// Return a mask by id.
    pub async fn mask(&self, mask_id: i64) -> ResultEngine<Mask> {
        masks::Entity::find_by_id(mask_id)
            .one(&self.database)
            .await?
            .map(Mask::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("mask {mask_id}")))
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
