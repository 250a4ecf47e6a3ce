use std::path::Path;

use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ImportSummary, MemberRecord, Money, OpeningHours, PharmacyRecord, ResultEngine,
    import::{parse_transaction_date, read_records},
    masks, members, pharmacies,
    purchase_histories::{self, NewPurchaseHistory},
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// `true` when no pharmacy and no member has been stored yet.
    pub async fn is_empty(&self) -> ResultEngine<bool> {
        let pharmacy_count = pharmacies::Entity::find().count(&self.database).await?;
        let member_count = members::Entity::find().count(&self.database).await?;
        Ok(pharmacy_count == 0 && member_count == 0)
    }

    /// Reads both seed files and imports them. Fails before writing anything
    /// when a file is missing or is not valid JSON.
    pub async fn import_files(
        &self,
        pharmacies_path: &Path,
        users_path: &Path,
    ) -> ResultEngine<ImportSummary> {
        tracing::info!("reading pharmacies from {}", pharmacies_path.display());
        let pharmacy_records: Vec<PharmacyRecord> = read_records(pharmacies_path)?;
        tracing::info!("reading users from {}", users_path.display());
        let member_records: Vec<MemberRecord> = read_records(users_path)?;
        self.import(&pharmacy_records, &member_records).await
    }

    /// Writes pharmacies with their masks, then members with their purchase
    /// histories, in one transaction.
    ///
    /// History entries naming an unknown pharmacy, or a mask that pharmacy
    /// does not sell, are skipped with a warning.
    pub async fn import(
        &self,
        pharmacy_records: &[PharmacyRecord],
        member_records: &[MemberRecord],
    ) -> ResultEngine<ImportSummary> {
        let summary = with_tx!(self, |db_tx| {
            let mut summary = ImportSummary::default();
            for record in pharmacy_records {
                summary.masks += import_pharmacy(&db_tx, record).await?;
                summary.pharmacies += 1;
            }
            for record in member_records {
                let (written, skipped) = import_member(&db_tx, record).await?;
                summary.members += 1;
                summary.histories += written;
                summary.skipped_histories += skipped;
            }
            Ok::<_, EngineError>(summary)
        })?;

        tracing::info!(
            pharmacies = summary.pharmacies,
            masks = summary.masks,
            members = summary.members,
            histories = summary.histories,
            skipped = summary.skipped_histories,
            "import completed"
        );
        Ok(summary)
    }
}

/// Returns the number of masks written.
async fn import_pharmacy(
    db_tx: &DatabaseTransaction,
    record: &PharmacyRecord,
) -> ResultEngine<usize> {
    let name = normalize_required_name(&record.name, "pharmacy")?;
    let hours = OpeningHours::parse(&record.opening_hours);
    if hours.is_empty() && !record.opening_hours.trim().is_empty() {
        tracing::warn!(
            "no opening hours recognised for pharmacy '{name}': {}",
            record.opening_hours
        );
    }

    let cash_balance = Money::from_major(record.cash_balance)?;
    let pharmacy = pharmacies::new_active_model(&name, &hours, cash_balance)?
        .insert(db_tx)
        .await?;

    for mask in &record.masks {
        let mask_name = normalize_required_name(&mask.name, "mask")?;
        masks::new_active_model(pharmacy.id, &mask_name, Money::from_major(mask.price)?)
            .insert(db_tx)
            .await?;
    }
    Ok(record.masks.len())
}

/// Returns `(written, skipped)` history counts.
async fn import_member(
    db_tx: &DatabaseTransaction,
    record: &MemberRecord,
) -> ResultEngine<(usize, usize)> {
    let name = normalize_required_name(&record.name, "member")?;
    let member = members::new_active_model(&name, Money::from_major(record.cash_balance)?)
        .insert(db_tx)
        .await?;

    let (mut written, mut skipped) = (0, 0);
    for history in &record.purchase_histories {
        let Some(pharmacy) = pharmacies::Entity::find()
            .filter(pharmacies::Column::Name.eq(history.pharmacy_name.as_str()))
            .order_by_asc(pharmacies::Column::Id)
            .one(db_tx)
            .await?
        else {
            tracing::warn!(
                "pharmacy '{}' not found, skipping purchase history of '{name}'",
                history.pharmacy_name
            );
            skipped += 1;
            continue;
        };

        let Some(mask) = masks::Entity::find()
            .filter(masks::Column::PharmacyId.eq(pharmacy.id))
            .filter(masks::Column::Name.eq(history.mask_name.as_str()))
            .order_by_asc(masks::Column::Id)
            .one(db_tx)
            .await?
        else {
            tracing::warn!(
                "mask '{}' not found in pharmacy '{}', skipping purchase history of '{name}'",
                history.mask_name,
                history.pharmacy_name
            );
            skipped += 1;
            continue;
        };

        let row: purchase_histories::ActiveModel = NewPurchaseHistory {
            member_id: member.id,
            pharmacy_id: pharmacy.id,
            mask_id: mask.id,
            unit_price: None,
            amount: Money::from_major(history.transaction_amount)?,
            transaction_date: parse_transaction_date(&history.transaction_date)?,
        }
        .into();
        row.insert(db_tx).await?;
        written += 1;
    }
    Ok((written, skipped))
}
