use std::collections::HashMap;

use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, Statement, TransactionTrait, prelude::*,
};

use crate::{
    ClockTime, Mask, MaskCountFilter, MaskSort, MaskSortKey, Pharmacy, ResultEngine, SortOrder,
    is_open, masks, pharmacies,
};

use super::{Engine, with_tx};

/// A pharmacy with the masks that fell inside the queried price band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PharmacyMaskCount {
    pub pharmacy: Pharmacy,
    pub mask_count: u64,
    pub masks: Vec<Mask>,
}

impl Engine {
    /// Pharmacies open on `day` (`Mon`..`Sun`) at `time`, ordered by id.
    ///
    /// Hours that cannot be decoded count as closed.
    pub async fn open_pharmacies(&self, day: &str, time: ClockTime) -> ResultEngine<Vec<Pharmacy>> {
        let models = pharmacies::Entity::find()
            .order_by_asc(pharmacies::Column::Id)
            .all(&self.database)
            .await?;

        Ok(models
            .into_iter()
            .filter(|model| is_open(model.hours_source(), day, time))
            .map(Pharmacy::from)
            .collect())
    }

    /// Pharmacies whose number of masks priced inside
    /// `[min_price, max_price]` satisfies the filter's comparison.
    ///
    /// Pharmacies with no mask in the band count as zero, so `< n` and `<= n`
    /// include them.
    pub async fn pharmacies_by_mask_count(
        &self,
        filter: MaskCountFilter,
    ) -> ResultEngine<Vec<PharmacyMaskCount>> {
        with_tx!(self, |db_tx| {
            let backend = db_tx.get_database_backend();
            let stmt = Statement::from_sql_and_values(
                backend,
                format!(
                    "SELECT p.id AS id, COUNT(m.id) AS mask_count \
                     FROM pharmacies p \
                     LEFT JOIN masks m \
                       ON m.pharmacy_id = p.id \
                      AND m.price_minor >= ? \
                      AND m.price_minor <= ? \
                     GROUP BY p.id \
                     HAVING COUNT(m.id) {} ? \
                     ORDER BY p.id",
                    filter.operator.as_str()
                ),
                vec![
                    filter.min_price.minor().into(),
                    filter.max_price.minor().into(),
                    i64::try_from(filter.mask_count).unwrap_or(i64::MAX).into(),
                ],
            );

            let mut counts: Vec<(i64, u64)> = Vec::new();
            for row in db_tx.query_all(stmt).await? {
                let id: i64 = row.try_get("", "id")?;
                let count: i64 = row.try_get("", "mask_count")?;
                counts.push((id, u64::try_from(count).unwrap_or_default()));
            }
            if counts.is_empty() {
                return Ok(Vec::new());
            }

            let ids: Vec<i64> = counts.iter().map(|(id, _)| *id).collect();
            let mut pharmacies_by_id: HashMap<i64, Pharmacy> = pharmacies::Entity::find()
                .filter(pharmacies::Column::Id.is_in(ids.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| (model.id, Pharmacy::from(model)))
                .collect();

            let mut masks_by_pharmacy: HashMap<i64, Vec<Mask>> = HashMap::new();
            let band = masks::Entity::find()
                .filter(masks::Column::PharmacyId.is_in(ids))
                .filter(masks::Column::PriceMinor.gte(filter.min_price.minor()))
                .filter(masks::Column::PriceMinor.lte(filter.max_price.minor()))
                .order_by_asc(masks::Column::PriceMinor)
                .order_by_asc(masks::Column::Id)
                .all(&db_tx)
                .await?;
            for model in band {
                masks_by_pharmacy
                    .entry(model.pharmacy_id)
                    .or_default()
                    .push(Mask::from(model));
            }

            Ok(counts
                .into_iter()
                .filter_map(|(id, mask_count)| {
                    pharmacies_by_id.remove(&id).map(|pharmacy| PharmacyMaskCount {
                        pharmacy,
                        mask_count,
                        masks: masks_by_pharmacy.remove(&id).unwrap_or_default(),
                    })
                })
                .collect())
        })
    }

    /// Masks sold by a pharmacy. An unknown pharmacy has no masks.
    pub async fn pharmacy_masks(&self, pharmacy_id: i64, sort: MaskSort) -> ResultEngine<Vec<Mask>> {
        let column = match sort.key {
            MaskSortKey::Name => masks::Column::Name,
            MaskSortKey::Price => masks::Column::PriceMinor,
        };
        let query = masks::Entity::find().filter(masks::Column::PharmacyId.eq(pharmacy_id));
        let query = match sort.order {
            SortOrder::Asc => query.order_by_asc(column),
            SortOrder::Desc => query.order_by_desc(column),
        };

        let models = query
            .order_by_asc(masks::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Mask::from).collect())
    }
}
