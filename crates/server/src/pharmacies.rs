//! Pharmacy API endpoints

use std::collections::BTreeMap;

use api_types::pharmacy::{
    MaskCountMeta, MaskCountQuery, MaskCountResponse, OpenQuery, OpenResponse, OpeningInterval,
    Pharmacy as PharmacyView, PharmacyMaskCount,
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::Pharmacy;

use crate::{ServerError, masks::mask_view, server::ServerState, validation};

pub(crate) fn pharmacy_view(pharmacy: Pharmacy) -> PharmacyView {
    let opening_hours: BTreeMap<String, Vec<OpeningInterval>> = pharmacy
        .opening_hours
        .days()
        .map(|day| {
            let intervals = pharmacy
                .opening_hours
                .intervals(day)
                .iter()
                .map(|interval| OpeningInterval {
                    open: interval.open.to_string(),
                    close: interval.close.to_string(),
                })
                .collect();
            (day.to_string(), intervals)
        })
        .collect();

    PharmacyView {
        id: pharmacy.id,
        name: pharmacy.name,
        cash_balance_minor: pharmacy.cash_balance.minor(),
        opening_hours,
    }
}

/// Pharmacies open at a day and time, "now" by default.
pub async fn open(
    State(state): State<ServerState>,
    Query(query): Query<OpenQuery>,
) -> Result<Json<OpenResponse>, ServerError> {
    let now = Utc::now().with_timezone(&state.options.timezone);
    let (day, time) = validation::open_params(&query, now).map_err(ServerError::Unprocessable)?;

    let pharmacies = state.engine.open_pharmacies(&day, time).await?;

    Ok(Json(OpenResponse {
        day,
        time: time.to_string(),
        data: pharmacies.into_iter().map(pharmacy_view).collect(),
    }))
}

/// Pharmacies filtered by how many of their masks fall in a price band.
pub async fn by_mask_count(
    State(state): State<ServerState>,
    Query(query): Query<MaskCountQuery>,
) -> Result<Json<MaskCountResponse>, ServerError> {
    let filter = validation::mask_count_filter(&query).map_err(ServerError::Validation)?;

    let found = state.engine.pharmacies_by_mask_count(filter).await?;
    let data: Vec<PharmacyMaskCount> = found
        .into_iter()
        .map(|entry| PharmacyMaskCount {
            id: entry.pharmacy.id,
            name: entry.pharmacy.name,
            cash_balance_minor: entry.pharmacy.cash_balance.minor(),
            masks_count: entry.mask_count,
            masks: entry.masks.into_iter().map(mask_view).collect(),
        })
        .collect();

    Ok(Json(MaskCountResponse {
        meta: MaskCountMeta {
            min_price_minor: filter.min_price.minor(),
            max_price_minor: filter.max_price.minor(),
            mask_count: filter.mask_count,
            operator: filter.operator.as_str().to_string(),
            total_pharmacies: data.len(),
        },
        data,
    }))
}
