//! Mask API endpoints

use api_types::mask::{
    Mask as MaskView, MaskListQuery, SummaryDetail, SummaryQuery, SummaryResponse, SummaryTotals,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::{EngineError, Mask};

use crate::{FieldErrors, ServerError, server::ServerState, validation};

pub(crate) fn mask_view(mask: Mask) -> MaskView {
    MaskView {
        id: mask.id,
        pharmacy_id: mask.pharmacy_id,
        name: mask.name,
        price_minor: mask.price.minor(),
        quantity: mask.quantity,
    }
}

/// Masks sold by a pharmacy, by price (most expensive first) unless asked
/// otherwise.
pub async fn list_for_pharmacy(
    State(state): State<ServerState>,
    Path(pharmacy_id): Path<i64>,
    Query(query): Query<MaskListQuery>,
) -> Result<Json<Vec<MaskView>>, ServerError> {
    let sort = validation::mask_sort(&query).map_err(ServerError::Validation)?;
    let masks = state.engine.pharmacy_masks(pharmacy_id, sort).await?;
    Ok(Json(masks.into_iter().map(mask_view).collect()))
}

/// Purchase totals per mask and pharmacy.
pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ServerError> {
    let filter = validation::sales_filter(&query).map_err(ServerError::Validation)?;

    let mut errors = FieldErrors::default();
    if let Some(mask_id) = filter.mask_id {
        match state.engine.mask(mask_id).await {
            Ok(_) => {}
            Err(EngineError::KeyNotFound(_)) => errors.add("mask_id", "The selected mask_id is invalid."),
            Err(err) => return Err(err.into()),
        }
    }
    if let Some(pharmacy_id) = filter.pharmacy_id {
        match state.engine.pharmacy(pharmacy_id).await {
            Ok(_) => {}
            Err(EngineError::KeyNotFound(_)) => {
                errors.add("pharmacy_id", "The selected pharmacy_id is invalid.")
            }
            Err(err) => return Err(err.into()),
        }
    }
    if !errors.is_empty() {
        return Err(ServerError::Validation(errors));
    }

    let summary = state.engine.mask_sales_summary(filter).await?;

    Ok(Json(SummaryResponse {
        summary: SummaryTotals {
            total_amount_minor: summary.total_amount.minor(),
            start_date: query.start_date,
            end_date: query.end_date,
            mask_id: filter.mask_id,
            pharmacy_id: filter.pharmacy_id,
        },
        details: summary
            .details
            .into_iter()
            .map(|detail| SummaryDetail {
                mask_id: detail.mask_id,
                mask_name: detail.mask_name,
                pharmacy_id: detail.pharmacy_id,
                pharmacy_name: detail.pharmacy_name,
                total_amount_minor: detail.total_amount.minor(),
            })
            .collect(),
    }))
}
