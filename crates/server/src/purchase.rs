//! Purchase endpoint

use api_types::purchase::{PurchaseRequest, Receipt};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use engine::EngineError;

use crate::{FieldErrors, ServerError, server::ServerState, validation};

/// Buys one mask for a member.
///
/// Unexpected failures are logged with the request ids and answered with a
/// generic 500; the underlying error is echoed only in debug mode.
pub async fn purchase(
    State(state): State<ServerState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<Receipt>, ServerError> {
    let Json(payload) = payload.map_err(|rejection| {
        let mut errors = FieldErrors::default();
        errors.add("body", rejection.body_text());
        ServerError::Validation(errors)
    })?;
    let cmd = validation::purchase_cmd(&payload).map_err(ServerError::Validation)?;

    match state.engine.purchase(cmd).await {
        Ok(receipt) => {
            tracing::info!(
                purchase_id = receipt.purchase_id,
                user_id = cmd.member_id,
                pharmacy_id = cmd.pharmacy_id,
                mask_id = cmd.mask_id,
                total_amount = %receipt.total_amount,
                "purchase completed"
            );
            Ok(Json(Receipt {
                message: "Purchase successful".to_string(),
                transaction_id: receipt.purchase_id,
                mask_name: receipt.mask_name,
                pharmacy_name: receipt.pharmacy_name,
                unit_price_minor: receipt.unit_price.minor(),
                total_amount_minor: receipt.total_amount.minor(),
                user_new_balance_minor: receipt.member_balance.minor(),
                pharmacy_new_balance_minor: receipt.pharmacy_balance.minor(),
                transaction_date: receipt.transaction_date,
            }))
        }
        Err(err @ (EngineError::NotFound(_) | EngineError::InsufficientFunds { .. })) => {
            Err(err.into())
        }
        Err(err) => {
            tracing::error!(
                user_id = cmd.member_id,
                pharmacy_id = cmd.pharmacy_id,
                mask_id = cmd.mask_id,
                "purchase failed: {err}"
            );
            Err(ServerError::Internal {
                message: "Purchase processing failed".to_string(),
                details: state.options.debug.then(|| err.to_string()),
            })
        }
    }
}
