use api_types::error::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerOptions, run, run_with_listener, spawn_with_listener};
pub use validation::FieldErrors;

mod masks;
mod members;
mod pharmacies;
mod purchase;
mod search;
mod server;
mod validation;

pub enum ServerError {
    /// Malformed or missing request parameters.
    Validation(FieldErrors),
    /// Same as `Validation`, answered with 422.
    Unprocessable(FieldErrors),
    Engine(EngineError),
    /// Unexpected failure. `details` is only filled in debug mode.
    Internal {
        message: String,
        details: Option<String>,
    },
    Generic(String),
}

fn field_error_body(errors: FieldErrors) -> ErrorBody {
    ErrorBody {
        error: errors
            .first()
            .unwrap_or("The given data was invalid.")
            .to_string(),
        fields: errors.into_inner(),
        ..Default::default()
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::NotFound(_)
        | EngineError::InsufficientFunds { .. }
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidInput(_)
        | EngineError::Import(_) => StatusCode::BAD_REQUEST,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorBody {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorBody {
                error: "internal server error".to_string(),
                ..Default::default()
            }
        }
        EngineError::NotFound(refs) => {
            let mut fields = FieldErrors::default();
            for missing in &refs {
                fields.add(
                    missing.field(),
                    format!("The selected {} is invalid.", missing.field()),
                );
            }
            ErrorBody {
                error: EngineError::NotFound(refs).to_string(),
                fields: fields.into_inner(),
                ..Default::default()
            }
        }
        EngineError::InsufficientFunds {
            required,
            available,
        } => ErrorBody {
            error: "Insufficient user balance".to_string(),
            required_minor: Some(required.minor()),
            current_balance_minor: Some(available.minor()),
            ..Default::default()
        },
        other => ErrorBody {
            error: other.to_string(),
            ..Default::default()
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Validation(errors) => (StatusCode::BAD_REQUEST, field_error_body(errors)),
            ServerError::Unprocessable(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, field_error_body(errors))
            }
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: message,
                    details,
                    ..Default::default()
                },
            ),
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err,
                    ..Default::default()
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use engine::{MissingRef, Money};
    use http_body_util::BodyExt;

    use super::*;

    async fn body(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn engine_key_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_references_map_to_field_errors() {
        let err = EngineError::NotFound(vec![MissingRef::Member(9), MissingRef::Mask(3)]);
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let json = body(res).await;
        assert!(json["fields"]["user_id"].is_array());
        assert!(json["fields"]["mask_id"].is_array());
        assert!(json["fields"].get("pharmacy_id").is_none());
    }

    #[tokio::test]
    async fn insufficient_funds_carries_amounts() {
        let err = EngineError::InsufficientFunds {
            required: Money::new(13_70),
            available: Money::new(5_00),
        };
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let json = body(res).await;
        assert_eq!(json["required_minor"], 1370);
        assert_eq!(json["current_balance_minor"], 500);
    }

    #[tokio::test]
    async fn database_errors_are_opaque() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk I/O error".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body(res).await;
        assert_eq!(json["error"], "internal server error");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn unprocessable_maps_to_422() {
        let mut errors = FieldErrors::default();
        errors.add("day", "bad day");
        let res = ServerError::Unprocessable(errors).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
