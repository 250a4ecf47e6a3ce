use axum::{
    Router,
    routing::{get, post},
};
use chrono_tz::Tz;

use std::sync::Arc;

use crate::{masks, members, pharmacies, purchase, search};
use engine::Engine;

/// Runtime switches of the HTTP layer.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    /// Zone used for "now" when `/pharmacies/open` gets no day or time.
    pub timezone: Tz,
    /// Expose internal error details in 500 responses.
    pub debug: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            debug: false,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub options: ServerOptions,
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/pharmacies/open", get(pharmacies::open))
        .route("/pharmacies/masks/count", get(pharmacies::by_mask_count))
        .route("/pharmacies/{id}/masks", get(masks::list_for_pharmacy))
        .route("/masks/summary", get(masks::summary))
        .route("/search", get(search::search))
        .route("/top-members", get(members::top_members))
        .route("/purchase", post(purchase::purchase))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str, options: ServerOptions) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, options, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        options,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    options: ServerOptions,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, options, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use engine::{MaskRecord, MemberRecord, PharmacyRecord};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn test_router(options: ServerOptions) -> Router {
        test_app(options).await.0
    }

    async fn test_app(options: ServerOptions) -> (Router, DatabaseConnection) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();

        let pharmacies = vec![
            PharmacyRecord {
                name: "DFW Wellness".to_string(),
                opening_hours: "Mon, Wed, Fri 08:00 - 12:00".to_string(),
                cash_balance: 328.41,
                masks: vec![
                    MaskRecord {
                        name: "True Barrier (green) (3 per pack)".to_string(),
                        price: 13.70,
                    },
                    MaskRecord {
                        name: "MaskT (green) (10 per pack)".to_string(),
                        price: 41.86,
                    },
                ],
            },
            PharmacyRecord {
                name: "Carepoint".to_string(),
                opening_hours: "Sat 20:00 - 02:00".to_string(),
                cash_balance: 593.35,
                masks: vec![],
            },
        ];
        let members = vec![MemberRecord {
            name: "Yvonne Guerrero".to_string(),
            cash_balance: 20.0,
            purchase_histories: vec![],
        }];
        engine.import(&pharmacies, &members).await.unwrap();

        let app = router(ServerState {
            engine: Arc::new(engine),
            options,
        });
        (app, db)
    }

    /// An app whose purchases fail inside the transaction, after the balance
    /// updates.
    async fn app_rejecting_history(options: ServerOptions) -> Router {
        let (app, db) = test_app(options).await;
        db.execute_unprepared(
            "CREATE TRIGGER reject_history BEFORE INSERT ON purchase_histories \
             BEGIN SELECT RAISE(ABORT, 'history rejected'); END;",
        )
        .await
        .unwrap();
        app
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read(res).await
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let res = app
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read(res).await
    }

    async fn read(res: axum::response::Response) -> (StatusCode, Value) {
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn open_pharmacies_by_day_and_time() {
        let app = test_router(ServerOptions::default()).await;

        let (status, json) = get(&app, "/pharmacies/open?day=Mon&time=09:00").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["day"], "Mon");
        assert_eq!(json["time"], "09:00");
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["name"], "DFW Wellness");
        assert_eq!(json["data"][0]["opening_hours"]["Mon"][0]["open"], "08:00");

        let (_, json) = get(&app, "/pharmacies/open?day=Sat&time=23:30").await;
        assert_eq!(json["data"][0]["name"], "Carepoint");
    }

    #[tokio::test]
    async fn open_pharmacies_rejects_unknown_day() {
        let app = test_router(ServerOptions::default()).await;
        let (status, json) = get(&app, "/pharmacies/open?day=Funday").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["fields"]["day"].is_array());
    }

    #[tokio::test]
    async fn masks_of_pharmacy_sorted_by_name() {
        let app = test_router(ServerOptions::default()).await;

        let (status, json) = get(&app, "/pharmacies/1/masks?sort_by=name&order=asc").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|mask| mask["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["MaskT (green) (10 per pack)", "True Barrier (green) (3 per pack)"]
        );

        let (status, _) = get(&app, "/pharmacies/1/masks?sort_by=color").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mask_count_reports_band_and_operator() {
        let app = test_router(ServerOptions::default()).await;
        let (status, json) = get(
            &app,
            "/pharmacies/masks/count?min_price=10&max_price=50&mask_count=2&operator=%3E%3D",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["meta"]["operator"], ">=");
        assert_eq!(json["meta"]["total_pharmacies"], 1);
        assert_eq!(json["data"][0]["masks_count"], 2);
    }

    #[tokio::test]
    async fn search_finds_masks_and_pharmacies() {
        let app = test_router(ServerOptions::default()).await;

        let (status, json) = get(&app, "/search?query=MaskT&type=mask").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["meta"]["type"], "mask");
        assert_eq!(json["data"][0]["type"], "mask");
        assert_eq!(json["data"][0]["pharmacy_name"], "DFW Wellness");

        let (status, json) = get(&app, "/search?query=a").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["fields"]["query"].is_array());
    }

    #[tokio::test]
    async fn purchase_then_report() {
        let app = test_router(ServerOptions::default()).await;

        let (status, json) = post_json(
            &app,
            "/purchase",
            json!({ "user_id": 1, "pharmacy_id": 1, "mask_id": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Purchase successful");
        assert_eq!(json["total_amount_minor"], 1370);
        assert_eq!(json["user_new_balance_minor"], 630);
        assert_eq!(json["pharmacy_new_balance_minor"], 34211);

        let (status, json) = get(&app, "/masks/summary?mask_id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"]["total_amount_minor"], 1370);
        assert_eq!(json["details"][0]["pharmacy_name"], "DFW Wellness");

        let (status, json) = get(&app, "/top-members?with_transactions=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["total_spent_minor"], 1370);
        assert_eq!(
            json["data"][0]["purchase_histories"].as_array().unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn purchase_failures() {
        let app = test_router(ServerOptions::default()).await;

        let (status, json) = post_json(&app, "/purchase", json!({ "user_id": "abc" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        for field in ["user_id", "pharmacy_id", "mask_id"] {
            assert!(json["fields"][field].is_array(), "{field}");
        }

        let (status, json) = post_json(
            &app,
            "/purchase",
            json!({ "user_id": 1, "pharmacy_id": 99, "mask_id": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["fields"]["pharmacy_id"].is_array());

        let (status, json) = post_json(
            &app,
            "/purchase",
            json!({ "user_id": 1, "pharmacy_id": 1, "mask_id": 2 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["required_minor"], 4186);
        assert_eq!(json["current_balance_minor"], 2000);
    }

    #[tokio::test]
    async fn purchase_fault_is_opaque_and_rolled_back() {
        let app = app_rejecting_history(ServerOptions::default()).await;
        let purchase = json!({ "user_id": 1, "pharmacy_id": 1, "mask_id": 1 });

        let (status, json) = post_json(&app, "/purchase", purchase).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Purchase processing failed");
        assert!(json.get("details").is_none());

        let (_, json) = get(&app, "/top-members").await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn purchase_fault_details_only_in_debug() {
        let options = ServerOptions {
            debug: true,
            ..ServerOptions::default()
        };
        let app = app_rejecting_history(options).await;

        let (status, json) = post_json(
            &app,
            "/purchase",
            json!({ "user_id": 1, "pharmacy_id": 1, "mask_id": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Purchase processing failed");
        assert!(
            json["details"]
                .as_str()
                .unwrap()
                .contains("history rejected")
        );
    }

    #[tokio::test]
    async fn summary_rejects_unknown_references() {
        let app = test_router(ServerOptions::default()).await;
        let (status, json) = get(&app, "/masks/summary?mask_id=42&pharmacy_id=7").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["fields"]["mask_id"].is_array());
        assert!(json["fields"]["pharmacy_id"].is_array());
    }
}
