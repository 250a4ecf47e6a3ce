//! Full-text search endpoint

use api_types::search::{SearchHit as HitView, SearchMeta, SearchQuery, SearchResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use engine::SearchHit;

use crate::{ServerError, server::ServerState, validation};

pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ServerError> {
    let search = validation::search_query(&query).map_err(ServerError::Validation)?;

    let hits = state.engine.search(&search).await?;
    let data: Vec<HitView> = hits
        .into_iter()
        .map(|hit| match hit {
            SearchHit::Pharmacy {
                id,
                name,
                cash_balance,
                relevance,
            } => HitView::Pharmacy {
                id,
                name,
                cash_balance_minor: cash_balance.minor(),
                relevance,
            },
            SearchHit::Mask {
                id,
                name,
                price,
                pharmacy_id,
                pharmacy_name,
                relevance,
            } => HitView::Mask {
                id,
                name,
                price_minor: price.minor(),
                pharmacy_id,
                pharmacy_name,
                relevance,
            },
        })
        .collect();

    Ok(Json(SearchResponse {
        meta: SearchMeta {
            query: search.text,
            kind: search.scope.as_str().to_string(),
            total_results: data.len(),
        },
        data,
    }))
}
