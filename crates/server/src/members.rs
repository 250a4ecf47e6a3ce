//! Member ranking endpoint

use api_types::member::{
    RankedMember, TopMembersMeta, TopMembersQuery, TopMembersResponse, Transaction,
};
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState, validation};

/// Members ranked by total spend in the optional date range.
pub async fn top_members(
    State(state): State<ServerState>,
    Query(query): Query<TopMembersQuery>,
) -> Result<Json<TopMembersResponse>, ServerError> {
    let filter = validation::top_members_filter(&query).map_err(ServerError::Validation)?;

    let ranking = state.engine.top_members(filter).await?;
    let data: Vec<RankedMember> = ranking
        .into_iter()
        .map(|entry| RankedMember {
            id: entry.member.id,
            name: entry.member.name,
            cash_balance_minor: entry.member.cash_balance.minor(),
            total_spent_minor: entry.total_spent.minor(),
            purchase_histories: entry.transactions.map(|transactions| {
                transactions
                    .into_iter()
                    .map(|history| Transaction {
                        id: history.id,
                        pharmacy_id: history.pharmacy_id,
                        mask_id: history.mask_id,
                        amount_minor: history.amount.minor(),
                        unit_price_minor: history.unit_price.map(|price| price.minor()),
                        transaction_date: history.transaction_date,
                    })
                    .collect()
            }),
        })
        .collect();

    Ok(Json(TopMembersResponse {
        meta: TopMembersMeta {
            start_date: query.start_date,
            end_date: query.end_date,
            limit: filter.limit,
            total_members: data.len(),
        },
        data,
    }))
}
