use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use economy_core::types::MarketplaceTicket;
use economy_engine::marketplace::{PurchaseOutcome, RedeemOutcome};
use serde::Deserialize;
use uuid::Uuid;

use super::HandlerResult;
use crate::server::AppContext;

#[derive(Debug, Deserialize)]
pub struct TicketListRequest {
    pub user_id: Uuid,
    pub price_tokens: i64,
}

pub async fn ticket_list(
    State(ctx): State<Arc<AppContext>>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<TicketListRequest>,
) -> HandlerResult<MarketplaceTicket> {
    let ticket = ctx
        .marketplace
        .list_for_trade(ticket_id, req.user_id, req.price_tokens)
        .await?;
    Ok(Json(ticket))
}

#[derive(Debug, Deserialize)]
pub struct TicketRedeemRequest {
    pub user_id: Uuid,
}

pub async fn ticket_redeem(
    State(ctx): State<Arc<AppContext>>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<TicketRedeemRequest>,
) -> HandlerResult<RedeemOutcome> {
    let outcome = ctx.marketplace.redeem(ticket_id, req.user_id).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct TicketTransferRequest {
    pub buyer_id: Uuid,
    pub price_tokens: Option<i64>,
}

pub async fn ticket_transfer(
    State(ctx): State<Arc<AppContext>>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<TicketTransferRequest>,
) -> HandlerResult<PurchaseOutcome> {
    let outcome = ctx
        .marketplace
        .buy_listed(ticket_id, req.buyer_id, req.price_tokens)
        .await?;
    Ok(Json(outcome))
}
