use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use economy_core::types::Trade;
use economy_core::EconomyError;
use economy_engine::trade::SettlementOutcome;
use serde::Deserialize;
use uuid::Uuid;

use super::HandlerResult;
use crate::server::AppContext;

#[derive(Debug, Deserialize)]
pub struct TradeCreateRequest {
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub ticket_ids: Vec<Uuid>,
    pub price_tokens: i64,
}

pub async fn trade_create(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<TradeCreateRequest>,
) -> HandlerResult<Trade> {
    let trade = ctx
        .trades
        .create_trade(req.seller_id, req.buyer_id, req.ticket_ids, req.price_tokens)
        .await?;
    Ok(Json(trade))
}

#[derive(Debug, Deserialize)]
pub struct TradeConfirmRequest {
    pub user_id: Uuid,
}

pub async fn trade_confirm_seller(
    State(ctx): State<Arc<AppContext>>,
    Path(trade_id): Path<Uuid>,
    Json(req): Json<TradeConfirmRequest>,
) -> HandlerResult<Trade> {
    let trade = ctx.trades.confirm_seller(trade_id, req.user_id).await?;
    Ok(Json(trade))
}

pub async fn trade_confirm_buyer(
    State(ctx): State<Arc<AppContext>>,
    Path(trade_id): Path<Uuid>,
    Json(req): Json<TradeConfirmRequest>,
) -> HandlerResult<Trade> {
    let trade = ctx.trades.confirm_buyer(trade_id, req.user_id).await?;
    Ok(Json(trade))
}

/// Settlement requires a caller-supplied `Idempotency-Key` header; its
/// absence is rejected before the engine is touched.
pub async fn trade_settle(
    State(ctx): State<Arc<AppContext>>,
    Path(trade_id): Path<Uuid>,
    headers: HeaderMap,
) -> HandlerResult<SettlementOutcome> {
    let key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            EconomyError::Validation("Idempotency-Key header is required".to_string())
        })?;

    let outcome = ctx.trades.settle(trade_id, key).await?;
    Ok(Json(outcome))
}

pub async fn trade_cancel(
    State(ctx): State<Arc<AppContext>>,
    Path(trade_id): Path<Uuid>,
    Json(req): Json<TradeConfirmRequest>,
) -> HandlerResult<Trade> {
    let trade = ctx.trades.cancel(trade_id, req.user_id).await?;
    Ok(Json(trade))
}
