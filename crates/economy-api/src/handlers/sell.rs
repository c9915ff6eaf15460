use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use economy_core::types::Rarity;
use economy_core::EconomyError;
use economy_engine::ledger::{BalanceView, SellOutcome, SellSelection};
use serde::Deserialize;
use uuid::Uuid;

use super::HandlerResult;
use crate::server::AppContext;

#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub user_id: Uuid,
    pub mode: String,
    pub item_id: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
}

pub async fn sell(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<SellRequest>,
) -> HandlerResult<SellOutcome> {
    let selection = match req.mode.as_str() {
        "quantity" => {
            let item_id = req.item_id.ok_or_else(|| {
                EconomyError::Validation("item_id is required for quantity sells".to_string())
            })?;
            let quantity = req.quantity.ok_or_else(|| {
                EconomyError::Validation("quantity is required for quantity sells".to_string())
            })?;
            SellSelection::Quantity { item_id, quantity }
        }
        "category" => {
            let category = req.category.ok_or_else(|| {
                EconomyError::Validation("category is required for category sells".to_string())
            })?;
            let rarity = Rarity::parse(&category).ok_or_else(|| {
                EconomyError::Validation(format!("unknown category {category:?}"))
            })?;
            SellSelection::Category { rarity }
        }
        "all" => SellSelection::All,
        other => {
            return Err(
                EconomyError::Validation(format!("unknown sell mode {other:?}")).into(),
            )
        }
    };

    let outcome = ctx.ledger.sell(req.user_id, selection).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub user_id: Uuid,
}

pub async fn balance(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<BalanceQuery>,
) -> HandlerResult<BalanceView> {
    let view = ctx.ledger.balance(query.user_id).await?;
    Ok(Json(view))
}
