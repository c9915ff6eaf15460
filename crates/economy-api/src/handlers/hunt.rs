use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use economy_core::EconomyError;
use economy_engine::hunt::{CollectOutcome, HuntStarted, HuntStatus};
use serde::Deserialize;
use uuid::Uuid;

use super::HandlerResult;
use crate::server::AppContext;

#[derive(Debug, Deserialize)]
pub struct HuntStartRequest {
    pub user_id: Uuid,
    pub mode: String,
    pub runtime_minutes: Option<i64>,
}

pub async fn hunt_start(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<HuntStartRequest>,
) -> HandlerResult<HuntStarted> {
    let started = match req.mode.as_str() {
        "free" => ctx.hunt.start_free(req.user_id).await?,
        "paid" => {
            let minutes = req.runtime_minutes.ok_or_else(|| {
                EconomyError::Validation("runtime_minutes is required for paid hunts".to_string())
            })?;
            ctx.hunt.start_paid(req.user_id, minutes).await?
        }
        other => {
            return Err(
                EconomyError::Validation(format!("unknown hunt mode {other:?}")).into(),
            )
        }
    };
    Ok(Json(started))
}

#[derive(Debug, Deserialize)]
pub struct HuntCollectRequest {
    pub user_id: Uuid,
}

pub async fn hunt_collect(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<HuntCollectRequest>,
) -> HandlerResult<CollectOutcome> {
    let outcome = ctx.hunt.collect(req.user_id).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct HuntStatusQuery {
    pub user_id: Uuid,
}

pub async fn hunt_status(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<HuntStatusQuery>,
) -> HandlerResult<HuntStatus> {
    let status = ctx.hunt.status(query.user_id).await?;
    Ok(Json(status))
}
