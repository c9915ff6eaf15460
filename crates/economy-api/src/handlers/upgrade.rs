use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use economy_core::types::UpgradeTrack;
use economy_core::EconomyError;
use economy_engine::upgrade::UpgradeOutcome;
use serde::Deserialize;
use uuid::Uuid;

use super::HandlerResult;
use crate::server::AppContext;

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub track: String,
    #[serde(default = "default_levels")]
    pub levels: i32,
}

fn default_levels() -> i32 {
    1
}

pub async fn upgrade(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<UpgradeRequest>,
) -> HandlerResult<UpgradeOutcome> {
    let track = match req.track.as_str() {
        "bot" => UpgradeTrack::BotSpeed,
        "runtime" => UpgradeTrack::Runtime,
        "satellite" => UpgradeTrack::Satellite,
        "cost" => UpgradeTrack::CostPerHour,
        other => {
            return Err(
                EconomyError::Validation(format!("unknown upgrade type {other:?}")).into(),
            )
        }
    };

    let outcome = ctx.upgrade.upgrade(req.user_id, track, req.levels).await?;
    Ok(Json(outcome))
}
