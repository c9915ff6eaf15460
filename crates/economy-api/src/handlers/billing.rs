use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use economy_billing::WebhookOutcome;
use economy_core::types::BillingProvider;
use economy_core::EconomyError;

use super::HandlerResult;
use crate::server::AppContext;

/// Raw-body webhook endpoint. The signature header is verified against the
/// exact bytes received, before any parsing.
pub async fn webhook(
    State(ctx): State<Arc<AppContext>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult<WebhookOutcome> {
    let provider = BillingProvider::parse(&provider).ok_or_else(|| {
        EconomyError::Validation(format!("unknown billing provider {provider:?}"))
    })?;

    let signature = headers
        .get("X-Webhook-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            EconomyError::Validation("X-Webhook-Signature header is required".to_string())
        })?;

    let outcome = ctx.billing.process(provider, signature, &body).await?;
    Ok(Json(outcome))
}
