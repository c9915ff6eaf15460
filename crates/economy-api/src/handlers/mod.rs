mod billing;
mod hunt;
mod sell;
mod ticket;
mod trade;
mod upgrade;

pub use billing::webhook;
pub use hunt::{hunt_collect, hunt_start, hunt_status};
pub use sell::{balance, sell};
pub use ticket::{ticket_list, ticket_redeem, ticket_transfer};
pub use trade::{
    trade_cancel, trade_confirm_buyer, trade_confirm_seller, trade_create, trade_settle,
};
pub use upgrade::upgrade;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use economy_core::EconomyError;
use serde_json::json;

/// EconomyError carried out of a handler, rendered as a JSON error body
/// with a machine-checkable kind and the HTTP status for its taxonomy.
pub struct ApiFailure(pub EconomyError);

impl From<EconomyError> for ApiFailure {
    fn from(err: EconomyError) -> Self {
        ApiFailure(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let err = self.0;

        // Duplicate-effect conditions are success, not failure.
        if matches!(err, EconomyError::AlreadyProcessed(_)) {
            let body = json!({
                "success": true,
                "idempotent": true,
                "message": err.to_string(),
            });
            return (StatusCode::OK, Json(body)).into_response();
        }

        let status = match &err {
            EconomyError::Validation(_)
            | EconomyError::InvalidQuantity(_)
            | EconomyError::MissingEnvVar(_)
            | EconomyError::InvalidSignature => StatusCode::BAD_REQUEST,
            EconomyError::UserNotFound(_)
            | EconomyError::ItemNotFound(_)
            | EconomyError::TicketNotFound(_)
            | EconomyError::TradeNotFound(_) => StatusCode::NOT_FOUND,
            EconomyError::InsufficientFunds { .. }
            | EconomyError::InvalidStateTransition(_)
            | EconomyError::ConcurrentModification(_)
            | EconomyError::AlreadyRunning
            | EconomyError::CooldownActive { .. }
            | EconomyError::SessionNotComplete
            | EconomyError::NoCatalogItems
            | EconomyError::NoMatchingItems
            | EconomyError::MaxLevelReached(_) => StatusCode::CONFLICT,
            EconomyError::ExternalDependency(_) => StatusCode::BAD_GATEWAY,
            EconomyError::AlreadyProcessed(_)
            | EconomyError::Corrupt { .. }
            | EconomyError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
                "retryable": err.is_retryable(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub type HandlerResult<T> = std::result::Result<Json<T>, ApiFailure>;
