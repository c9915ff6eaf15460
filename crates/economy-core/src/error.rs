use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EconomyError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("Trade not found: {0}")]
    TradeNotFound(Uuid),

    #[error("Insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Concurrent modification on {0}")]
    ConcurrentModification(&'static str),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Hunt session already running")]
    AlreadyRunning,

    #[error("Free hunt cooldown active: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: i64 },

    #[error("Hunt session not complete yet")]
    SessionNotComplete,

    #[error("Item catalog is empty")]
    NoCatalogItems,

    #[error("No matching items to sell")]
    NoMatchingItems,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Max level reached for {0} upgrade")]
    MaxLevelReached(&'static str),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("External dependency error: {0}")]
    ExternalDependency(String),

    #[error("Corrupt persisted state for {entity}: {reason}")]
    Corrupt { entity: &'static str, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

impl EconomyError {
    /// Stable machine-checkable error kind, carried in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            EconomyError::Validation(_) => "validation_error",
            EconomyError::UserNotFound(_) => "user_not_found",
            EconomyError::ItemNotFound(_) => "item_not_found",
            EconomyError::TicketNotFound(_) => "ticket_not_found",
            EconomyError::TradeNotFound(_) => "trade_not_found",
            EconomyError::InsufficientFunds { .. } => "insufficient_funds",
            EconomyError::InvalidStateTransition(_) => "invalid_state_transition",
            EconomyError::ConcurrentModification(_) => "concurrent_modification",
            EconomyError::AlreadyProcessed(_) => "already_processed",
            EconomyError::AlreadyRunning => "already_running",
            EconomyError::CooldownActive { .. } => "cooldown_active",
            EconomyError::SessionNotComplete => "session_not_complete",
            EconomyError::NoCatalogItems => "no_catalog_items",
            EconomyError::NoMatchingItems => "no_matching_items",
            EconomyError::InvalidQuantity(_) => "invalid_quantity",
            EconomyError::MaxLevelReached(_) => "max_level_reached",
            EconomyError::InvalidSignature => "invalid_signature",
            EconomyError::ExternalDependency(_) => "external_dependency",
            EconomyError::Corrupt { .. } => "corrupt_state",
            EconomyError::Database(_) => "database_error",
            EconomyError::MissingEnvVar(_) => "missing_env_var",
        }
    }

    /// Whether the caller may retry the exact same request immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EconomyError::ConcurrentModification(_))
    }
}

pub type Result<T> = std::result::Result<T, EconomyError>;
