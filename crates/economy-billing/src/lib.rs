pub mod normalize;
pub mod processor;
pub mod signature;

pub use processor::{WebhookOutcome, WebhookProcessor};
