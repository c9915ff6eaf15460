use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment providers with a configured webhook secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingProvider {
    Stripe,
    MercadoPago,
}

impl BillingProvider {
    pub const ALL: [BillingProvider; 2] = [BillingProvider::Stripe, BillingProvider::MercadoPago];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingProvider::Stripe => "stripe",
            BillingProvider::MercadoPago => "mercadopago",
        }
    }

    pub fn parse(s: &str) -> Option<BillingProvider> {
        match s {
            "stripe" => Some(BillingProvider::Stripe),
            "mercadopago" => Some(BillingProvider::MercadoPago),
            _ => None,
        }
    }
}

/// Supported settlement currencies; amounts are always minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Brl,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Brl => "BRL",
        }
    }

    pub fn parse(s: &str) -> Option<Currency> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            "BRL" => Some(Currency::Brl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Pending,
    Failed,
    Refunded,
}

/// Processing status of a stored billing event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventStatus {
    Processing,
    Processed,
    Failed,
}

impl PaymentEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEventStatus::Processing => "processing",
            PaymentEventStatus::Processed => "processed",
            PaymentEventStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentEventStatus> {
        match s {
            "processing" => Some(PaymentEventStatus::Processing),
            "processed" => Some(PaymentEventStatus::Processed),
            "failed" => Some(PaymentEventStatus::Failed),
            _ => None,
        }
    }
}

/// Provider-agnostic view of a payment webhook event. Every provider
/// payload is normalized into this shape before the processor sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPaymentEvent {
    pub provider: BillingProvider,
    pub provider_event_id: String,
    pub event_type: String,
    pub payment_ref: String,
    pub payment_status: PaymentStatus,
    pub user_id: Uuid,
    pub quantity: i32,
    pub currency: Currency,
    pub amount_minor: i64,
}
