//! Provider payload normalization. Each provider's webhook JSON is mapped
//! into [`NormalizedPaymentEvent`] here; nothing downstream ever sees a
//! provider-specific shape.

use economy_core::types::{BillingProvider, Currency, NormalizedPaymentEvent, PaymentStatus};
use economy_core::{EconomyError, Result};
use serde_json::Value;
use uuid::Uuid;

pub fn normalize(provider: BillingProvider, raw_body: &[u8]) -> Result<NormalizedPaymentEvent> {
    let payload: Value = serde_json::from_slice(raw_body)
        .map_err(|e| EconomyError::Validation(format!("invalid webhook JSON: {e}")))?;
    match provider {
        BillingProvider::Stripe => normalize_stripe(&payload),
        BillingProvider::MercadoPago => normalize_mercadopago(&payload),
    }
}

/// Stripe checkout events: the paid session object carries our metadata.
fn normalize_stripe(payload: &Value) -> Result<NormalizedPaymentEvent> {
    let event_id = required_str(payload, "/id")?;
    let event_type = required_str(payload, "/type")?;
    let object = payload
        .pointer("/data/object")
        .ok_or_else(|| validation("missing data.object"))?;

    let payment_ref = required_str(object, "/id")?;
    let payment_status = match object.pointer("/payment_status").and_then(Value::as_str) {
        Some("paid") => PaymentStatus::Succeeded,
        Some("unpaid") | Some("no_payment_required") => PaymentStatus::Pending,
        _ => PaymentStatus::Failed,
    };
    let user_id = parse_user_id(object.pointer("/metadata/user_id"))?;
    let quantity = parse_quantity(object.pointer("/metadata/quantity"))?;
    let currency = parse_currency(object.pointer("/currency"))?;
    let amount_minor = object
        .pointer("/amount_total")
        .and_then(Value::as_i64)
        .ok_or_else(|| validation("missing amount_total"))?;

    Ok(NormalizedPaymentEvent {
        provider: BillingProvider::Stripe,
        provider_event_id: event_id,
        event_type,
        payment_ref,
        payment_status,
        user_id,
        quantity,
        currency,
        amount_minor,
    })
}

/// MercadoPago payment notifications.
fn normalize_mercadopago(payload: &Value) -> Result<NormalizedPaymentEvent> {
    let event_id = payload
        .pointer("/id")
        .and_then(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .or_else(|| v.as_i64().map(|n| n.to_string()))
        })
        .ok_or_else(|| validation("missing id"))?;
    let event_type = required_str(payload, "/action")?;
    let data = payload
        .pointer("/data")
        .ok_or_else(|| validation("missing data"))?;

    let payment_ref = required_str(data, "/id")?;
    let payment_status = match data.pointer("/status").and_then(Value::as_str) {
        Some("approved") => PaymentStatus::Succeeded,
        Some("pending") | Some("in_process") => PaymentStatus::Pending,
        Some("refunded") | Some("charged_back") => PaymentStatus::Refunded,
        _ => PaymentStatus::Failed,
    };
    let user_id = parse_user_id(data.pointer("/external_reference"))?;
    let quantity = parse_quantity(data.pointer("/metadata/quantity"))?;
    let currency = parse_currency(data.pointer("/currency_id"))?;
    let amount_minor = data
        .pointer("/transaction_amount_minor")
        .and_then(Value::as_i64)
        .ok_or_else(|| validation("missing transaction_amount_minor"))?;

    Ok(NormalizedPaymentEvent {
        provider: BillingProvider::MercadoPago,
        provider_event_id: event_id,
        event_type,
        payment_ref,
        payment_status,
        user_id,
        quantity,
        currency,
        amount_minor,
    })
}

fn validation(message: &str) -> EconomyError {
    EconomyError::Validation(format!("webhook payload: {message}"))
}

fn required_str(value: &Value, pointer: &str) -> Result<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| validation(&format!("missing {pointer}")))
}

fn parse_user_id(value: Option<&Value>) -> Result<Uuid> {
    value
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| validation("missing or invalid user id"))
}

/// Quantity arrives as a string or number depending on the provider;
/// defaults to 1 when absent, and must be within [1, 100].
fn parse_quantity(value: Option<&Value>) -> Result<i32> {
    let quantity = match value {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
        Some(Value::String(s)) => s.parse::<i64>().unwrap_or(-1),
        Some(_) => -1,
    };
    if !(1..=100).contains(&quantity) {
        return Err(validation("quantity out of range"));
    }
    Ok(quantity as i32)
}

fn parse_currency(value: Option<&Value>) -> Result<Currency> {
    value
        .and_then(Value::as_str)
        .and_then(Currency::parse)
        .ok_or_else(|| validation("unsupported currency"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_stripe_checkout() {
        let body = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_123",
                "payment_status": "paid",
                "currency": "usd",
                "amount_total": 999,
                "metadata": { "user_id": "4b4b4a46-9f2f-4a2e-8a96-0e6d72f5c111", "quantity": "3" }
            }}
        });
        let event =
            normalize(BillingProvider::Stripe, body.to_string().as_bytes()).expect("normalize");
        assert_eq!(event.provider_event_id, "evt_1");
        assert_eq!(event.payment_ref, "cs_123");
        assert_eq!(event.payment_status, PaymentStatus::Succeeded);
        assert_eq!(event.quantity, 3);
        assert_eq!(event.currency, Currency::Usd);
        assert_eq!(event.amount_minor, 999);
    }

    #[test]
    fn normalizes_mercadopago_payment() {
        let body = json!({
            "id": 7788,
            "action": "payment.updated",
            "data": {
                "id": "mp_pay_1",
                "status": "approved",
                "external_reference": "4b4b4a46-9f2f-4a2e-8a96-0e6d72f5c111",
                "currency_id": "BRL",
                "transaction_amount_minor": 4990,
                "metadata": { "quantity": 2 }
            }
        });
        let event = normalize(BillingProvider::MercadoPago, body.to_string().as_bytes())
            .expect("normalize");
        assert_eq!(event.provider_event_id, "7788");
        assert_eq!(event.payment_status, PaymentStatus::Succeeded);
        assert_eq!(event.quantity, 2);
        assert_eq!(event.currency, Currency::Brl);
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let body = json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_124",
                "payment_status": "paid",
                "currency": "eur",
                "amount_total": 500,
                "metadata": { "user_id": "4b4b4a46-9f2f-4a2e-8a96-0e6d72f5c111" }
            }}
        });
        let event =
            normalize(BillingProvider::Stripe, body.to_string().as_bytes()).expect("normalize");
        assert_eq!(event.quantity, 1);
    }

    #[test]
    fn rejects_unsupported_currency_and_bad_quantity() {
        let base = json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_125",
                "payment_status": "paid",
                "currency": "jpy",
                "amount_total": 500,
                "metadata": { "user_id": "4b4b4a46-9f2f-4a2e-8a96-0e6d72f5c111" }
            }}
        });
        let err = normalize(BillingProvider::Stripe, base.to_string().as_bytes())
            .expect_err("unsupported currency");
        assert!(matches!(err, EconomyError::Validation(_)));

        let mut bad_quantity = base;
        bad_quantity["data"]["object"]["currency"] = json!("usd");
        bad_quantity["data"]["object"]["metadata"]["quantity"] = json!("0");
        let err = normalize(BillingProvider::Stripe, bad_quantity.to_string().as_bytes())
            .expect_err("zero quantity");
        assert!(matches!(err, EconomyError::Validation(_)));
    }

    #[test]
    fn rejects_non_json_body() {
        let err = normalize(BillingProvider::Stripe, b"not-json").expect_err("bad body");
        assert!(matches!(err, EconomyError::Validation(_)));
    }
}
