//! Billing Webhook Processor: verify, normalize, deduplicate, mint.

use std::sync::Arc;

use chrono::Utc;
use economy_core::types::{BillingProvider, NormalizedPaymentEvent, PaymentStatus};
use economy_core::{EconomyConfig, EconomyError, Result};
use economy_db::repositories::PaymentEventRepository;
use economy_db::DatabasePool;
use economy_engine::Marketplace;
use serde::Serialize;
use tracing::{error, info};

use crate::{normalize, signature};

#[derive(Debug, Clone, Serialize)]
pub struct WebhookOutcome {
    pub success: bool,
    /// True when the event id had been processed before and no work ran.
    pub idempotent: bool,
    pub minted_quantity: i32,
}

pub struct WebhookProcessor {
    pool: Arc<DatabasePool>,
    marketplace: Arc<Marketplace>,
    config: Arc<EconomyConfig>,
}

impl WebhookProcessor {
    pub fn new(
        pool: Arc<DatabasePool>,
        marketplace: Arc<Marketplace>,
        config: Arc<EconomyConfig>,
    ) -> Self {
        Self {
            pool,
            marketplace,
            config,
        }
    }

    /// Handle one raw webhook delivery. The signature is verified before the
    /// body is parsed; each provider event id drives minting at most once.
    pub async fn process(
        &self,
        provider: BillingProvider,
        signature_header: &str,
        raw_body: &[u8],
    ) -> Result<WebhookOutcome> {
        let secret = self
            .config
            .webhook_secret(provider)
            .ok_or_else(|| {
                EconomyError::Validation(format!(
                    "no webhook secret configured for {}",
                    provider.as_str()
                ))
            })?;

        signature::verify(
            secret,
            signature_header,
            raw_body,
            Utc::now().timestamp(),
            self.config.webhook_timestamp_tolerance_secs,
        )?;

        let event = normalize::normalize(provider, raw_body)?;
        economy_metrics::counters::webhook_events(provider.as_str(), "received");

        // Claim the event row; a conflict means a replay.
        let payload = serde_json::to_value(&event)
            .map_err(|e| EconomyError::Database(e.to_string()))?;
        let claimed = PaymentEventRepository::insert_processing(
            self.pool.inner(),
            provider.as_str(),
            &event.provider_event_id,
            &payload,
            Utc::now(),
        )
        .await?;
        if !claimed {
            economy_metrics::counters::webhook_events(provider.as_str(), "duplicate");
            info!(
                provider = provider.as_str(),
                event = %event.provider_event_id,
                "Webhook replayed; already processed"
            );
            return Ok(WebhookOutcome {
                success: true,
                idempotent: true,
                minted_quantity: 0,
            });
        }

        if event.payment_status != PaymentStatus::Succeeded {
            PaymentEventRepository::mark_processed(
                self.pool.inner(),
                provider.as_str(),
                &event.provider_event_id,
                0,
            )
            .await?;
            info!(
                provider = provider.as_str(),
                event = %event.provider_event_id,
                status = ?event.payment_status,
                "Non-succeeded payment event recorded, nothing minted"
            );
            return Ok(WebhookOutcome {
                success: true,
                idempotent: false,
                minted_quantity: 0,
            });
        }

        let minted = self.mint_batch(&event).await?;
        PaymentEventRepository::mark_processed(
            self.pool.inner(),
            provider.as_str(),
            &event.provider_event_id,
            minted,
        )
        .await?;
        economy_metrics::counters::webhook_events(provider.as_str(), "processed");
        info!(
            provider = provider.as_str(),
            event = %event.provider_event_id,
            minted,
            "Webhook processed"
        );

        Ok(WebhookOutcome {
            success: true,
            idempotent: false,
            minted_quantity: minted,
        })
    }

    /// Mint exactly `quantity` tickets for the payment, one unit at a time.
    /// Unit k > 1 gets a `#k` payment-ref suffix so each unit stays uniquely
    /// guarded. A mid-loop failure marks the event failed with the count
    /// minted so far and surfaces the error; the already-minted units stand
    /// and are reconciled manually rather than retried blindly.
    async fn mint_batch(&self, event: &NormalizedPaymentEvent) -> Result<i32> {
        let mut minted = 0;
        for unit in 1..=event.quantity {
            let unit_ref = if event.quantity == 1 {
                event.payment_ref.clone()
            } else {
                format!("{}#{unit}", event.payment_ref)
            };
            match self
                .marketplace
                .mint_for_payment(event.user_id, &unit_ref)
                .await
            {
                Ok(_) => minted += 1,
                Err(err) => {
                    error!(
                        event = %event.provider_event_id,
                        unit,
                        error = %err,
                        "Mint failed mid-batch"
                    );
                    PaymentEventRepository::mark_failed(
                        self.pool.inner(),
                        event.provider.as_str(),
                        &event.provider_event_id,
                        minted,
                        &err.to_string(),
                    )
                    .await?;
                    economy_metrics::counters::webhook_events(event.provider.as_str(), "failed");
                    return Err(err);
                }
            }
        }
        Ok(minted)
    }
}
