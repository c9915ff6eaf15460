//! Periodic stale-trade sweeper. Runs until the shutdown signal fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::trade::TradeEngine;

pub struct TradeSweeper {
    engine: Arc<TradeEngine>,
    interval: Duration,
}

impl TradeSweeper {
    pub fn new(engine: Arc<TradeEngine>, interval_secs: u64) -> Self {
        Self {
            engine,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "Trade sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so startup isn't a sweep.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.engine.expire_stale().await {
                        Ok(0) => {}
                        Ok(expired) => info!(expired, "Sweep expired stale trades"),
                        Err(e) => error!(error = %e, "Trade sweep failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Trade sweeper shutting down");
                    break;
                }
            }
        }
    }
}
