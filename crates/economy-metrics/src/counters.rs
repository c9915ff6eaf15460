use metrics::{counter, describe_counter};

/// Initialize counter descriptions
pub fn init() {
    describe_counter!("economy_tokens_minted_total", "Total tokens added to balances");
    describe_counter!("economy_tokens_burned_total", "Total tokens removed from balances");
    describe_counter!("economy_hunts_started_total", "Total hunt sessions started");
    describe_counter!("economy_hunts_collected_total", "Total hunt sessions collected");
    describe_counter!("economy_items_granted_total", "Total items granted by hunts");
    describe_counter!("economy_items_sold_total", "Total items sold back to the bank");
    describe_counter!("economy_upgrades_total", "Total upgrade levels purchased");
    describe_counter!("economy_tickets_minted_total", "Total marketplace tickets minted");
    describe_counter!("economy_tickets_redeemed_total", "Total marketplace tickets redeemed");
    describe_counter!("economy_trades_settled_total", "Total trades settled");
    describe_counter!("economy_trades_expired_total", "Total trades expired by the sweeper");
    describe_counter!("economy_webhook_events_total", "Total billing webhook events received");
    describe_counter!(
        "economy_cas_conflicts_total",
        "Optimistic-write predicate misses surfaced to callers"
    );
    describe_counter!(
        "economy_daily_metrics_failures_total",
        "Fire-and-forget daily metrics upserts that failed"
    );
}

pub fn tokens_minted(amount: u64) {
    counter!("economy_tokens_minted_total").increment(amount);
}

pub fn tokens_burned(amount: u64) {
    counter!("economy_tokens_burned_total").increment(amount);
}

pub fn hunts_started(mode: &'static str) {
    counter!("economy_hunts_started_total", "mode" => mode).increment(1);
}

pub fn hunts_collected(count: u64) {
    counter!("economy_hunts_collected_total").increment(count);
}

pub fn items_granted(count: u64) {
    counter!("economy_items_granted_total").increment(count);
}

pub fn items_sold(count: u64) {
    counter!("economy_items_sold_total").increment(count);
}

pub fn upgrades(track: &'static str, levels: u64) {
    counter!("economy_upgrades_total", "track" => track).increment(levels);
}

pub fn tickets_minted(count: u64) {
    counter!("economy_tickets_minted_total").increment(count);
}

pub fn tickets_redeemed(count: u64) {
    counter!("economy_tickets_redeemed_total").increment(count);
}

pub fn trades_settled(count: u64) {
    counter!("economy_trades_settled_total").increment(count);
}

pub fn trades_expired(count: u64) {
    counter!("economy_trades_expired_total").increment(count);
}

pub fn webhook_events(provider: &str, outcome: &'static str) {
    counter!(
        "economy_webhook_events_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn cas_conflicts(entity: &'static str) {
    counter!("economy_cas_conflicts_total", "entity" => entity).increment(1);
}

pub fn daily_metrics_failures(count: u64) {
    counter!("economy_daily_metrics_failures_total").increment(count);
}
