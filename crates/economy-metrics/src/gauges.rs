use metrics::{describe_gauge, gauge};

/// Initialize gauge descriptions
pub fn init() {
    describe_gauge!("economy_open_trades", "Trades currently holding ticket locks");
    describe_gauge!("economy_catalog_items", "Items loaded in the catalog cache");
}

pub fn open_trades(count: f64) {
    gauge!("economy_open_trades").set(count);
}

pub fn catalog_items(count: f64) {
    gauge!("economy_catalog_items").set(count);
}
