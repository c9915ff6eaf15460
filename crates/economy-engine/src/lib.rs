pub mod hunt;
pub mod ledger;
pub mod marketplace;
pub mod profiles;
pub mod rewards;
pub mod sweeper;
pub mod trade;
pub mod upgrade;

pub use hunt::HuntEngine;
pub use ledger::Ledger;
pub use marketplace::Marketplace;
pub use sweeper::TradeSweeper;
pub use trade::TradeEngine;
pub use upgrade::UpgradeEngine;
