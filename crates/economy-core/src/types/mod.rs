pub mod item;
pub mod ticket;
pub mod trade;
pub mod user;
pub mod webhook;

pub use item::{Item, Rarity};
pub use ticket::{MarketplaceTicket, TicketSource, TicketStatus};
pub use trade::{Trade, TradeState};
pub use user::{HuntPhase, UpgradeTrack, UserEconomyState};
pub use webhook::{
    BillingProvider, Currency, NormalizedPaymentEvent, PaymentEventStatus, PaymentStatus,
};
