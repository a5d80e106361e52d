//! API handlers grouped by resource

pub mod health;
pub mod market;
pub mod trades;

pub use health::HealthHandlers;
pub use market::MarketHandlers;
pub use trades::TradeHandlers;
