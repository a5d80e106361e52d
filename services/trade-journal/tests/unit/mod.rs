//! Unit tests module organization

pub mod price_feed_tests;
pub mod query_tests;
pub mod stats_tests;
pub mod validation_tests;
