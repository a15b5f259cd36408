//! Analysis modules.
//!
//! Turns reporting-API data into report rows.

pub mod aggregator;

pub use aggregator::*;
