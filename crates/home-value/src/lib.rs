//! Home value estimation from user-supplied attributes and third-party real-estate data.

pub mod config;
pub mod error;
pub mod providers;
pub mod telemetry;
pub mod valuation;
