//! Core domain types and logic.

pub mod price;
pub mod signal;
pub mod portfolio;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
