//! Port traits at the edges of the backtest core.

pub mod config_port;
pub mod data_port;
pub mod report_port;
