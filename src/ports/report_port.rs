//! Result consumer port.

use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::MacrossError;
use crate::domain::metrics::BacktestResult;
use crate::domain::portfolio::Trade;

/// Everything a consumer needs to present one finished backtest.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub config: BacktestConfig,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points: usize,
    pub result: BacktestResult,
    pub trades: Vec<Trade>,
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &BacktestReport, out: &mut dyn Write) -> Result<(), MacrossError>;
}
