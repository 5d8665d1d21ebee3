//! Plain-text console report.

use std::io::Write;

use crate::domain::error::MacrossError;
use crate::ports::report_port::{BacktestReport, ReportPort};

#[derive(Debug, Clone, Default)]
pub struct TextReport {
    pub show_trades: bool,
}

impl TextReport {
    pub fn new(show_trades: bool) -> Self {
        Self { show_trades }
    }
}

fn signed_pct(value: f64) -> String {
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{sign}{value:.2}%")
}

/// Drawdown as a loss; a drawdown that rounds to zero carries no sign.
fn drawdown_pct(value: f64) -> String {
    let magnitude = format!("{:.2}", value.abs());
    if magnitude == "0.00" {
        "0.00%".to_string()
    } else {
        format!("-{magnitude}%")
    }
}

impl ReportPort for TextReport {
    fn write(&self, report: &BacktestReport, out: &mut dyn Write) -> Result<(), MacrossError> {
        let config = &report.config;
        let result = &report.result;

        writeln!(out, "=== {} MA Crossover Backtest ===", report.symbol)?;
        writeln!(
            out,
            "Period:           {} to {} ({} points)",
            report.start_date, report.end_date, report.points
        )?;
        writeln!(
            out,
            "Windows:          SMA({}) / SMA({}), {} cross",
            config.short_window, config.long_window, config.policy
        )?;
        writeln!(out, "Initial:          ${:.2}", config.initial_investment)?;
        writeln!(out, "Final Value:      ${:.2}", result.final_portfolio_value)?;
        writeln!(out, "Total Return:     {}", signed_pct(result.total_return_pct))?;
        writeln!(out, "Max Drawdown:     {}", drawdown_pct(result.max_drawdown_pct))?;
        writeln!(out, "Trades Executed:  {}", result.trade_count)?;

        if self.show_trades && !report.trades.is_empty() {
            writeln!(out, "\n=== Trades ===")?;
            for trade in &report.trades {
                writeln!(
                    out,
                    "  {}  {:<4}  {:>10.4} units @ {:>10.2}  = ${:.2}",
                    trade.date, trade.side, trade.units, trade.price, trade.value
                )?;
            }
        }

        Ok(())
    }
}
