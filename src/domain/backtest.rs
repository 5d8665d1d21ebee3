//! Backtest entry point: validate, compute signals, simulate, summarize.

use serde::Serialize;

use super::error::MacrossError;
use super::metrics::BacktestResult;
use super::portfolio::{simulate, CrossoverPolicy, Simulation};
use super::price::{validate_series, PricePoint};
use super::signal::compute_signals;

pub const DEFAULT_INITIAL_INVESTMENT: f64 = 10_000.0;
pub const DEFAULT_SHORT_WINDOW: usize = 20;
pub const DEFAULT_LONG_WINDOW: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub initial_investment: f64,
    pub short_window: usize,
    pub long_window: usize,
    pub policy: CrossoverPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            policy: CrossoverPolicy::default(),
        }
    }
}

impl BacktestConfig {
    pub fn new(initial_investment: f64, short_window: usize, long_window: usize) -> Self {
        BacktestConfig {
            initial_investment,
            short_window,
            long_window,
            policy: CrossoverPolicy::default(),
        }
    }

    pub fn with_policy(self, policy: CrossoverPolicy) -> Self {
        BacktestConfig { policy, ..self }
    }

    pub fn validate(&self) -> Result<(), MacrossError> {
        if !self.initial_investment.is_finite() || self.initial_investment <= 0.0 {
            return Err(MacrossError::invalid_parameter(
                "initial_investment",
                format!("must be positive, got {}", self.initial_investment),
            ));
        }
        if self.short_window == 0 {
            return Err(MacrossError::invalid_parameter(
                "short_window",
                "must be at least 1",
            ));
        }
        if self.long_window == 0 {
            return Err(MacrossError::invalid_parameter(
                "long_window",
                "must be at least 1",
            ));
        }
        if self.short_window >= self.long_window {
            return Err(MacrossError::invalid_parameter(
                "short_window",
                format!(
                    "must be less than long_window ({} >= {})",
                    self.short_window, self.long_window
                ),
            ));
        }
        Ok(())
    }
}

/// Runs the crossover strategy and returns the summary figures.
pub fn run_backtest(
    prices: &[PricePoint],
    config: &BacktestConfig,
) -> Result<BacktestResult, MacrossError> {
    simulate_backtest(prices, config).map(|(_, result)| result)
}

/// Like [`run_backtest`], but also hands back the full simulation trace.
pub fn simulate_backtest(
    prices: &[PricePoint],
    config: &BacktestConfig,
) -> Result<(Simulation, BacktestResult), MacrossError> {
    config.validate()?;
    if prices.is_empty() {
        return Err(MacrossError::NoData {
            symbol: String::new(),
        });
    }
    validate_series(prices)?;

    let signals = compute_signals(prices, config.short_window, config.long_window)?;
    tracing::debug!(
        points = prices.len(),
        first_signal = ?signals.first_defined_index(),
        "signals computed"
    );

    let simulation = simulate(prices, &signals, config.initial_investment, config.policy)?;
    let result = BacktestResult::compute(&simulation, config.initial_investment);
    tracing::debug!(
        trades = result.trade_count,
        final_value = result.final_portfolio_value,
        "simulation complete"
    );

    Ok((simulation, result))
}
