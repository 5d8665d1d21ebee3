//! Performance summary of a simulation run.

use serde::Serialize;

use super::portfolio::Simulation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BacktestResult {
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    pub final_portfolio_value: f64,
}

impl BacktestResult {
    /// Reduces a finished simulation to full-precision summary figures.
    pub fn compute(simulation: &Simulation, initial_investment: f64) -> Self {
        let final_value = simulation.final_value;
        BacktestResult {
            total_return_pct: (final_value - initial_investment) / initial_investment * 100.0,
            max_drawdown_pct: simulation.state.max_drawdown_fraction * 100.0,
            trade_count: simulation.state.trade_count,
            final_portfolio_value: final_value,
        }
    }
}
