//! Portfolio state machine and equity tracking.
//!
//! The simulated portfolio is always either fully in cash (FLAT) or fully
//! invested in the single symbol (INVESTED). Crossovers flip between the two;
//! the walk is a single pass in date order with no lookahead.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::MacrossError;
use super::price::PricePoint;
use super::signal::SignalSeries;

/// Which side of the crossover counts as bullish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverPolicy {
    /// Buy when short MA > long MA, sell when short MA < long MA.
    #[default]
    GoldenCross,
    /// Buy when short MA < long MA, sell when short MA > long MA.
    Inverted,
}

impl CrossoverPolicy {
    fn is_bullish(self, short_ma: f64, long_ma: f64) -> bool {
        match self {
            CrossoverPolicy::GoldenCross => short_ma > long_ma,
            CrossoverPolicy::Inverted => short_ma < long_ma,
        }
    }

    fn is_bearish(self, short_ma: f64, long_ma: f64) -> bool {
        match self {
            CrossoverPolicy::GoldenCross => short_ma < long_ma,
            CrossoverPolicy::Inverted => short_ma > long_ma,
        }
    }
}

impl fmt::Display for CrossoverPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossoverPolicy::GoldenCross => write!(f, "golden"),
            CrossoverPolicy::Inverted => write!(f, "inverted"),
        }
    }
}

impl FromStr for CrossoverPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "golden" | "golden_cross" | "golden-cross" => Ok(CrossoverPolicy::GoldenCross),
            "inverted" => Ok(CrossoverPolicy::Inverted),
            other => Err(format!(
                "unknown crossover policy '{other}' (expected golden or inverted)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.pad("BUY"),
            TradeSide::Sell => f.pad("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub side: TradeSide,
    pub price: f64,
    pub units: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub holdings_units: f64,
    pub trade_count: usize,
    pub peak_value: f64,
    pub max_drawdown_fraction: f64,
}

impl PortfolioState {
    pub fn new(initial_investment: f64) -> Self {
        PortfolioState {
            cash: initial_investment,
            holdings_units: 0.0,
            trade_count: 0,
            peak_value: 0.0,
            max_drawdown_fraction: 0.0,
        }
    }

    pub fn is_invested(&self) -> bool {
        self.holdings_units > 0.0
    }

    pub fn value_at(&self, price: f64) -> f64 {
        self.cash + self.holdings_units * price
    }

    fn buy(&mut self, point: &PricePoint) -> Result<Trade, MacrossError> {
        let value = self.cash;
        let units = value / point.close_price;
        if !(units.is_finite() && units > 0.0) {
            return Err(MacrossError::invalid_parameter(
                "initial_investment",
                format!(
                    "buying at {} on {} yields {units} units",
                    point.close_price, point.date
                ),
            ));
        }
        self.holdings_units = units;
        self.cash = 0.0;
        self.trade_count += 1;
        Ok(Trade {
            date: point.date,
            side: TradeSide::Buy,
            price: point.close_price,
            units,
            value,
        })
    }

    fn sell(&mut self, point: &PricePoint) -> Result<Trade, MacrossError> {
        let units = self.holdings_units;
        let proceeds = units * point.close_price;
        if !(proceeds.is_finite() && proceeds > 0.0) {
            return Err(MacrossError::invalid_parameter(
                "initial_investment",
                format!(
                    "selling {units} units at {} on {} yields {proceeds}",
                    point.close_price, point.date
                ),
            ));
        }
        self.cash = proceeds;
        self.holdings_units = 0.0;
        self.trade_count += 1;
        Ok(Trade {
            date: point.date,
            side: TradeSide::Sell,
            price: point.close_price,
            units,
            value: proceeds,
        })
    }

    /// Folds the current value into the running peak and drawdown.
    fn mark(&mut self, value: f64) {
        self.peak_value = self.peak_value.max(value);
        let drawdown = if self.peak_value > 0.0 {
            (self.peak_value - value) / self.peak_value
        } else {
            0.0
        };
        self.max_drawdown_fraction = self.max_drawdown_fraction.max(drawdown);
    }
}

/// Full trace of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub state: PortfolioState,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Cash plus holdings marked at the last available close.
    pub final_value: f64,
}

/// Walks `prices` once, flipping between FLAT and INVESTED on strict crossovers.
///
/// `signals` must be aligned index-for-index with `prices`. Steps where either
/// average is undefined are skipped entirely: no trade and no drawdown update.
/// A buy or sell that would leave the portfolio without a positive finite
/// value is rejected.
pub fn simulate(
    prices: &[PricePoint],
    signals: &SignalSeries,
    initial_investment: f64,
    policy: CrossoverPolicy,
) -> Result<Simulation, MacrossError> {
    if prices.len() != signals.len() {
        return Err(MacrossError::invalid_parameter(
            "signals",
            format!(
                "{} signal points for {} prices",
                signals.len(),
                prices.len()
            ),
        ));
    }

    let mut state = PortfolioState::new(initial_investment);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(prices.len());

    for (point, signal) in prices.iter().zip(&signals.points) {
        let Some((short_ma, long_ma)) = signal.pair() else {
            continue;
        };

        if !state.is_invested() && policy.is_bullish(short_ma, long_ma) {
            let trade = state.buy(point)?;
            tracing::debug!(date = %trade.date, price = trade.price, units = trade.units, "buy");
            trades.push(trade);
        } else if state.is_invested() && policy.is_bearish(short_ma, long_ma) {
            let trade = state.sell(point)?;
            tracing::debug!(date = %trade.date, price = trade.price, value = trade.value, "sell");
            trades.push(trade);
        }

        let value = state.value_at(point.close_price);
        state.mark(value);
        equity_curve.push(EquityPoint {
            date: point.date,
            value,
        });
    }

    let final_value = match prices.last() {
        Some(last) => state.value_at(last.close_price),
        None => state.cash,
    };

    Ok(Simulation {
        state,
        trades,
        equity_curve,
        final_value,
    })
}
