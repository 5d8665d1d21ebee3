//! Short/long simple moving averages over closing prices.
//!
//! O(n) sliding window: each average keeps a compensated running sum, adding
//! the newest close and subtracting the one that falls out of the window.
//! A window of identical closes yields that close exactly, so equal prices
//! always give equal averages.
//! Warmup: SMA(n) is undefined for the first (n-1) points.

use super::error::MacrossError;
use super::price::PricePoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPoint {
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
}

impl SignalPoint {
    /// Both averages, once both windows are filled.
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.short_ma?, self.long_ma?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub short_window: usize,
    pub long_window: usize,
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the first point where both averages are defined.
    pub fn first_defined_index(&self) -> Option<usize> {
        self.points.iter().position(|p| p.pair().is_some())
    }
}

/// Computes the aligned short/long SMA series.
///
/// Window ordering (`short_window < long_window`) is the caller's concern; only
/// a zero window is rejected here since it has no meaningful average.
pub fn compute_signals(
    prices: &[PricePoint],
    short_window: usize,
    long_window: usize,
) -> Result<SignalSeries, MacrossError> {
    if short_window == 0 || long_window == 0 {
        return Err(MacrossError::invalid_parameter(
            "window",
            "moving average windows must be at least 1",
        ));
    }
    if prices.is_empty() {
        return Err(MacrossError::NoData {
            symbol: String::new(),
        });
    }
    let required = short_window.max(long_window);
    if prices.len() < required {
        return Err(MacrossError::InsufficientData {
            points: prices.len(),
            required,
        });
    }

    let short = sliding_mean(prices, short_window);
    let long = sliding_mean(prices, long_window);

    let points = short
        .into_iter()
        .zip(long)
        .map(|(short_ma, long_ma)| SignalPoint { short_ma, long_ma })
        .collect();

    Ok(SignalSeries {
        short_window,
        long_window,
        points,
    })
}

/// Neumaier-compensated running sum.
#[derive(Debug, Default, Clone, Copy)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

fn sliding_mean(prices: &[PricePoint], period: usize) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(prices.len());
    let mut window_sum = CompensatedSum::default();
    // length of the run of identical closes ending at the current point
    let mut run = 0usize;

    for (i, point) in prices.iter().enumerate() {
        let close = point.close_price;
        run = match i.checked_sub(1).map(|j| prices[j].close_price) {
            Some(prev) if prev == close => run + 1,
            _ => 1,
        };

        window_sum.add(close);
        if i >= period {
            window_sum.add(-prices[i - period].close_price);
        }

        if i + 1 < period {
            values.push(None);
        } else if run >= period {
            // constant window: the mean is the close itself, bit for bit
            values.push(Some(close));
        } else {
            values.push(Some(window_sum.value() / period as f64));
        }
    }

    values
}
