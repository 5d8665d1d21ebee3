//! Daily closing-price representation.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::MacrossError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close_price: f64) -> Self {
        PricePoint { date, close_price }
    }
}

/// Checks that dates are strictly ascending and every close is a positive, finite number.
pub fn validate_series(prices: &[PricePoint]) -> Result<(), MacrossError> {
    for (i, point) in prices.iter().enumerate() {
        if !point.close_price.is_finite() || point.close_price <= 0.0 {
            return Err(MacrossError::invalid_parameter(
                "price_series",
                format!(
                    "close price on {} must be positive, got {}",
                    point.date, point.close_price
                ),
            ));
        }
        if i > 0 && prices[i - 1].date >= point.date {
            return Err(MacrossError::invalid_parameter(
                "price_series",
                format!(
                    "dates must be strictly ascending: {} follows {}",
                    point.date,
                    prices[i - 1].date
                ),
            ));
        }
    }
    Ok(())
}
