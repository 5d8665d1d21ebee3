//! Price-series provider port.

use crate::domain::error::MacrossError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait PriceSeriesPort {
    /// Daily closes for one symbol, ascending by date, restricted to the
    /// inclusive range when bounds are given. An empty series means the
    /// symbol is unknown to this provider.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, MacrossError>;

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError>;

    /// First date, last date and point count, or `None` for an unknown symbol.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        let prices = self.fetch_prices(symbol, None, None)?;
        Ok(match (prices.first(), prices.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, prices.len())),
            _ => None,
        })
    }
}
