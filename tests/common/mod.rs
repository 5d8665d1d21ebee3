#![allow(dead_code)]

use chrono::NaiveDate;
use macross::domain::error::MacrossError;
pub use macross::domain::price::PricePoint;
use macross::ports::data_port::PriceSeriesPort;
use std::collections::HashMap;

pub struct MockPriceSeries {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSeries {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), prices);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSeriesPort for MockPriceSeries {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, MacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MacrossError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|p| start_date.is_none_or(|s| p.date >= s))
            .filter(|p| end_date.is_none_or(|e| p.date <= e))
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily points starting at `start` (YYYY-MM-DD).
pub fn series(start: &str, closes: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn to_csv(prices: &[PricePoint]) -> String {
    let mut out = String::from("date,close_price\n");
    for p in prices {
        out.push_str(&format!("{},{}\n", p.date, p.close_price));
    }
    out
}
