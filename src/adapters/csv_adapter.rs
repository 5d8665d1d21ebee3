//! CSV file price-series adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row. The date
//! column is `date`; the close column is the first of [`CLOSE_COLUMNS`]
//! present, so plain `date,close_price` files and raw daily OHLCV exports
//! both load.

use crate::domain::error::MacrossError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::PriceSeriesPort;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const CLOSE_COLUMNS: &[&str] = &["close_price", "close", "4. close", "adj_close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn read_file(&self, symbol: &str) -> Result<Option<String>, MacrossError> {
        let path = self.csv_path(symbol);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MacrossError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }
}

fn parse_prices(content: &str, symbol: &str) -> Result<Vec<PricePoint>, MacrossError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| MacrossError::DataSource {
            reason: format!("{symbol}: CSV header error: {e}"),
        })?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    };
    let date_idx = column("date").ok_or_else(|| MacrossError::DataSource {
        reason: format!("{symbol}: missing date column"),
    })?;
    let close_idx = CLOSE_COLUMNS
        .iter()
        .find_map(|name| column(*name))
        .ok_or_else(|| MacrossError::DataSource {
            reason: format!("{symbol}: missing close column"),
        })?;

    let mut prices = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| MacrossError::DataSource {
            reason: format!("{symbol}: CSV parse error: {e}"),
        })?;
        let line = row + 2;

        let date_str = record.get(date_idx).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            MacrossError::DataSource {
                reason: format!("{symbol} line {line}: invalid date '{date_str}': {e}"),
            }
        })?;

        let close_str = record.get(close_idx).unwrap_or_default();
        let close_price: f64 = close_str.parse().map_err(|e| MacrossError::DataSource {
            reason: format!("{symbol} line {line}: invalid close '{close_str}': {e}"),
        })?;
        if !close_price.is_finite() || close_price <= 0.0 {
            return Err(MacrossError::DataSource {
                reason: format!("{symbol} line {line}: close must be positive, got {close_price}"),
            });
        }

        prices.push(PricePoint::new(date, close_price));
    }

    prices.sort_by_key(|p| p.date);
    if let Some(pair) = prices.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(MacrossError::DataSource {
            reason: format!("{symbol}: duplicate date {}", pair[0].date),
        });
    }

    Ok(prices)
}

impl PriceSeriesPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, MacrossError> {
        let Some(content) = self.read_file(symbol)? else {
            tracing::debug!(symbol, path = %self.csv_path(symbol).display(), "no price file");
            return Ok(Vec::new());
        };

        let mut prices = parse_prices(&content, symbol)?;
        prices.retain(|p| {
            start_date.is_none_or(|start| p.date >= start) && end_date.is_none_or(|end| p.date <= end)
        });
        Ok(prices)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MacrossError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MacrossError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if let (true, Some(stem)) = (is_csv, path.file_stem()) {
                symbols.push(stem.to_string_lossy().to_uppercase());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
