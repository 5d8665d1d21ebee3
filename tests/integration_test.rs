//! End-to-end backtest scenarios.
//!
//! Tests cover:
//! - Reference scenarios (uptrend, flat, short series, window equality, single round trip)
//! - Error ordering and propagation through `run_backtest`
//! - Full load → signal → simulate → summarize pipeline through a mock provider
//! - Crossover policy selection

mod common;

use approx::assert_relative_eq;
use common::*;
use macross::cli::{run_backtest_pipeline, BacktestSettings, ReportFormat};
use macross::domain::backtest::{run_backtest, simulate_backtest, BacktestConfig};
use macross::domain::error::MacrossError;
use macross::domain::portfolio::{CrossoverPolicy, TradeSide};
use macross::domain::signal::compute_signals;
use std::path::PathBuf;

mod scenarios {
    use super::*;

    #[test]
    fn uptrend_buys_and_never_draws_down() {
        let prices = series("2023-01-02", &[148.0, 151.0, 154.0, 156.0, 157.0]);
        let config = BacktestConfig::new(10_000.0, 2, 3);

        let (simulation, result) = simulate_backtest(&prices, &config).unwrap();

        let buys = simulation
            .trades
            .iter()
            .filter(|t| t.side == TradeSide::Buy)
            .count();
        let sells = simulation.trades.len() - buys;
        assert!(buys >= 1);
        assert!(sells <= 1);
        assert!(result.trade_count >= 1);
        assert_relative_eq!(result.max_drawdown_pct, 0.0);
        // bought at 154, marked at 157
        assert_relative_eq!(
            result.total_return_pct,
            (157.0 / 154.0 - 1.0) * 100.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn flat_series_never_trades() {
        for price in [100.0, 0.1, 33.33, 148.37] {
            let prices = series("2023-01-02", &[price; 200]);
            for (short, long) in [(1, 3), (3, 7), (5, 10), (20, 50)] {
                let result =
                    run_backtest(&prices, &BacktestConfig::new(10_000.0, short, long)).unwrap();

                assert_eq!(result.trade_count, 0, "price {price} windows {short}/{long}");
                assert_eq!(result.total_return_pct, 0.0);
                assert_eq!(result.max_drawdown_pct, 0.0);
                assert_eq!(result.final_portfolio_value, 10_000.0);
            }
        }
    }

    #[test]
    fn flat_tail_after_varying_prefix_stops_trading() {
        let mut closes: Vec<f64> = (0..300)
            .map(|i| 101.13 + ((i * 7) % 11) as f64 * 0.37 - 1.85)
            .collect();
        closes.extend([101.13; 200]);
        let prices = series("2022-01-03", &closes);

        let signals = compute_signals(&prices, 5, 20).unwrap();
        for point in &signals.points[300 + 19..] {
            assert_eq!(point.short_ma, point.long_ma);
        }

        // no trade once both windows sit inside the tail
        let (simulation, _) =
            simulate_backtest(&prices, &BacktestConfig::new(10_000.0, 5, 20)).unwrap();
        let tail_start = prices[300 + 19].date;
        assert!(simulation.trades.iter().all(|t| t.date < tail_start));
    }

    #[test]
    fn series_shorter_than_long_window() {
        let prices = series("2023-01-02", &[10.0, 11.0, 12.0, 13.0]);
        let err = run_backtest(&prices, &BacktestConfig::new(10_000.0, 2, 5)).unwrap_err();
        assert!(matches!(
            err,
            MacrossError::InsufficientData {
                points: 4,
                required: 5
            }
        ));
    }

    #[test]
    fn single_point_with_equal_windows_is_invalid() {
        let prices = series("2023-01-02", &[100.0]);
        let err = run_backtest(&prices, &BacktestConfig::new(10_000.0, 1, 1)).unwrap_err();
        assert!(matches!(err, MacrossError::InvalidParameter { .. }));
    }

    #[test]
    fn single_round_trip_returns_twenty_percent() {
        // SMA(1) is the close itself; SMA(2) the two-day mean.
        // day 1: 100 > 95 -> buy at 100; day 2: 130 > 115 hold;
        // day 3: 120 < 125 -> sell at 120; day 4: 110 < 115 stay flat.
        let prices = series("2023-03-01", &[90.0, 100.0, 130.0, 120.0, 110.0]);
        let (simulation, result) =
            simulate_backtest(&prices, &BacktestConfig::new(10_000.0, 1, 2)).unwrap();

        assert_eq!(result.trade_count, 2);
        assert_relative_eq!(result.total_return_pct, 20.0, max_relative = 1e-12);
        assert_relative_eq!(result.final_portfolio_value, 12_000.0, max_relative = 1e-12);

        assert_eq!(simulation.trades[0].side, TradeSide::Buy);
        assert_relative_eq!(simulation.trades[0].price, 100.0);
        assert_eq!(simulation.trades[1].side, TradeSide::Sell);
        assert_relative_eq!(simulation.trades[1].price, 120.0);

        // peak 13 000 on day 2, 12 000 on day 3
        assert_relative_eq!(
            result.max_drawdown_pct,
            1_000.0 / 13_000.0 * 100.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn still_invested_at_end_counts_no_liquidation_trade() {
        let prices = series("2023-03-01", &[90.0, 100.0, 110.0, 120.0]);
        let result = run_backtest(&prices, &BacktestConfig::new(1_000.0, 1, 2)).unwrap();
        assert_eq!(result.trade_count, 1);
        assert_relative_eq!(result.final_portfolio_value, 1_200.0, max_relative = 1e-12);
    }

    #[test]
    fn downtrend_then_recovery() {
        let closes = [
            50.0, 52.0, 54.0, 56.0, 58.0, 57.0, 55.0, 52.0, 49.0, 47.0, 48.0, 51.0, 55.0, 58.0,
        ];
        let prices = series("2023-05-01", &closes);
        let (simulation, result) =
            simulate_backtest(&prices, &BacktestConfig::new(10_000.0, 2, 4)).unwrap();

        assert!(result.trade_count >= 2);
        assert!(result.max_drawdown_pct > 0.0);
        for pair in simulation.trades.windows(2) {
            assert_ne!(pair[0].side, pair[1].side);
        }
    }
}

mod errors {
    use super::*;

    #[test]
    fn empty_series_is_no_data() {
        let err = run_backtest(&[], &BacktestConfig::new(10_000.0, 2, 3)).unwrap_err();
        assert!(matches!(err, MacrossError::NoData { .. }));
    }

    #[test]
    fn non_positive_investment() {
        let prices = series("2023-01-02", &[1.0, 2.0, 3.0]);
        let err = run_backtest(&prices, &BacktestConfig::new(0.0, 1, 2)).unwrap_err();
        assert!(matches!(err, MacrossError::InvalidParameter { name, .. } if name == "initial_investment"));
    }

    #[test]
    fn duplicate_dates_rejected() {
        let mut prices = series("2023-01-02", &[1.0, 2.0, 3.0]);
        prices[2].date = prices[1].date;
        let err = run_backtest(&prices, &BacktestConfig::new(100.0, 1, 2)).unwrap_err();
        assert!(matches!(err, MacrossError::InvalidParameter { .. }));
    }
}

mod pipeline {
    use super::*;

    fn settings(symbol: &str, short_window: usize, long_window: usize) -> BacktestSettings {
        BacktestSettings {
            symbol: symbol.to_string(),
            data_dir: PathBuf::from("unused"),
            start_date: None,
            end_date: None,
            config: BacktestConfig::new(10_000.0, short_window, long_window),
            format: ReportFormat::Text,
            show_trades: false,
        }
    }

    #[test]
    fn pipeline_with_mock_provider() {
        let prices = series("2023-03-01", &[90.0, 100.0, 130.0, 120.0, 110.0]);
        let port = MockPriceSeries::new().with_prices("AAPL", prices);

        let report = run_backtest_pipeline(&port, &settings("AAPL", 1, 2)).unwrap();

        assert_eq!(report.symbol, "AAPL");
        assert_eq!(report.points, 5);
        assert_eq!(report.start_date, date(2023, 3, 1));
        assert_eq!(report.end_date, date(2023, 3, 5));
        assert_eq!(report.result.trade_count, 2);
        assert_eq!(report.trades.len(), 2);
        assert_relative_eq!(report.result.total_return_pct, 20.0, max_relative = 1e-12);
    }

    #[test]
    fn unknown_symbol_is_no_data_with_symbol() {
        let port = MockPriceSeries::new();
        let err = run_backtest_pipeline(&port, &settings("ZZZ", 1, 2)).unwrap_err();
        assert!(matches!(err, MacrossError::NoData { ref symbol } if symbol == "ZZZ"));
        assert_eq!(err.to_string(), "no price data for ZZZ");
    }

    #[test]
    fn provider_error_propagates() {
        let port = MockPriceSeries::new().with_error("AAPL", "connection refused");
        let err = run_backtest_pipeline(&port, &settings("AAPL", 1, 2)).unwrap_err();
        assert!(matches!(err, MacrossError::DataSource { .. }));
    }

    #[test]
    fn date_range_restricts_series() {
        let prices = series("2023-03-01", &[90.0, 100.0, 130.0, 120.0, 110.0]);
        let port = MockPriceSeries::new().with_prices("AAPL", prices);

        let mut s = settings("AAPL", 1, 2);
        s.start_date = Some(date(2023, 3, 2));
        s.end_date = Some(date(2023, 3, 3));
        let report = run_backtest_pipeline(&port, &s).unwrap();
        assert_eq!(report.points, 2);
        assert_eq!(report.start_date, date(2023, 3, 2));
    }

    #[test]
    fn range_too_narrow_is_insufficient() {
        let prices = series("2023-03-01", &[90.0, 100.0, 130.0, 120.0, 110.0]);
        let port = MockPriceSeries::new().with_prices("AAPL", prices);

        let mut s = settings("AAPL", 2, 4);
        s.end_date = Some(date(2023, 3, 2));
        let err = run_backtest_pipeline(&port, &s).unwrap_err();
        assert!(matches!(err, MacrossError::InsufficientData { .. }));
    }
}

mod policy {
    use super::*;

    #[test]
    fn inverted_policy_mirrors_golden() {
        let prices = series("2023-03-01", &[130.0, 120.0, 100.0, 110.0, 140.0, 150.0]);

        let golden = BacktestConfig::new(10_000.0, 1, 2);
        let inverted = golden.clone().with_policy(CrossoverPolicy::Inverted);

        let (g, _) = simulate_backtest(&prices, &golden).unwrap();
        let (i, _) = simulate_backtest(&prices, &inverted).unwrap();

        // golden: first buy on the first up day; inverted: first buy on the first down day
        assert_eq!(g.trades[0].date, date(2023, 3, 4));
        assert_eq!(i.trades[0].date, date(2023, 3, 2));
    }
}
