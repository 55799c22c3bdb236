//! Backtest pipeline: prices -> moving averages -> signals -> portfolio.
//!
//! Per-instrument analysis is independent and runs as a parallel map; the
//! portfolio fold over the date axis runs afterwards on one thread.

use crate::domain::error::SmacrossError;
use crate::domain::metrics::{Metrics, Summary};
use crate::domain::moving_average::{compute_moving_averages, MovingAverageSeries, Windows};
use crate::domain::portfolio::{simulate, InstrumentLeg, PortfolioHistory, SimulationSettings};
use crate::domain::price::PriceSeries;
use crate::domain::signal::{generate_signals, PositionChange, Signal, SignalSeries, WarmupPolicy};
use crate::domain::timeline::{self, DateAlignment};
use chrono::NaiveDate;
use log::debug;
use rayon::prelude::*;
use std::fmt;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub windows: Windows,
    pub warmup: WarmupPolicy,
    pub simulation: SimulationSettings,
    pub alignment: DateAlignment,
    pub risk_free_rate: f64,
}

/// Everything the chart layer needs for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentReport {
    pub instrument: String,
    pub prices: Vec<f64>,
    pub moving_averages: MovingAverageSeries,
    pub signals: SignalSeries,
}

impl InstrumentReport {
    pub fn short_ma(&self) -> Vec<f64> {
        self.moving_averages.short.raw_values()
    }

    pub fn long_ma(&self) -> Vec<f64> {
        self.moving_averages.long.raw_values()
    }

    pub fn signal_values(&self) -> Vec<Signal> {
        self.signals.signals.clone()
    }

    pub fn position_changes(&self) -> &[PositionChange] {
        &self.signals.changes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => f.pad("BUY"),
            TradeKind::Sell => f.pad("SELL"),
        }
    }
}

/// A (date, instrument) pair where the position change was non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub instrument: String,
    pub kind: TradeKind,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub dates: Vec<NaiveDate>,
    pub reports: Vec<InstrumentReport>,
    pub history: PortfolioHistory,
    pub summary: Summary,
}

impl BacktestResult {
    /// Buy/sell events ordered by date, then by instrument input order.
    pub fn trade_events(&self) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        for (index, date) in self.dates.iter().enumerate() {
            for report in &self.reports {
                let kind = match report.signals.changes[index] {
                    PositionChange::Enter => TradeKind::Buy,
                    PositionChange::Exit => TradeKind::Sell,
                    PositionChange::None => continue,
                };
                events.push(TradeEvent {
                    date: *date,
                    instrument: report.instrument.clone(),
                    kind,
                    price: report.prices[index],
                });
            }
        }
        events
    }

    pub fn total_series(&self) -> Vec<f64> {
        self.history.totals()
    }

    pub fn return_series(&self) -> Vec<f64> {
        self.history.returns()
    }

    pub fn cumulative_return_series(&self) -> Vec<f64> {
        self.history.cumulative_returns()
    }

    pub fn report(&self, instrument: &str) -> Option<&InstrumentReport> {
        self.reports.iter().find(|r| r.instrument == instrument)
    }

    pub fn metrics(&self, risk_free_rate: f64) -> Metrics {
        let events = self.trade_events();
        let buys = events.iter().filter(|e| e.kind == TradeKind::Buy).count();
        let sells = events.len() - buys;
        Metrics::compute(&self.history, buys, sells, risk_free_rate)
    }
}

pub fn analyse_instrument(
    series: &PriceSeries,
    windows: Windows,
    warmup: WarmupPolicy,
) -> Result<InstrumentReport, SmacrossError> {
    let moving_averages = compute_moving_averages(series, windows)?;
    let signals = generate_signals(&moving_averages, warmup)?;

    debug!(
        "{}: {} points, {} entries, {} exits",
        series.instrument(),
        series.len(),
        signals.entries().len(),
        signals.exits().len()
    );

    Ok(InstrumentReport {
        instrument: series.instrument().to_string(),
        prices: series.prices(),
        moving_averages,
        signals,
    })
}

pub fn run_backtest(
    series: Vec<PriceSeries>,
    config: &BacktestConfig,
) -> Result<BacktestResult, SmacrossError> {
    if series.is_empty() {
        return Err(SmacrossError::NoInstruments);
    }
    config.windows.validate()?;

    let (dates, series) = timeline::align(series, config.alignment)?;

    let reports = series
        .par_iter()
        .map(|s| analyse_instrument(s, config.windows, config.warmup))
        .collect::<Result<Vec<_>, _>>()?;

    let history = {
        let legs: Vec<InstrumentLeg<'_>> = reports
            .iter()
            .map(|r| InstrumentLeg {
                instrument: &r.instrument,
                prices: &r.prices,
                changes: &r.signals.changes,
            })
            .collect();
        simulate(config.initial_capital, &dates, &legs, config.simulation)?
    };
    let summary = Summary::from_history(&history);

    Ok(BacktestResult {
        dates,
        reports,
        history,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::{CashAccounting, PositionMode};

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            initial_capital: 10_000.0,
            windows: Windows { short: 2, long: 4 },
            warmup: WarmupPolicy::Immediate,
            simulation: SimulationSettings::default(),
            alignment: DateAlignment::Strict,
            risk_free_rate: 0.0,
        }
    }

    fn series(instrument: &str, prices: &[f64]) -> PriceSeries {
        PriceSeries::from_pairs(
            instrument,
            prices.iter().enumerate().map(|(i, &p)| {
                (
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                    p,
                )
            }),
        )
        .unwrap()
    }

    #[test]
    fn config_fields() {
        let c = sample_config();
        assert_eq!(c.windows, Windows { short: 2, long: 4 });
        assert_eq!(c.simulation.position_mode, PositionMode::SingleUnit);
        assert_eq!(c.simulation.cash_accounting, CashAccounting::HoldingsDelta);
        assert!((c.initial_capital - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn step_up_produces_one_buy() {
        let result = run_backtest(
            vec![series("XLE", &[10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0])],
            &sample_config(),
        )
        .unwrap();

        let events = result.trade_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TradeKind::Buy);
        assert_eq!(events[0].instrument, "XLE");
        assert_eq!(events[0].price, 20.0);

        let last = result.history.final_state().unwrap();
        assert_eq!(last.holdings[0], 20.0);
    }

    #[test]
    fn reports_keep_input_order() {
        let result = run_backtest(
            vec![
                series("XLE", &[1.0, 2.0, 3.0]),
                series("USO", &[3.0, 2.0, 1.0]),
                series("UNG", &[2.0, 2.0, 2.0]),
            ],
            &sample_config(),
        )
        .unwrap();

        let names: Vec<&str> = result.reports.iter().map(|r| r.instrument.as_str()).collect();
        assert_eq!(names, vec!["XLE", "USO", "UNG"]);
        assert_eq!(result.history.instruments, vec!["XLE", "USO", "UNG"]);
        assert!(result.report("USO").is_some());
        assert!(result.report("EZJ").is_none());
    }

    #[test]
    fn output_series_aligned_with_dates() {
        let result = run_backtest(vec![series("XLE", &[5.0, 6.0, 7.0, 6.0, 5.0])], &sample_config())
            .unwrap();
        let report = &result.reports[0];

        assert_eq!(result.dates.len(), 5);
        assert_eq!(report.prices.len(), 5);
        assert_eq!(report.short_ma().len(), 5);
        assert_eq!(report.long_ma().len(), 5);
        assert_eq!(report.signal_values().len(), 5);
        assert_eq!(report.position_changes().len(), 5);
        assert_eq!(result.history.states.len(), 5);
    }

    #[test]
    fn sell_events_reported() {
        let mut config = sample_config();
        config.windows = Windows { short: 1, long: 3 };
        let result = run_backtest(
            vec![series("XLE", &[10.0, 10.0, 10.0, 20.0, 20.0, 5.0, 5.0])],
            &config,
        )
        .unwrap();

        let kinds: Vec<TradeKind> = result.trade_events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TradeKind::Buy, TradeKind::Sell]);

        let metrics = result.metrics(0.0);
        assert_eq!(metrics.buy_events, 1);
        assert_eq!(metrics.sell_events, 1);
    }

    #[test]
    fn no_instruments_fails() {
        let err = run_backtest(vec![], &sample_config()).unwrap_err();
        assert!(matches!(err, SmacrossError::NoInstruments));
    }

    #[test]
    fn invalid_windows_fail_before_any_work() {
        let mut config = sample_config();
        config.windows = Windows { short: 4, long: 2 };
        let err = run_backtest(vec![series("XLE", &[1.0])], &config).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidWindow { .. }));
    }

    #[test]
    fn misaligned_axes_fail() {
        let err = run_backtest(
            vec![series("XLE", &[1.0, 2.0, 3.0]), series("USO", &[1.0, 2.0])],
            &sample_config(),
        )
        .unwrap_err();
        assert!(matches!(err, SmacrossError::InsufficientData { .. }));
    }

    #[test]
    fn intersect_alignment_recovers() {
        let mut config = sample_config();
        config.alignment = DateAlignment::Intersect;
        let result = run_backtest(
            vec![series("XLE", &[1.0, 2.0, 3.0]), series("USO", &[1.0, 2.0])],
            &config,
        )
        .unwrap();
        assert_eq!(result.dates.len(), 2);
    }

    #[test]
    fn trade_kind_display() {
        assert_eq!(TradeKind::Buy.to_string(), "BUY");
        assert_eq!(TradeKind::Sell.to_string(), "SELL");
    }
}
