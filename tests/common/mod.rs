#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::backtest::BacktestConfig;
use smacross::domain::error::SmacrossError;
use smacross::domain::moving_average::Windows;
use smacross::domain::portfolio::SimulationSettings;
pub use smacross::domain::price::PriceSeries;
use smacross::domain::signal::WarmupPolicy;
use smacross::domain::timeline::DateAlignment;
use smacross::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.instrument().to_string(), series);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SmacrossError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(SmacrossError::Data {
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(instrument)
            .map(|s| {
                s.points()
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(instrument, points)
    }

    fn list_instruments(&self) -> Result<Vec<String>, SmacrossError> {
        let mut instruments: Vec<String> = self.data.keys().cloned().collect();
        instruments.sort();
        Ok(instruments)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(SmacrossError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(instrument)
            .map(|s| (s.first_date(), s.last_date(), s.len())))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from 2024-01-01.
pub fn day(index: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(index as i64)
}

pub fn make_series(instrument: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::from_pairs(
        instrument,
        prices.iter().enumerate().map(|(i, &p)| (day(i), p)),
    )
    .unwrap()
}

pub fn make_series_from(instrument: &str, first: usize, prices: &[f64]) -> PriceSeries {
    PriceSeries::from_pairs(
        instrument,
        prices.iter().enumerate().map(|(i, &p)| (day(first + i), p)),
    )
    .unwrap()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 10_000.0,
        windows: Windows { short: 2, long: 4 },
        warmup: WarmupPolicy::Immediate,
        simulation: SimulationSettings::default(),
        alignment: DateAlignment::Strict,
        risk_free_rate: 0.0,
    }
}
