//! Instrument universe for a multi-instrument backtest.
//!
//! Parses instrument lists from configuration or the command line and fetches
//! each instrument's prices. Any instrument the data source cannot supply
//! aborts the run.

use crate::domain::error::SmacrossError;
use crate::domain::price::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::info;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Universe {
    pub instruments: Vec<String>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.instruments.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

/// Splits a comma separated list into upper-cased symbols.
pub fn parse_instruments(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateInstrument(symbol));
        }
        instruments.push(symbol);
    }

    Ok(instruments)
}

#[derive(Debug, Clone)]
pub struct UniverseValidationResult {
    pub universe: Universe,
    pub series: Vec<PriceSeries>,
}

/// Fetches every instrument in `instruments`, keeping input order.
///
/// Fails on the first instrument the data port cannot supply, including one
/// with no prices in range (`EmptySeries`).
pub fn validate_universe(
    data_port: &dyn DataPort,
    instruments: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<UniverseValidationResult, SmacrossError> {
    if instruments.is_empty() {
        return Err(SmacrossError::NoInstruments);
    }

    let mut series = Vec::with_capacity(instruments.len());
    for instrument in &instruments {
        let prices = data_port.fetch_prices(instrument, start_date, end_date)?;
        info!("  {}: {} prices [OK]", instrument, prices.len());
        series.push(prices);
    }

    Ok(UniverseValidationResult {
        universe: Universe { instruments },
        series,
    })
}
