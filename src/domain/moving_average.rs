//! Short/long moving average pair for one instrument.

use crate::domain::error::SmacrossError;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

/// Window lengths for the short and long averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub short: usize,
    pub long: usize,
}

impl Windows {
    pub fn new(short: usize, long: usize) -> Result<Self, SmacrossError> {
        let windows = Self { short, long };
        windows.validate()?;
        Ok(windows)
    }

    pub fn validate(&self) -> Result<(), SmacrossError> {
        if self.short == 0 || self.long == 0 || self.short >= self.long {
            return Err(SmacrossError::InvalidWindow {
                short: self.short,
                long: self.long,
            });
        }
        Ok(())
    }
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            short: 40,
            long: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageSeries {
    pub instrument: String,
    pub short: IndicatorSeries,
    pub long: IndicatorSeries,
}

impl MovingAverageSeries {
    pub fn len(&self) -> usize {
        self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.short.values.iter().map(|p| p.date).collect()
    }
}

/// Computes both averages over `series`, aligned 1:1 with its dates.
pub fn compute_moving_averages(
    series: &PriceSeries,
    windows: Windows,
) -> Result<MovingAverageSeries, SmacrossError> {
    windows.validate()?;
    if series.is_empty() {
        return Err(SmacrossError::EmptySeries {
            instrument: series.instrument().to_string(),
        });
    }

    Ok(MovingAverageSeries {
        instrument: series.instrument().to_string(),
        short: calculate_sma(series.points(), windows.short),
        long: calculate_sma(series.points(), windows.long),
    })
}
