//! Technical indicator types.
//!
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorSeries`: a time series of indicator values for one period

pub mod sma;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    /// True once the trailing window holds `period` prices.
    pub full: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub period: usize,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).map(|p| p.value)
    }

    pub fn raw_values(&self) -> Vec<f64> {
        self.values.iter().map(|p| p.value).collect()
    }

    /// Index of the first point whose window is fully populated.
    pub fn first_full_index(&self) -> Option<usize> {
        self.values.iter().position(|p| p.full)
    }
}
