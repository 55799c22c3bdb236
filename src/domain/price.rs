//! Price series representation.

use crate::domain::error::SmacrossError;
use chrono::NaiveDate;

/// Adjusted closing price of one instrument on one trading date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Ordered prices for a single instrument.
///
/// Construction checks that the series is non-empty, that dates are strictly
/// increasing (no duplicates) and that every price is finite. Once built the
/// series is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    instrument: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(
        instrument: impl Into<String>,
        points: Vec<PricePoint>,
    ) -> Result<Self, SmacrossError> {
        let instrument = instrument.into();

        if points.is_empty() {
            return Err(SmacrossError::EmptySeries { instrument });
        }

        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() {
                return Err(SmacrossError::InvalidPrice {
                    instrument,
                    date: point.date,
                });
            }
            if i > 0 && point.date <= points[i - 1].date {
                return Err(SmacrossError::UnorderedDates {
                    instrument,
                    date: point.date,
                });
            }
        }

        Ok(Self { instrument, points })
    }

    pub fn from_pairs(
        instrument: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, SmacrossError> {
        let points = pairs
            .into_iter()
            .map(|(date, price)| PricePoint { date, price })
            .collect();
        Self::new(instrument, points)
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }
}
