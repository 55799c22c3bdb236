//! Common date axis across instruments.

use crate::domain::error::SmacrossError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// What to do when instruments do not share identical dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateAlignment {
    /// Every series must cover every date of the union axis.
    #[default]
    Strict,
    /// Trim every series to the dates all instruments have in common.
    Intersect,
}

impl FromStr for DateAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(DateAlignment::Strict),
            "intersect" => Ok(DateAlignment::Intersect),
            other => Err(format!(
                "unknown date alignment '{}' (expected strict or intersect)",
                other
            )),
        }
    }
}

impl fmt::Display for DateAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateAlignment::Strict => write!(f, "strict"),
            DateAlignment::Intersect => write!(f, "intersect"),
        }
    }
}

pub fn build_unified_timeline(series: &[PriceSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points().iter().map(|p| p.date))
        .collect();
    unique_dates.into_iter().collect()
}

/// Checks that every series covers exactly the union of all dates.
pub fn require_aligned(series: &[PriceSeries]) -> Result<Vec<NaiveDate>, SmacrossError> {
    let timeline = build_unified_timeline(series);
    for s in series {
        if s.len() != timeline.len() {
            return Err(SmacrossError::InsufficientData {
                instrument: s.instrument().to_string(),
                expected: timeline.len(),
                actual: s.len(),
            });
        }
    }
    Ok(timeline)
}

/// Restricts every series to the dates present in all of them.
pub fn intersect(series: Vec<PriceSeries>) -> Result<Vec<PriceSeries>, SmacrossError> {
    let Some(first) = series.first() else {
        return Ok(series);
    };

    let common = series.iter().skip(1).fold(
        first.dates().into_iter().collect::<BTreeSet<_>>(),
        |acc, s| {
            let dates: BTreeSet<NaiveDate> = s.dates().into_iter().collect();
            acc.intersection(&dates).copied().collect()
        },
    );

    series
        .into_iter()
        .map(|s| {
            let points = s
                .points()
                .iter()
                .filter(|p| common.contains(&p.date))
                .copied()
                .collect();
            PriceSeries::new(s.instrument(), points)
        })
        .collect()
}

pub fn align(
    series: Vec<PriceSeries>,
    alignment: DateAlignment,
) -> Result<(Vec<NaiveDate>, Vec<PriceSeries>), SmacrossError> {
    let series = match alignment {
        DateAlignment::Strict => series,
        DateAlignment::Intersect => intersect(series)?,
    };
    let timeline = require_aligned(&series)?;
    Ok((timeline, series))
}
