//! Crossover signals and position changes.
//!
//! Signal(d) is `Long` when short(d) > long(d), `Flat` otherwise (ties are
//! flat). PositionChange is the first difference of Signal with a flat state
//! assumed before the first date, so a long first date registers as `Enter`.

use crate::domain::error::SmacrossError;
use crate::domain::moving_average::MovingAverageSeries;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signal {
    #[default]
    Flat,
    Long,
}

impl Signal {
    pub fn value(self) -> i64 {
        match self {
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionChange {
    Exit,
    #[default]
    None,
    Enter,
}

impl PositionChange {
    pub fn between(prev: Signal, curr: Signal) -> Self {
        match curr.value() - prev.value() {
            1 => PositionChange::Enter,
            -1 => PositionChange::Exit,
            _ => PositionChange::None,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            PositionChange::Exit => -1,
            PositionChange::None => 0,
            PositionChange::Enter => 1,
        }
    }

    pub fn is_event(self) -> bool {
        self != PositionChange::None
    }
}

/// When the crossover comparison is allowed to produce a long signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmupPolicy {
    /// Compare from the first date, even on partial-window averages.
    #[default]
    Immediate,
    /// Stay flat until the long window is fully populated.
    LongWindow,
}

impl WarmupPolicy {
    /// First index at which a long signal may be emitted.
    pub fn first_active_index(self, ma: &MovingAverageSeries) -> usize {
        match self {
            WarmupPolicy::Immediate => 0,
            WarmupPolicy::LongWindow => ma.long.first_full_index().unwrap_or(ma.long.len()),
        }
    }
}

impl FromStr for WarmupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(WarmupPolicy::Immediate),
            "long_window" => Ok(WarmupPolicy::LongWindow),
            other => Err(format!(
                "unknown warmup policy '{}' (expected immediate or long_window)",
                other
            )),
        }
    }
}

impl fmt::Display for WarmupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarmupPolicy::Immediate => write!(f, "immediate"),
            WarmupPolicy::LongWindow => write!(f, "long_window"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub instrument: String,
    pub dates: Vec<NaiveDate>,
    pub signals: Vec<Signal>,
    pub changes: Vec<PositionChange>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Dates with an `Enter` change.
    pub fn entries(&self) -> Vec<NaiveDate> {
        self.dates_with(PositionChange::Enter)
    }

    /// Dates with an `Exit` change.
    pub fn exits(&self) -> Vec<NaiveDate> {
        self.dates_with(PositionChange::Exit)
    }

    fn dates_with(&self, change: PositionChange) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .zip(&self.changes)
            .filter(|&(_, c)| *c == change)
            .map(|(d, _)| *d)
            .collect()
    }
}

pub fn generate_signals(
    ma: &MovingAverageSeries,
    warmup: WarmupPolicy,
) -> Result<SignalSeries, SmacrossError> {
    if ma.is_empty() {
        return Err(SmacrossError::EmptySeries {
            instrument: ma.instrument.clone(),
        });
    }
    if ma.long.len() != ma.short.len() {
        return Err(SmacrossError::InsufficientData {
            instrument: ma.instrument.clone(),
            expected: ma.short.len(),
            actual: ma.long.len(),
        });
    }

    let first_active = warmup.first_active_index(ma);

    let signals: Vec<Signal> = ma
        .short
        .values
        .iter()
        .zip(&ma.long.values)
        .enumerate()
        .map(|(i, (short, long))| {
            if i >= first_active && short.value > long.value {
                Signal::Long
            } else {
                Signal::Flat
            }
        })
        .collect();

    let mut prev = Signal::Flat;
    let changes = signals
        .iter()
        .map(|&curr| {
            let change = PositionChange::between(prev, curr);
            prev = curr;
            change
        })
        .collect();

    Ok(SignalSeries {
        instrument: ma.instrument.clone(),
        dates: ma.dates(),
        signals,
        changes,
    })
}
