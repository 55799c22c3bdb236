//! Portfolio simulation over a shared date axis.
//!
//! The simulation is a fold: each date produces a new immutable
//! [`PortfolioState`] from the previous one. Per date and instrument:
//!
//! - position(d) = mode(position(d-1), change(d)), position before the axis is 0
//! - holdings(d) = position(d) * price(d), holdings before the axis are 0
//! - cash(d) = cash(d-1) - sum(cash flow(d)), see [`CashAccounting`]
//! - total(d) = cash(d) + sum(holdings(d))
//!
//! Cash is unconstrained and may go negative.

use crate::domain::error::SmacrossError;
use crate::domain::signal::PositionChange;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// How enter/exit events move the running position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionMode {
    /// Position stays within {0, 1}: a repeated enter or an exit while flat is a no-op.
    #[default]
    SingleUnit,
    /// Position is the raw running sum of changes, so repeated enters add size.
    Unclamped,
}

impl PositionMode {
    pub fn apply(self, position: i64, change: PositionChange) -> i64 {
        let next = position + change.value();
        match self {
            PositionMode::SingleUnit => next.clamp(0, 1),
            PositionMode::Unclamped => next,
        }
    }
}

impl FromStr for PositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single_unit" => Ok(PositionMode::SingleUnit),
            "unclamped" => Ok(PositionMode::Unclamped),
            other => Err(format!(
                "unknown position mode '{}' (expected single_unit or unclamped)",
                other
            )),
        }
    }
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionMode::SingleUnit => write!(f, "single_unit"),
            PositionMode::Unclamped => write!(f, "unclamped"),
        }
    }
}

/// How a date's cash flow is derived for each instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CashAccounting {
    /// Cash absorbs every change in holdings value: holdings(d) - holdings(d-1).
    /// Price moves on an open position are offset in cash, so total stays at
    /// the starting capital.
    #[default]
    HoldingsDelta,
    /// Cash moves only when units change hands: (position(d) - position(d-1)) * price(d).
    TradePrice,
}

impl CashAccounting {
    fn cash_flow(
        self,
        prev_position: i64,
        position: i64,
        prev_holding: f64,
        holding: f64,
        price: f64,
    ) -> f64 {
        match self {
            CashAccounting::HoldingsDelta => holding - prev_holding,
            CashAccounting::TradePrice => (position - prev_position) as f64 * price,
        }
    }
}

impl FromStr for CashAccounting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "holdings_delta" => Ok(CashAccounting::HoldingsDelta),
            "trade_price" => Ok(CashAccounting::TradePrice),
            other => Err(format!(
                "unknown cash accounting '{}' (expected holdings_delta or trade_price)",
                other
            )),
        }
    }
}

impl fmt::Display for CashAccounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashAccounting::HoldingsDelta => write!(f, "holdings_delta"),
            CashAccounting::TradePrice => write!(f, "trade_price"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationSettings {
    pub position_mode: PositionMode,
    pub cash_accounting: CashAccounting,
}

/// Portfolio snapshot at the close of one date. Vectors are indexed in the
/// same instrument order as the simulation input.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub cash: f64,
    pub positions: Vec<i64>,
    pub holdings: Vec<f64>,
    pub total: f64,
    pub period_return: f64,
    pub cumulative_return: f64,
}

impl PortfolioState {
    pub fn holdings_value(&self) -> f64 {
        self.holdings.iter().sum()
    }
}

/// One instrument's inputs to the simulation, aligned to the date axis.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentLeg<'a> {
    pub instrument: &'a str,
    pub prices: &'a [f64],
    pub changes: &'a [PositionChange],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioHistory {
    pub initial_capital: f64,
    pub instruments: Vec<String>,
    pub states: Vec<PortfolioState>,
}

impl PortfolioHistory {
    pub fn final_state(&self) -> Option<&PortfolioState> {
        self.states.last()
    }

    pub fn final_value(&self) -> f64 {
        self.final_state()
            .map(|s| s.total)
            .unwrap_or(self.initial_capital)
    }

    pub fn final_cumulative_return(&self) -> f64 {
        self.final_state().map(|s| s.cumulative_return).unwrap_or(0.0)
    }

    pub fn totals(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.total).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.period_return).collect()
    }

    pub fn cumulative_returns(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.cumulative_return).collect()
    }
}

pub fn simulate(
    initial_capital: f64,
    dates: &[NaiveDate],
    legs: &[InstrumentLeg<'_>],
    settings: SimulationSettings,
) -> Result<PortfolioHistory, SmacrossError> {
    if dates.is_empty() {
        return Err(SmacrossError::EmptySeries {
            instrument: legs
                .first()
                .map(|l| l.instrument.to_string())
                .unwrap_or_else(|| "portfolio".to_string()),
        });
    }

    for leg in legs {
        for actual in [leg.prices.len(), leg.changes.len()] {
            if actual != dates.len() {
                return Err(SmacrossError::InsufficientData {
                    instrument: leg.instrument.to_string(),
                    expected: dates.len(),
                    actual,
                });
            }
        }
    }

    let states = dates
        .iter()
        .enumerate()
        .fold(Vec::with_capacity(dates.len()), |mut states, (index, &date)| {
            let next = advance(states.last(), initial_capital, date, index, legs, settings);
            states.push(next);
            states
        });

    Ok(PortfolioHistory {
        initial_capital,
        instruments: legs.iter().map(|l| l.instrument.to_string()).collect(),
        states,
    })
}

fn advance(
    prev: Option<&PortfolioState>,
    initial_capital: f64,
    date: NaiveDate,
    index: usize,
    legs: &[InstrumentLeg<'_>],
    settings: SimulationSettings,
) -> PortfolioState {
    let mut positions = Vec::with_capacity(legs.len());
    let mut holdings = Vec::with_capacity(legs.len());
    let mut cash_flow = 0.0;

    for (k, leg) in legs.iter().enumerate() {
        let prev_position = prev.map(|p| p.positions[k]).unwrap_or(0);
        let prev_holding = prev.map(|p| p.holdings[k]).unwrap_or(0.0);

        let price = leg.prices[index];
        let position = settings
            .position_mode
            .apply(prev_position, leg.changes[index]);
        let holding = position as f64 * price;

        cash_flow += settings.cash_accounting.cash_flow(
            prev_position,
            position,
            prev_holding,
            holding,
            price,
        );
        positions.push(position);
        holdings.push(holding);
    }

    let prev_cash = prev.map(|p| p.cash).unwrap_or(initial_capital);
    let cash = prev_cash - cash_flow;
    let total = cash + holdings.iter().sum::<f64>();

    let period_return = match prev {
        Some(p) if p.total != 0.0 => total / p.total - 1.0,
        _ => 0.0,
    };
    let prev_cumulative = prev.map(|p| p.cumulative_return).unwrap_or(0.0);
    let cumulative_return = (1.0 + prev_cumulative) * (1.0 + period_return) - 1.0;

    PortfolioState {
        date,
        cash,
        positions,
        holdings,
        total,
        period_return,
        cumulative_return,
    }
}
