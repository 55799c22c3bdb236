//! Performance metrics and the reported summary.

use super::portfolio::{PortfolioHistory, PortfolioState};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Final value and cumulative return on the last date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub initial_capital: f64,
    pub final_value: f64,
    pub cumulative_return: f64,
}

impl Summary {
    pub fn from_history(history: &PortfolioHistory) -> Self {
        Summary {
            initial_capital: history.initial_capital,
            final_value: history.final_value(),
            cumulative_return: history.final_cumulative_return(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub buy_events: usize,
    pub sell_events: usize,
}

impl Metrics {
    pub fn compute(
        history: &PortfolioHistory,
        buy_events: usize,
        sell_events: usize,
        risk_free_rate: f64,
    ) -> Self {
        let states = &history.states;
        let initial_capital = history.initial_capital;
        let final_value = history.final_value();

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let years = states.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(states);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(states, daily_rf);

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            buy_events,
            sell_events,
        }
    }
}

fn compute_drawdown(states: &[PortfolioState]) -> (f64, i64) {
    if states.is_empty() {
        return (0.0, 0);
    }

    let mut peak = states[0].total;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for state in states {
        if state.total >= peak {
            peak = state.total;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - state.total) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

/// Sharpe and Sortino over the period returns, skipping the first date
/// (its return is zero by definition, not observed).
fn compute_risk_adjusted(states: &[PortfolioState], daily_rf: f64) -> (f64, f64) {
    if states.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = states[1..].iter().map(|s| s.period_return).collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sum: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sum / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

/// `£10234.00`, `-£12.50`
pub fn format_currency(value: f64, symbol: &str) -> String {
    if value < 0.0 {
        format!("-{}{:.2}", symbol, value.abs())
    } else {
        format!("{}{:.2}", symbol, value)
    }
}

/// `0.0234` -> `2.34%`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}
