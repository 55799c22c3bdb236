//! Simple Moving Average with a partial-window warm-up.
//!
//! SMA(n)[i] = mean(P[max(0, i-n+1)..=i])
//! Warm-up: before n prices exist the mean covers however many are available
//! (minimum 1), so every date has a value. Those points carry `full = false`.
//!
//! O(n) sliding window sum. When the window holds one repeated price the mean
//! is that price exactly, so running-sum rounding never splits a tie.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries};
use crate::domain::price::PricePoint;

pub fn calculate_sma(points: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || points.is_empty() {
        return IndicatorSeries {
            period,
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(points.len());
    let mut window_sum: f64 = 0.0;
    // Length of the trailing run of identical prices.
    let mut equal_run: usize = 0;

    for (i, point) in points.iter().enumerate() {
        window_sum += point.price;
        if i >= period {
            window_sum -= points[i - period].price;
        }

        if i > 0 && points[i - 1].price == point.price {
            equal_run += 1;
        } else {
            equal_run = 1;
        }

        let count = (i + 1).min(period);
        let value = if equal_run >= count {
            point.price
        } else {
            window_sum / count as f64
        };

        values.push(IndicatorPoint {
            date: point.date,
            full: i + 1 >= period,
            value,
        });
    }

    IndicatorSeries { period, values }
}
