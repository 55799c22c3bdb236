//! Core domain types and logic.

pub mod price;
pub mod indicator;
pub mod moving_average;
pub mod signal;
pub mod portfolio;
pub mod timeline;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
