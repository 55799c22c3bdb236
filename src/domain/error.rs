//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("no price data for {instrument}")]
    EmptySeries { instrument: String },

    #[error("invalid windows: short={short}, long={long} (need 0 < short < long)")]
    InvalidWindow { short: usize, long: usize },

    #[error("insufficient data for {instrument}: expected {expected} dates, got {actual}")]
    InsufficientData {
        instrument: String,
        expected: usize,
        actual: usize,
    },

    #[error("dates for {instrument} are not strictly increasing at {date}")]
    UnorderedDates { instrument: String, date: NaiveDate },

    #[error("non-finite price for {instrument} on {date}")]
    InvalidPrice { instrument: String, date: NaiveDate },

    #[error("no instruments to backtest")]
    NoInstruments,

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Io(_) => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. }
            | SmacrossError::InvalidWindow { .. } => 2,
            SmacrossError::Data { .. } => 3,
            SmacrossError::EmptySeries { .. }
            | SmacrossError::InsufficientData { .. }
            | SmacrossError::UnorderedDates { .. }
            | SmacrossError::InvalidPrice { .. }
            | SmacrossError::NoInstruments => 5,
        };
        std::process::ExitCode::from(code)
    }
}
