//! Price acquisition port trait.

use crate::domain::error::SmacrossError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Prices for `instrument` between `start_date` and `end_date` inclusive,
    /// ordered by date. Fails with `EmptySeries` when the range holds no data.
    fn fetch_prices(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SmacrossError>;

    fn list_instruments(&self) -> Result<Vec<String>, SmacrossError>;

    /// First date, last date and row count, or `None` if the source has
    /// nothing for `instrument`.
    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError>;
}
