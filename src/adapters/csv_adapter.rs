//! CSV file data adapter.
//!
//! One file per instrument, `<SYMBOL>.csv`, with a header row. Columns are
//! located by name: `date` plus `adj_close` when present, otherwise `close`.

use crate::domain::error::SmacrossError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

const PRICE_COLUMNS: [&str; 3] = ["adj_close", "adj close", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", instrument))
    }

    /// All rows of an instrument's file sorted by date, or `None` if there is
    /// no file for it.
    fn read_points(&self, instrument: &str) -> Result<Option<Vec<PricePoint>>, SmacrossError> {
        let path = self.csv_path(instrument);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| SmacrossError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SmacrossError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let (date_col, price_col) = locate_columns(headers).ok_or_else(|| SmacrossError::Data {
            reason: format!(
                "{} needs a date column and an adj_close or close column",
                path.display()
            ),
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SmacrossError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                SmacrossError::Data {
                    reason: format!("invalid date '{}' in {}: {}", date_str, path.display(), e),
                }
            })?;

            let price_str = record.get(price_col).unwrap_or_default().trim();
            if price_str.is_empty() {
                warn!("{}: no price on {}, row skipped", instrument, date);
                continue;
            }
            let price: f64 = price_str.parse().map_err(|e| SmacrossError::Data {
                reason: format!("invalid price '{}' on {}: {}", price_str, date, e),
            })?;

            points.push(PricePoint { date, price });
        }

        points.sort_by_key(|p| p.date);
        debug!("read {} rows from {}", points.len(), path.display());
        Ok(Some(points))
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Option<(usize, usize)> {
    let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let date_col = names.iter().position(|n| n == "date")?;
    let price_col = PRICE_COLUMNS
        .iter()
        .find_map(|wanted| names.iter().position(|n| n == wanted))?;
    Some((date_col, price_col))
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SmacrossError> {
        let points = self.read_points(instrument)?.ok_or_else(|| SmacrossError::Data {
            reason: format!("no data file for {}", instrument),
        })?;

        let in_range: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect();

        PriceSeries::new(instrument, in_range)
    }

    fn list_instruments(&self) -> Result<Vec<String>, SmacrossError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SmacrossError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SmacrossError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                instruments.push(symbol.to_string());
            }
        }

        instruments.sort();
        Ok(instruments)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError> {
        let points = match self.read_points(instrument)? {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(None),
        };
        let first = points[0].date;
        let last = points[points.len() - 1].date;
        Ok(Some((first, last, points.len())))
    }
}
