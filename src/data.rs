//! Data loading and management
//!
//! Price history is pulled through the [`PriceSource`] trait once per
//! evaluation cycle. CSV files on disk and in-memory series are provided.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::DataConfig;
use crate::types::validate_series;
use crate::{AssetId, PricePoint};

/// Header names accepted for the timestamp column
const DATETIME_COLUMNS: &[&str] = &["datetime", "date", "timestamp"];

/// Historical price provider
pub trait PriceSource {
    /// Most recent `lookback` points per asset, oldest first
    ///
    /// Assets without usable data are omitted; a shorter series is returned
    /// when that is all there is.
    fn history(
        &self,
        assets: &[AssetId],
        lookback: usize,
    ) -> Result<HashMap<AssetId, Vec<PricePoint>>>;
}

fn tail(series: &[PricePoint], lookback: usize) -> &[PricePoint] {
    &series[series.len().saturating_sub(lookback)..]
}

// =============================================================================
// CSV Data Loading
// =============================================================================

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .with_context(|| format!("Failed to parse datetime: {}", value))
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

/// Load one price series from a CSV file
///
/// The file needs a header row with a `datetime` (or `date`/`timestamp`)
/// column and `price_column`. Other columns are ignored, so OHLCV exports
/// load as-is.
pub fn load_csv(path: impl AsRef<Path>, price_column: &str) -> Result<Vec<PricePoint>> {
    let mut reader = csv::Reader::from_path(path.as_ref()).context("Failed to open CSV file")?;

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let datetime_idx = find_column(&headers, DATETIME_COLUMNS).context("Missing datetime column")?;
    let price_idx = find_column(&headers, &[price_column])
        .with_context(|| format!("Missing {} column", price_column))?;

    let mut points = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let timestamp = parse_datetime(record.get(datetime_idx).unwrap_or_default())?;
        let price: f64 = record
            .get(price_idx)
            .unwrap_or_default()
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {} in row {}", price_column, row_idx + 1))?;

        let point = PricePoint::new(timestamp, price)
            .with_context(|| format!("Invalid price in row {}", row_idx + 1))?;
        points.push(point);
    }

    validate_series(&points).context("Price series out of order")?;

    Ok(points)
}

/// One `{ASSET}.csv` file per asset in a directory
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    data_dir: PathBuf,
    price_column: String,
}

impl CsvPriceSource {
    pub fn new(data_dir: impl Into<PathBuf>, price_column: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            price_column: price_column.into(),
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.data_dir.clone(), config.price_column.clone())
    }

    pub fn path_for(&self, asset: &AssetId) -> PathBuf {
        self.data_dir.join(format!("{}.csv", asset.as_str()))
    }
}

impl PriceSource for CsvPriceSource {
    fn history(
        &self,
        assets: &[AssetId],
        lookback: usize,
    ) -> Result<HashMap<AssetId, Vec<PricePoint>>> {
        let mut data = HashMap::new();

        for asset in assets {
            let path = self.path_for(asset);

            if !path.exists() {
                warn!("Data file not found: {}", path.display());
                continue;
            }

            let series = match load_csv(&path, &self.price_column) {
                Ok(series) => series,
                Err(e) => {
                    warn!(
                        asset = %asset,
                        error = %format!("{:#}", e),
                        "Skipping unreadable data file"
                    );
                    continue;
                }
            };

            debug!(asset = %asset, points = series.len(), "Loaded price history");
            data.insert(asset.clone(), tail(&series, lookback).to_vec());
        }

        if !assets.is_empty() && data.is_empty() {
            anyhow::bail!("No data loaded for any asset in {}", self.data_dir.display());
        }

        Ok(data)
    }
}

/// Price series held in memory, for hosts that already own the data
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<AssetId, Vec<PricePoint>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace an asset's series after checking its ordering
    pub fn insert(&mut self, asset: AssetId, series: Vec<PricePoint>) -> Result<()> {
        validate_series(&series).with_context(|| format!("Invalid series for {}", asset))?;
        self.series.insert(asset, series);
        Ok(())
    }

    /// Append the next sample of an asset
    pub fn push(&mut self, asset: &AssetId, point: PricePoint) -> Result<()> {
        point.validate()?;
        let series = self.series.entry(asset.clone()).or_default();
        if let Some(last) = series.last() {
            anyhow::ensure!(
                point.timestamp > last.timestamp,
                "{}: timestamp {} is not after {}",
                asset,
                point.timestamp,
                last.timestamp
            );
        }
        series.push(point);
        Ok(())
    }

    pub fn series(&self, asset: &AssetId) -> Option<&[PricePoint]> {
        self.series.get(asset).map(Vec::as_slice)
    }
}

impl PriceSource for InMemoryPriceSource {
    fn history(
        &self,
        assets: &[AssetId],
        lookback: usize,
    ) -> Result<HashMap<AssetId, Vec<PricePoint>>> {
        Ok(assets
            .iter()
            .filter_map(|asset| {
                self.series
                    .get(asset)
                    .map(|series| (asset.clone(), tail(series, lookback).to_vec()))
            })
            .collect())
    }
}
