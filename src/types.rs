//! Core data types used across the trend recognition system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Validation errors for price point data
#[derive(Debug, Error)]
pub enum PricePointValidationError {
    #[error("price ({0}) must be finite")]
    NonFinitePrice(f64),

    #[error("price ({0}) must be positive")]
    NonPositivePrice(f64),

    #[error("timestamp {current} is not after previous timestamp {previous}")]
    NonIncreasingTimestamp {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// A single sampled price for one asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    /// Create a new price point with validation
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Result<Self, PricePointValidationError> {
        let point = Self { timestamp, price };
        point.validate()?;
        Ok(point)
    }

    /// Create a price point without validation (for trusted sources or when validation is done separately)
    pub fn new_unchecked(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }

    pub fn validate(&self) -> Result<(), PricePointValidationError> {
        if !self.price.is_finite() {
            return Err(PricePointValidationError::NonFinitePrice(self.price));
        }
        if self.price <= 0.0 {
            return Err(PricePointValidationError::NonPositivePrice(self.price));
        }
        Ok(())
    }
}

/// Check that a series is ordered by strictly increasing timestamps
pub fn validate_series(series: &[PricePoint]) -> Result<(), PricePointValidationError> {
    for point in series {
        point.validate()?;
    }
    for pair in series.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(PricePointValidationError::NonIncreasingTimestamp {
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Asset identifier; serializes as a plain string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Arc<str>);

impl AssetId {
    pub fn new(s: impl AsRef<str>) -> Self {
        AssetId(Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        AssetId::new(s)
    }
}

/// Kind of local extremum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremumKind {
    Maximum,
    Minimum,
}

impl ExtremumKind {
    pub fn opposite(self) -> Self {
        match self {
            ExtremumKind::Maximum => ExtremumKind::Minimum,
            ExtremumKind::Minimum => ExtremumKind::Maximum,
        }
    }
}

/// A price point confirmed as a local maximum or minimum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: ExtremumKind,
}

impl CriticalPoint {
    pub fn new(point: PricePoint, kind: ExtremumKind) -> Self {
        Self {
            timestamp: point.timestamp,
            price: point.price,
            kind,
        }
    }
}

/// Trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Regime {
    Up,
    Down,
    #[default]
    None,
}

/// Trend direction and signed strength for one asset
///
/// Recomputed every evaluation cycle; the engine keeps the last emitted value
/// so that cycles carrying no new information leave it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendState {
    pub regime: Regime,
    pub strength: f64,
}

impl TrendState {
    pub fn new(regime: Regime, strength: f64) -> Self {
        Self { regime, strength }
    }

    /// Trend invalidated by a move against the retained swing structure
    pub fn broken() -> Self {
        Self {
            regime: Regime::None,
            strength: 0.0,
        }
    }

    pub fn is_trending(&self) -> bool {
        self.regime != Regime::None
    }
}
