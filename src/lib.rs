//! Swing Trend
//!
//! Trend recognition from price swing structure. Each asset keeps its three
//! most recent local extrema; a breakout through the middle one classifies the
//! trend as up or down, and its strength is scored from the swing geometry or
//! from the breakout rate normalised by drawdown volatility.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod extrema;
pub mod indicators;
pub mod logging;
pub mod scorer;
pub mod types;

pub use config::{Config, ScoringConfig, ScoringMode};
pub use data::{CsvPriceSource, InMemoryPriceSource, PriceSource};
pub use engine::{AssetOutcome, CycleReport, TrendEngine};
pub use error::{TrendError, TrendResult};
pub use extrema::{CriticalPointWindow, ExtremaTracker, SwingPattern};
pub use scorer::TrendScorer;
pub use types::*;
