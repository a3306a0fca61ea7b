//! Trend analysis error types
//!
//! Every variant is scoped to a single asset and a single cycle. Callers skip
//! the asset for the cycle and keep its last known state.

use thiserror::Error;

use crate::AssetId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrendError {
    #[error("insufficient history: need {required} points, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("insufficient critical points: need 3, found {found}")]
    InsufficientCriticalPoints { found: usize },

    #[error("critical point window {prices:?} is neither an ascending nor a descending swing")]
    InvalidWindowState { prices: [f64; 3] },

    #[error("degenerate signal: {0}")]
    DegenerateSignal(&'static str),

    #[error("asset {0} has no critical point window yet")]
    NotInitialized(AssetId),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type TrendResult<T> = Result<T, TrendError>;
