//! Technical indicators
//!
//! Drawdown-based volatility and the saturating transform used to bound
//! trend strength.

use statrs::statistics::Statistics;
use ta::indicators::Maximum;
use ta::Next;

use crate::error::{TrendError, TrendResult};

/// Calculate rolling maximum
///
/// Undefined (`None`) until a full window of `period` values is available.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut max = match Maximum::new(period) {
        Ok(max) => max,
        Err(_) => return vec![None; values.len()],
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let current = max.next(value);
            if i + 1 < period {
                None
            } else {
                Some(current)
            }
        })
        .collect()
}

/// Calculate per-period drawdown from the rolling peak: `price / rolling_max - 1`
pub fn drawdowns(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_max(values, period)
        .into_iter()
        .zip(values)
        .map(|(peak, &value)| peak.map(|peak| value / peak - 1.0))
        .collect()
}

/// Calculate drawdown volatility
///
/// Sample standard deviation of the drawdown series computed over the last
/// `lookback` prices, with the peak taken over a rolling `window`. Periods
/// before the first full window carry no drawdown and are skipped.
pub fn drawdown_volatility(values: &[f64], window: usize, lookback: usize) -> TrendResult<f64> {
    if window == 0 || lookback == 0 {
        return Err(TrendError::InvalidParameter(format!(
            "drawdown window ({}) and lookback ({}) must be positive",
            window, lookback
        )));
    }

    if values.len() < lookback {
        return Err(TrendError::InsufficientHistory {
            required: lookback,
            available: values.len(),
        });
    }

    let recent = &values[values.len() - lookback..];
    let defined: Vec<f64> = drawdowns(recent, window).into_iter().flatten().collect();

    // Sample deviation needs two observations
    if defined.len() < 2 {
        return Err(TrendError::InsufficientHistory {
            required: window + 1,
            available: recent.len(),
        });
    }

    Ok(defined.iter().std_dev())
}

/// Largest magnitude `sigmoid` returns; keeps the open interval under f64 rounding.
pub const SIGMOID_LIMIT: f64 = 1.0 - f64::EPSILON;

/// Saturating transform mapping any real onto (-1, 1)
///
/// `2 / (1 + exp(-slope * x)) - 1`; odd, monotonic increasing for positive
/// `slope`, and flat in the tails so outsized ratios cannot dominate.
pub fn sigmoid(x: f64, slope: f64) -> f64 {
    let value = 2.0 / (1.0 + (-slope * x).exp()) - 1.0;
    value.clamp(-SIGMOID_LIMIT, SIGMOID_LIMIT)
}
