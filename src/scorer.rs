//! Trend classification and strength scoring
//!
//! Reads an asset's critical point window together with the latest price and
//! emits a signed trend strength. A breakout through the window's middle point
//! is what produces new information; every other cycle leaves the previous
//! state in place.

use crate::config::{ScoringConfig, ScoringMode};
use crate::error::{TrendError, TrendResult};
use crate::extrema::{CriticalPointWindow, SwingPattern};
use crate::indicators::{drawdown_volatility, sigmoid};
use crate::{PricePoint, Regime, TrendState};

/// Trend strength scorer
#[derive(Debug, Clone)]
pub struct TrendScorer {
    config: ScoringConfig,
}

impl TrendScorer {
    pub fn new(config: ScoringConfig) -> TrendResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Drawdown volatility of a price history with the configured windows
    pub fn drift_volatility(&self, prices: &[f64]) -> TrendResult<f64> {
        drawdown_volatility(
            prices,
            self.config.drawdown_window,
            self.config.volatility_lookback,
        )
    }

    /// Score the latest point of `history` against `window`
    pub fn evaluate(
        &self,
        window: &CriticalPointWindow,
        history: &[PricePoint],
        previous: TrendState,
    ) -> TrendResult<TrendState> {
        let latest = history.last().ok_or(TrendError::InsufficientHistory {
            required: self.config.volatility_lookback,
            available: 0,
        })?;
        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let volatility = self.drift_volatility(&prices)?;
        self.score(window, latest, volatility, previous)
    }

    /// Classify the trend and compute its strength
    ///
    /// Returns `previous` unchanged when price has not broken through the
    /// window's middle point. A window with no swing pattern yields
    /// `Regime::None` with the previous strength. An up trend needs a higher
    /// low before the breakout and a down trend a lower high; a breakout
    /// against that structure resets strength to zero.
    pub fn score(
        &self,
        window: &CriticalPointWindow,
        latest: &PricePoint,
        drift_volatility: f64,
        previous: TrendState,
    ) -> TrendResult<TrendState> {
        let [p0, p1, p2] = window.prices();
        if p1 == p2 {
            return Err(TrendError::DegenerateSignal("swing range p1 - p2 is zero"));
        }
        if p1 == p0 {
            return Err(TrendError::DegenerateSignal("swing range p1 - p0 is zero"));
        }
        if !(drift_volatility > 0.0 && drift_volatility.is_finite()) {
            return Err(TrendError::DegenerateSignal(
                "drawdown volatility is zero or undefined",
            ));
        }

        let Some(pattern) = window.pattern() else {
            return Ok(TrendState::new(Regime::None, previous.strength));
        };

        match self.config.mode {
            ScoringMode::Sigmoid => Ok(self.score_sigmoid(window, pattern, latest, previous)),
            ScoringMode::RateOfChange => {
                score_rate_of_change(window, pattern, latest, drift_volatility, previous)
            }
        }
    }

    fn score_sigmoid(
        &self,
        window: &CriticalPointWindow,
        pattern: SwingPattern,
        latest: &PricePoint,
        previous: TrendState,
    ) -> TrendState {
        let [p0, p1, p2] = window.prices();
        // Move from the older extremum to the newer, over the pullback to it
        let ratio = (p2 - p0) / (p1 - p2);
        let slope = self.config.sigmoid_slope;

        match pattern {
            // Higher low, then a break above the high
            SwingPattern::Ascending if latest.price > p1 => {
                if p2 > p0 {
                    TrendState::new(Regime::Up, sigmoid(ratio, slope))
                } else {
                    TrendState::broken()
                }
            }
            // Lower high, then a break below the low
            SwingPattern::Descending if latest.price < p1 => {
                if p2 < p0 {
                    TrendState::new(Regime::Down, sigmoid(-ratio, slope))
                } else {
                    TrendState::broken()
                }
            }
            _ => previous,
        }
    }
}

/// Breakout distance per elapsed day, normalised by drawdown volatility
fn score_rate_of_change(
    window: &CriticalPointWindow,
    pattern: SwingPattern,
    latest: &PricePoint,
    drift_volatility: f64,
    previous: TrendState,
) -> TrendResult<TrendState> {
    let pivot = window.middle();
    let regime = match pattern {
        SwingPattern::Ascending if latest.price > pivot.price => Regime::Up,
        SwingPattern::Descending if latest.price < pivot.price => Regime::Down,
        _ => return Ok(previous),
    };

    let days = (latest.timestamp - pivot.timestamp).num_days();
    if days <= 0 {
        return Err(TrendError::DegenerateSignal(
            "no whole day elapsed since the swing point",
        ));
    }

    let strength = (latest.price - pivot.price) / (drift_volatility * days as f64);
    Ok(TrendState::new(regime, strength))
}
