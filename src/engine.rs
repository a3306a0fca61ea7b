//! Evaluation cycle driver
//!
//! Runs one cycle per trading period over every configured asset: fetch
//! history, advance the asset's critical point window, score it. Failures are
//! per asset; a skipped asset keeps its last known trend state while the rest
//! of the cycle proceeds.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::PriceSource;
use crate::error::{TrendError, TrendResult};
use crate::extrema::ExtremaTracker;
use crate::scorer::TrendScorer;
use crate::{AssetId, CriticalPoint, PricePoint, TrendState};

/// Result of one asset in one cycle
#[derive(Debug, Clone)]
pub struct AssetOutcome {
    pub asset: AssetId,
    /// Critical point confirmed by this cycle's update, if any
    pub confirmed: Option<CriticalPoint>,
    pub result: TrendResult<TrendState>,
}

impl AssetOutcome {
    pub fn is_scored(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-asset outcomes of one cycle, in configured asset order
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle: u64,
    pub outcomes: Vec<AssetOutcome>,
}

impl CycleReport {
    pub fn outcome(&self, asset: &AssetId) -> Option<&AssetOutcome> {
        self.outcomes.iter().find(|o| &o.asset == asset)
    }

    pub fn scored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_scored()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.scored()
    }
}

/// Multi-asset trend engine
#[derive(Debug)]
pub struct TrendEngine {
    assets: Vec<AssetId>,
    tracker: ExtremaTracker,
    scorer: TrendScorer,
    states: HashMap<AssetId, TrendState>,
    critical_lookback: usize,
    history_lookback: usize,
    parallel: bool,
    cycle: u64,
}

impl TrendEngine {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let scorer = TrendScorer::new(config.scoring.clone())?;

        Ok(Self {
            assets: config.assets(),
            tracker: ExtremaTracker::new(),
            scorer,
            states: HashMap::new(),
            critical_lookback: config.tracker.critical_lookback,
            history_lookback: config.history_lookback(),
            parallel: config.engine.parallel,
            cycle: 0,
        })
    }

    /// Run one evaluation cycle
    ///
    /// Only a failing price source aborts the cycle; every per-asset error is
    /// recorded in the report and leaves that asset's state untouched.
    pub fn run_cycle(&mut self, source: &dyn PriceSource) -> Result<CycleReport> {
        let histories = source
            .history(&self.assets, self.history_lookback)
            .context("Failed to fetch price history")?;
        self.cycle += 1;

        let mut advanced = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let history = histories.get(asset).map(Vec::as_slice).unwrap_or(&[]);
            let result = advance(&mut self.tracker, asset, history, self.critical_lookback);
            advanced.push((asset.clone(), result));
        }

        let tracker = &self.tracker;
        let scorer = &self.scorer;
        let states = &self.states;
        let evaluate = |(asset, step): &(AssetId, TrendResult<Option<CriticalPoint>>)| {
            let result = match step {
                Ok(_) => {
                    let history = histories.get(asset).map(Vec::as_slice).unwrap_or(&[]);
                    let previous = states.get(asset).copied().unwrap_or_default();
                    tracker
                        .window(asset)
                        .ok_or_else(|| TrendError::NotInitialized(asset.clone()))
                        .and_then(|window| scorer.evaluate(window, history, previous))
                }
                Err(e) => Err(e.clone()),
            };
            AssetOutcome {
                asset: asset.clone(),
                confirmed: step.as_ref().ok().copied().flatten(),
                result,
            }
        };

        let outcomes: Vec<AssetOutcome> = if self.parallel {
            advanced.par_iter().map(&evaluate).collect()
        } else {
            advanced.iter().map(&evaluate).collect()
        };

        for outcome in &outcomes {
            match &outcome.result {
                Ok(state) => {
                    debug!(
                        asset = %outcome.asset,
                        regime = ?state.regime,
                        strength = state.strength,
                        "Trend scored"
                    );
                    self.states.insert(outcome.asset.clone(), *state);
                }
                Err(e) => {
                    warn!(asset = %outcome.asset, error = %e, "Skipping asset this cycle");
                }
            }
        }

        let report = CycleReport {
            cycle: self.cycle,
            outcomes,
        };
        info!(
            cycle = report.cycle,
            scored = report.scored(),
            skipped = report.skipped(),
            "Cycle complete"
        );

        Ok(report)
    }

    /// Last known trend state of an asset
    pub fn state(&self, asset: &AssetId) -> Option<TrendState> {
        self.states.get(asset).copied()
    }

    pub fn states(&self) -> &HashMap<AssetId, TrendState> {
        &self.states
    }

    pub fn tracker(&self) -> &ExtremaTracker {
        &self.tracker
    }

    pub fn scorer(&self) -> &TrendScorer {
        &self.scorer
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Forget an asset's window and state; the next cycle rescans its history
    pub fn reset(&mut self, asset: &AssetId) {
        self.tracker.reset(asset);
        self.states.remove(asset);
    }
}

/// Initialize on first sight, otherwise feed the latest two samples
fn advance(
    tracker: &mut ExtremaTracker,
    asset: &AssetId,
    history: &[PricePoint],
    critical_lookback: usize,
) -> TrendResult<Option<CriticalPoint>> {
    if !tracker.is_initialized(asset) {
        let scan = &history[history.len().saturating_sub(critical_lookback)..];
        tracker.initialize(asset, scan)?;
        return Ok(None);
    }

    match history {
        [.., previous, new] => tracker.update(asset, *new, *previous),
        _ => Err(TrendError::InsufficientHistory {
            required: 2,
            available: history.len(),
        }),
    }
}
