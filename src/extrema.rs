//! Critical point detection and tracking
//!
//! Finds local price extrema and keeps, per asset, the three most recent
//! confirmed ones. After a one-off scan of history the window is advanced by a
//! single-lag rule: a turn in price is confirmed one sample after it happens,
//! from the sign of the change between the two latest samples.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{TrendError, TrendResult};
use crate::{AssetId, CriticalPoint, ExtremumKind, PricePoint};

/// Minimum history length accepted by [`ExtremaTracker::initialize`]
pub const MIN_HISTORY: usize = 5;

/// Number of critical points retained per asset
pub const WINDOW_SIZE: usize = 3;

/// Shape of a three-point window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingPattern {
    /// `p0 < p1 > p2`: the middle point is a confirmed high
    Ascending,
    /// `p0 > p1 < p2`: the middle point is a confirmed low
    Descending,
}

/// Find all strict local extrema, in chronological order
///
/// The first and last points have only one neighbour and never qualify. Equal
/// neighbours disqualify a point, so plateaus produce no critical points.
pub fn find_critical_points(history: &[PricePoint]) -> Vec<CriticalPoint> {
    history
        .iter()
        .tuple_windows()
        .filter_map(|(prev, current, next)| {
            if current.price > prev.price && current.price > next.price {
                Some(CriticalPoint::new(*current, ExtremumKind::Maximum))
            } else if current.price < prev.price && current.price < next.price {
                Some(CriticalPoint::new(*current, ExtremumKind::Minimum))
            } else {
                None
            }
        })
        .collect()
}

/// The three most recent critical points of one asset, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalPointWindow {
    points: [CriticalPoint; WINDOW_SIZE],
}

impl CriticalPointWindow {
    pub fn new(points: [CriticalPoint; WINDOW_SIZE]) -> Self {
        Self { points }
    }

    /// Build from the last three critical points of a scan
    pub fn from_recent(critical_points: &[CriticalPoint]) -> TrendResult<Self> {
        if critical_points.len() < WINDOW_SIZE {
            return Err(TrendError::InsufficientCriticalPoints {
                found: critical_points.len(),
            });
        }
        let tail = &critical_points[critical_points.len() - WINDOW_SIZE..];
        Ok(Self::new([tail[0], tail[1], tail[2]]))
    }

    pub fn points(&self) -> &[CriticalPoint; WINDOW_SIZE] {
        &self.points
    }

    pub fn oldest(&self) -> &CriticalPoint {
        &self.points[0]
    }

    pub fn middle(&self) -> &CriticalPoint {
        &self.points[1]
    }

    pub fn newest(&self) -> &CriticalPoint {
        &self.points[2]
    }

    pub fn prices(&self) -> [f64; WINDOW_SIZE] {
        [
            self.points[0].price,
            self.points[1].price,
            self.points[2].price,
        ]
    }

    pub fn pattern(&self) -> Option<SwingPattern> {
        let [p0, p1, p2] = self.prices();
        if p0 < p1 && p2 < p1 {
            Some(SwingPattern::Ascending)
        } else if p0 > p1 && p2 > p1 {
            Some(SwingPattern::Descending)
        } else {
            None
        }
    }

    /// Pattern of the window, or `InvalidWindowState` if it has none
    pub fn require_pattern(&self) -> TrendResult<SwingPattern> {
        self.pattern().ok_or(TrendError::InvalidWindowState {
            prices: self.prices(),
        })
    }

    /// Append a newest point, returning the evicted oldest one
    pub fn push(&mut self, point: CriticalPoint) -> CriticalPoint {
        let evicted = self.points[0];
        self.points.rotate_left(1);
        self.points[WINDOW_SIZE - 1] = point;
        evicted
    }
}

/// Per-asset critical point state store
#[derive(Debug, Default)]
pub struct ExtremaTracker {
    windows: HashMap<AssetId, CriticalPointWindow>,
}

impl ExtremaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an asset's window from a scan of its price history
    ///
    /// No-op for an asset that is already initialized; the existing window is
    /// returned untouched.
    pub fn initialize(
        &mut self,
        asset: &AssetId,
        history: &[PricePoint],
    ) -> TrendResult<&CriticalPointWindow> {
        if self.windows.contains_key(asset) {
            debug!(asset = %asset, "Critical points already initialized");
            return Ok(&self.windows[asset]);
        }

        if history.len() < MIN_HISTORY {
            return Err(TrendError::InsufficientHistory {
                required: MIN_HISTORY,
                available: history.len(),
            });
        }

        let critical_points = find_critical_points(history);
        let window = CriticalPointWindow::from_recent(&critical_points)?;
        // Plateaus can hide a turn and leave two same-kind points adjacent
        let pattern = window.require_pattern()?;

        info!(
            asset = %asset,
            found = critical_points.len(),
            pattern = ?pattern,
            prices = ?window.prices(),
            "Critical points initialized"
        );

        Ok(self.windows.entry(asset.clone()).or_insert(window))
    }

    /// Advance an asset's window with the latest two samples
    ///
    /// `previous` is confirmed as a new critical point when price turned
    /// against the direction implied by the window's newest point: down after
    /// a low has been retained (`Ascending`), up after a high (`Descending`).
    /// Samples not newer than the newest retained point are ignored.
    pub fn update(
        &mut self,
        asset: &AssetId,
        new: PricePoint,
        previous: PricePoint,
    ) -> TrendResult<Option<CriticalPoint>> {
        let window = self
            .windows
            .get_mut(asset)
            .ok_or_else(|| TrendError::NotInitialized(asset.clone()))?;

        let pattern = window.require_pattern()?;

        if previous.timestamp <= window.newest().timestamp {
            return Ok(None);
        }

        let kind = match pattern {
            SwingPattern::Ascending if previous.price > new.price => ExtremumKind::Maximum,
            SwingPattern::Descending if previous.price < new.price => ExtremumKind::Minimum,
            _ => return Ok(None),
        };

        let confirmed = CriticalPoint::new(previous, kind);
        let evicted = window.push(confirmed);

        debug!(
            asset = %asset,
            kind = ?kind,
            price = confirmed.price,
            evicted = evicted.price,
            "Critical point confirmed"
        );

        Ok(Some(confirmed))
    }

    pub fn window(&self, asset: &AssetId) -> Option<&CriticalPointWindow> {
        self.windows.get(asset)
    }

    pub fn is_initialized(&self, asset: &AssetId) -> bool {
        self.windows.contains_key(asset)
    }

    /// Drop an asset's window so the next `initialize` rescans history
    pub fn reset(&mut self, asset: &AssetId) -> Option<CriticalPointWindow> {
        self.windows.remove(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.windows.keys()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
