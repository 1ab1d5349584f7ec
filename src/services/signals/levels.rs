//! Pivot detection and support/resistance clustering.

use super::flips::track_flips;
use crate::config::LevelConfig;
use crate::types::{
    Candle, LevelDetection, LevelRole, LevelState, PivotKind, PivotPoint, SrLevel,
};
use std::cmp::Ordering;
use tracing::debug;

/// Find swing highs and lows.
///
/// Index `i` is a HIGH when its high is strictly greater than every other high in
/// `[i - window, i + window]`, and a LOW symmetrically with lows. Indices closer
/// than `window` to either end lack neighbors and are never pivots.
pub fn find_pivots(candles: &[Candle], window: usize) -> Vec<PivotPoint> {
    let mut pivots = Vec::new();
    if window == 0 || candles.len() < 2 * window + 1 {
        return pivots;
    }

    for i in window..candles.len() - window {
        let neighbors = (i - window..=i + window).filter(|&j| j != i);

        let high = candles[i].high;
        if neighbors.clone().all(|j| candles[j].high < high) {
            pivots.push(PivotPoint {
                index: i,
                price: high,
                kind: PivotKind::High,
            });
        }

        let low = candles[i].low;
        if neighbors.clone().all(|j| candles[j].low > low) {
            pivots.push(PivotPoint {
                index: i,
                price: low,
                kind: PivotKind::Low,
            });
        }
    }

    pivots
}

/// Cluster pivots into levels.
///
/// Pivots are visited in ascending price order. Each one joins the closest
/// level whose price is within `tolerance` of it, otherwise it starts a new
/// level. A level's price is the running mean of its members. Roles are
/// provisional (from the latest touch) until [`assign_roles`] runs.
pub fn cluster_pivots(pivots: &[PivotPoint], tolerance: f64, min_strength: u32) -> Vec<SrLevel> {
    let mut sorted = pivots.to_vec();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.index.cmp(&b.index)));

    let mut levels: Vec<SrLevel> = Vec::new();
    for pivot in sorted {
        let closest = levels
            .iter_mut()
            .filter(|level| level.matches(pivot.price, tolerance))
            .min_by(|a, b| {
                (a.price - pivot.price)
                    .abs()
                    .total_cmp(&(b.price - pivot.price).abs())
            });

        match closest {
            Some(level) => {
                level.strength += 1;
                level.price += (pivot.price - level.price) / level.strength as f64;
                level.first_seen_index = level.first_seen_index.min(pivot.index);
                if pivot.index >= level.last_touched_index {
                    level.last_touched_index = pivot.index;
                    level.last_touch_kind = pivot.kind;
                }
                match pivot.kind {
                    PivotKind::High => level.high_touches += 1,
                    PivotKind::Low => level.low_touches += 1,
                }
            }
            None => levels.push(SrLevel {
                price: pivot.price,
                role: LevelRole::from_pivot(pivot.kind),
                strength: 1,
                first_seen_index: pivot.index,
                last_touched_index: pivot.index,
                high_touches: u32::from(pivot.kind == PivotKind::High),
                low_touches: u32::from(pivot.kind == PivotKind::Low),
                last_touch_kind: pivot.kind,
            }),
        }
    }

    levels.retain(|level| level.strength >= min_strength);
    levels
}

/// Role of `level` relative to `price`.
///
/// Above price is resistance, below is support. Inside the tolerance band the
/// role held at the previous evaluation wins; without one, the most recent
/// touching pivot decides.
pub fn classify_role(
    level: &SrLevel,
    price: f64,
    tolerance: f64,
    previous: Option<LevelRole>,
) -> LevelRole {
    if level.matches(price, tolerance) {
        return previous.unwrap_or_else(|| LevelRole::from_pivot(level.last_touch_kind));
    }
    if level.price > price {
        LevelRole::Resistance
    } else {
        LevelRole::Support
    }
}

/// Closest level in `candidates` within `tolerance` of `price`.
pub fn find_match<'a>(candidates: &'a [SrLevel], price: f64, tolerance: f64) -> Option<&'a SrLevel> {
    candidates
        .iter()
        .filter(|level| level.matches(price, tolerance))
        .min_by(|a, b| (a.price - price).abs().total_cmp(&(b.price - price).abs()))
}

/// Set every level's role for `price`, using `previous` for band tie-breaks.
pub fn assign_roles(levels: &mut [SrLevel], price: f64, tolerance: f64, previous: &[SrLevel]) {
    for level in levels.iter_mut() {
        let prior = find_match(previous, level.price, tolerance).map(|p| p.role);
        level.role = classify_role(level, price, tolerance, prior);
    }
}

fn by_proximity(price: f64) -> impl Fn(&SrLevel, &SrLevel) -> Ordering {
    move |a, b| {
        (a.price - price)
            .abs()
            .total_cmp(&(b.price - price).abs())
            .then(a.price.total_cmp(&b.price))
    }
}

/// Order levels nearest-first relative to `price`.
pub fn sort_by_proximity(levels: &mut [SrLevel], price: f64) {
    levels.sort_by(by_proximity(price));
}

/// Up to `k` nearest supports and up to `k` nearest resistances.
pub fn nearest_levels(levels: &[SrLevel], price: f64, k: usize) -> (Vec<SrLevel>, Vec<SrLevel>) {
    let pick = |role: LevelRole| {
        let mut side: Vec<SrLevel> = levels.iter().filter(|l| l.role == role).cloned().collect();
        side.sort_by(by_proximity(price));
        side.truncate(k);
        side
    };
    (pick(LevelRole::Support), pick(LevelRole::Resistance))
}

/// Detect levels at the last candle and advance the flip state.
///
/// `candles` must already be validated.
pub fn detect_levels(candles: &[Candle], previous: &LevelState, config: &LevelConfig) -> LevelDetection {
    let Some(last) = candles.last() else {
        return LevelDetection {
            levels: Vec::new(),
            flips: Vec::new(),
            state: previous.clone(),
        };
    };
    let price = last.close;
    let current_index = candles.len() - 1;

    let pivots = find_pivots(candles, config.pivot_window);
    let mut levels = cluster_pivots(&pivots, config.tolerance, config.min_strength);
    assign_roles(&mut levels, price, config.tolerance, &previous.levels);
    sort_by_proximity(&mut levels, price);

    // Candles that arrived since the previous call
    let elapsed = previous
        .last_timestamp
        .map(|ts| candles.iter().filter(|c| c.timestamp > ts).count())
        .unwrap_or(0);

    let (flips, pending) = track_flips(
        &previous.levels,
        &levels,
        &previous.pending,
        elapsed,
        current_index,
        last.timestamp,
        config,
    );

    debug!(
        "{} pivots -> {} levels at price {:.4} ({} new candles, {} flips, {} pending)",
        pivots.len(),
        levels.len(),
        price,
        elapsed,
        flips.len(),
        pending.len()
    );

    LevelDetection {
        state: LevelState {
            levels: levels.clone(),
            pending,
            last_timestamp: Some(last.timestamp),
        },
        levels,
        flips,
    }
}
