//! Support/resistance flip tracking with confirmation hysteresis.
//!
//! A role change on a level is first held as a [`PendingFlip`]. It becomes a
//! [`FlipEvent`] only after the new role has held for `confirm_distance`
//! candles; reverting earlier discards it. All state goes in and out through
//! arguments.

use super::levels::find_match;
use crate::config::LevelConfig;
use crate::types::{FlipEvent, PendingFlip, SrLevel};
use tracing::debug;

/// Compare previous and current levels and advance pending transitions.
///
/// `elapsed` is the number of candles since the previous call. Returns the
/// flips confirmed at `current_index` and the pending set for the next call.
pub fn track_flips(
    previous: &[SrLevel],
    current: &[SrLevel],
    pending: &[PendingFlip],
    elapsed: usize,
    current_index: usize,
    current_timestamp: i64,
    config: &LevelConfig,
) -> (Vec<FlipEvent>, Vec<PendingFlip>) {
    let tolerance = config.tolerance;
    let mut confirmed = Vec::new();
    let mut still_pending = Vec::new();
    // Each pending flip is advanced by at most one current level.
    let mut consumed = vec![false; pending.len()];

    for level in current {
        let nearby: Vec<usize> = (0..pending.len())
            .filter(|&i| level.matches(pending[i].level_price, tolerance))
            .collect();
        let waiting = nearby
            .iter()
            .copied()
            .filter(|&i| !consumed[i])
            .min_by(|&a, &b| {
                (pending[a].level_price - level.price)
                    .abs()
                    .total_cmp(&(pending[b].level_price - level.price).abs())
            });
        if waiting.is_none() && !nearby.is_empty() {
            continue;
        }
        if let Some(i) = waiting {
            consumed[i] = true;
        }

        let candidate = match waiting.map(|i| &pending[i]) {
            Some(p) if level.role == p.to_role => PendingFlip {
                level_price: level.price,
                candles_held: p.candles_held + elapsed,
                ..*p
            },
            Some(p) => {
                debug!(
                    "Flip at {:.4} reverted to {} before confirmation",
                    p.level_price,
                    level.role.label()
                );
                continue;
            }
            None => match find_match(previous, level.price, tolerance) {
                Some(prior) if prior.role != level.role => PendingFlip {
                    level_price: level.price,
                    from_role: prior.role,
                    to_role: level.role,
                    observed_at: current_timestamp,
                    candles_held: 0,
                },
                _ => continue,
            },
        };

        if candidate.candles_held >= config.confirm_distance {
            debug!(
                "Confirmed flip at {:.4}: {} -> {}",
                candidate.level_price,
                candidate.from_role.label(),
                candidate.to_role.label()
            );
            confirmed.push(FlipEvent {
                level_price: candidate.level_price,
                from_role: candidate.from_role,
                to_role: candidate.to_role,
                detected_at_index: current_index,
            });
        } else {
            still_pending.push(candidate);
        }
    }

    (confirmed, still_pending)
}
