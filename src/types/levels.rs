use serde::{Deserialize, Serialize};

/// Which extreme a pivot marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PivotKind {
    High,
    Low,
}

/// A local price extremum confirmed by a symmetric neighbor window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotPoint {
    pub index: usize,
    pub price: f64,
    pub kind: PivotKind,
}

/// Role of a level relative to the evaluation price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelRole {
    Support,
    Resistance,
}

impl LevelRole {
    /// Role implied by the kind of pivot that touched a level.
    pub fn from_pivot(kind: PivotKind) -> Self {
        match kind {
            PivotKind::High => LevelRole::Resistance,
            PivotKind::Low => LevelRole::Support,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LevelRole::Support => "support",
            LevelRole::Resistance => "resistance",
        }
    }
}

/// A clustered support/resistance price zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrLevel {
    /// Running mean of member pivot prices.
    pub price: f64,
    /// Role at the time of evaluation, not at creation.
    pub role: LevelRole,
    /// Number of contributing pivots.
    pub strength: u32,
    pub first_seen_index: usize,
    pub last_touched_index: usize,
    pub high_touches: u32,
    pub low_touches: u32,
    /// Kind of the most recent pivot that joined this level.
    pub last_touch_kind: PivotKind,
}

impl SrLevel {
    /// Whether `price` lies within `tolerance` (a fraction) of this level.
    pub fn matches(&self, price: f64, tolerance: f64) -> bool {
        self.price > 0.0 && ((price - self.price).abs() / self.price) < tolerance
    }
}

/// Bullish or bearish flip, derived from the role transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipDirection {
    /// Resistance became support.
    Bullish,
    /// Support became resistance.
    Bearish,
}

/// A confirmed change of a level's role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipEvent {
    pub level_price: f64,
    pub from_role: LevelRole,
    pub to_role: LevelRole,
    pub detected_at_index: usize,
}

impl FlipEvent {
    pub fn direction(&self) -> FlipDirection {
        match self.to_role {
            LevelRole::Support => FlipDirection::Bullish,
            LevelRole::Resistance => FlipDirection::Bearish,
        }
    }
}

/// A role transition observed but not yet held long enough to report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFlip {
    pub level_price: f64,
    pub from_role: LevelRole,
    pub to_role: LevelRole,
    /// Timestamp of the candle on which the transition was first seen.
    pub observed_at: i64,
    /// Candles elapsed since the transition while holding the new role.
    pub candles_held: usize,
}

/// S/R history threaded by the caller between consecutive analyses of one symbol.
///
/// The engine never keeps this itself; `LevelState::default()` starts fresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelState {
    pub levels: Vec<SrLevel>,
    pub pending: Vec<PendingFlip>,
    /// Timestamp of the last candle seen by the previous call.
    pub last_timestamp: Option<i64>,
}

/// Output of one level detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDetection {
    /// Levels ordered by proximity to the current price, nearest first.
    pub levels: Vec<SrLevel>,
    /// Flips confirmed on this call.
    pub flips: Vec<FlipEvent>,
    /// State to pass into the next call.
    pub state: LevelState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64) -> SrLevel {
        SrLevel {
            price,
            role: LevelRole::Support,
            strength: 1,
            first_seen_index: 0,
            last_touched_index: 0,
            high_touches: 0,
            low_touches: 1,
            last_touch_kind: PivotKind::Low,
        }
    }

    #[test]
    fn test_level_matches_within_tolerance() {
        let l = level(100.0);
        assert!(l.matches(100.2, 0.003));
        assert!(!l.matches(100.3, 0.003));
    }

    #[test]
    fn test_flip_direction() {
        let flip = FlipEvent {
            level_price: 100.0,
            from_role: LevelRole::Resistance,
            to_role: LevelRole::Support,
            detected_at_index: 10,
        };
        assert_eq!(flip.direction(), FlipDirection::Bullish);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&LevelRole::Resistance).unwrap();
        assert_eq!(json, "\"RESISTANCE\"");
    }
}
