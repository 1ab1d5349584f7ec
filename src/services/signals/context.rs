//! Descriptive market context around a signal: trend, volume, level distance.
//!
//! None of this feeds the scores.

use crate::config::ContextConfig;
use crate::types::{IndicatorSnapshot, LevelDistance, Proximity, SrLevel, Trend, VolumeStatus};

/// Classify trend from price and the EMA stack.
///
/// EMA50 stands in for a missing EMA200. Without EMA50 there is no trend.
pub fn classify_trend(price: f64, snapshot: &IndicatorSnapshot) -> Trend {
    let Some(ema50) = snapshot.ema50 else {
        return Trend::Ranging;
    };
    let ema200 = snapshot.ema200.unwrap_or(ema50);

    if let Some(ema20) = snapshot.ema20 {
        if price > ema20 && ema20 > ema50 && ema50 >= ema200 {
            return Trend::StrongUp;
        }
        if price < ema20 && ema20 < ema50 && ema50 <= ema200 {
            return Trend::StrongDown;
        }
    }

    if price > ema50 {
        Trend::WeakUp
    } else if price < ema50 {
        Trend::WeakDown
    } else {
        Trend::Ranging
    }
}

pub fn volume_status(volume_ratio: Option<f64>, config: &ContextConfig) -> VolumeStatus {
    match volume_ratio {
        Some(r) if r > config.high_volume_status => VolumeStatus::High,
        Some(r) if r < config.low_volume_status => VolumeStatus::Low,
        _ => VolumeStatus::Normal,
    }
}

/// Distance from price to a level, in ATR units.
pub fn level_distance(
    level: &SrLevel,
    price: f64,
    atr: Option<f64>,
    config: &ContextConfig,
) -> Option<LevelDistance> {
    let atr = atr.filter(|a| *a > 0.0)?;
    let distance = (price - level.price).abs();
    let distance_atr = distance / atr;

    let proximity = if distance_atr <= config.very_close_atr {
        Proximity::VeryClose
    } else if distance_atr <= config.close_atr {
        Proximity::Close
    } else {
        Proximity::Far
    };

    Some(LevelDistance {
        level: level.price,
        distance,
        distance_atr,
        proximity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LevelRole, PivotKind};

    fn snapshot(ema20: Option<f64>, ema50: Option<f64>, ema200: Option<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema20,
            ema50,
            ema200,
            ..IndicatorSnapshot::default()
        }
    }

    #[test]
    fn test_trend_strong_up() {
        let s = snapshot(Some(105.0), Some(100.0), Some(90.0));
        assert_eq!(classify_trend(110.0, &s), Trend::StrongUp);
    }

    #[test]
    fn test_trend_weak_up_when_stack_broken() {
        let s = snapshot(Some(95.0), Some(100.0), Some(90.0));
        assert_eq!(classify_trend(110.0, &s), Trend::WeakUp);
    }

    #[test]
    fn test_trend_strong_down() {
        let s = snapshot(Some(95.0), Some(100.0), Some(110.0));
        assert_eq!(classify_trend(90.0, &s), Trend::StrongDown);
    }

    #[test]
    fn test_trend_falls_back_to_ema50() {
        let s = snapshot(Some(105.0), Some(100.0), None);
        assert_eq!(classify_trend(110.0, &s), Trend::StrongUp);
    }

    #[test]
    fn test_trend_without_ema50_is_ranging() {
        let s = snapshot(Some(105.0), None, None);
        assert_eq!(classify_trend(110.0, &s), Trend::Ranging);
    }

    #[test]
    fn test_volume_status() {
        let config = ContextConfig::default();
        assert_eq!(volume_status(Some(2.0), &config), VolumeStatus::High);
        assert_eq!(volume_status(Some(1.0), &config), VolumeStatus::Normal);
        assert_eq!(volume_status(Some(0.5), &config), VolumeStatus::Low);
        assert_eq!(volume_status(None, &config), VolumeStatus::Normal);
    }

    #[test]
    fn test_level_distance_buckets() {
        let config = ContextConfig::default();
        let level = SrLevel {
            price: 100.0,
            role: LevelRole::Support,
            strength: 3,
            first_seen_index: 0,
            last_touched_index: 40,
            high_touches: 0,
            low_touches: 3,
            last_touch_kind: PivotKind::Low,
        };

        let d = level_distance(&level, 101.0, Some(4.0), &config).unwrap();
        assert_eq!(d.distance_atr, 0.25);
        assert_eq!(d.proximity, Proximity::VeryClose);

        let d = level_distance(&level, 103.0, Some(4.0), &config).unwrap();
        assert_eq!(d.proximity, Proximity::Close);

        let d = level_distance(&level, 110.0, Some(4.0), &config).unwrap();
        assert_eq!(d.proximity, Proximity::Far);

        assert!(level_distance(&level, 101.0, None, &config).is_none());
        assert!(level_distance(&level, 101.0, Some(0.0), &config).is_none());
    }
}
