//! Rule-table scoring and signal classification.
//!
//! Rules live in one ordered table. Each rule checks a condition and, when it
//! fires, adds its weight to one side and contributes a reason. Table order is
//! the order of `Signal::reasons`: all bull rules, then all bear rules.

use crate::config::{ScoringConfig, ScoringWeights};
use crate::types::{
    FlipDirection, FlipEvent, IndicatorSnapshot, LevelRole, MacdCrossover, Signal,
    SignalCategory, SrLevel,
};

/// Everything the scorer looks at for one candle.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub symbol: &'a str,
    pub timestamp: i64,
    pub snapshot: &'a IndicatorSnapshot,
    pub price: f64,
    /// Nearest levels with roles already assigned.
    pub levels: &'a [SrLevel],
    /// Flips confirmed at this candle.
    pub flips: &'a [FlipEvent],
}

impl ScoreInput<'_> {
    fn nearest(&self, role: LevelRole) -> Option<&SrLevel> {
        self.levels
            .iter()
            .filter(|l| l.role == role)
            .min_by(|a, b| (a.price - self.price).abs().total_cmp(&(b.price - self.price).abs()))
    }

    fn flip(&self, direction: FlipDirection) -> Option<&FlipEvent> {
        self.flips.iter().find(|f| f.direction() == direction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Bull,
    Bear,
}

/// One scoring rule. `check` returns the reason text when the rule fires.
struct Rule {
    side: Side,
    weight: fn(&ScoringWeights) -> u8,
    check: fn(&ScoreInput, &ScoringConfig) -> Option<String>,
}

fn in_band(value: f64, low: f64, high: f64, inclusive: bool) -> bool {
    if inclusive {
        value >= low && value <= high
    } else {
        value > low && value < high
    }
}

const RULES: &[Rule] = &[
    // Bull rules
    Rule {
        side: Side::Bull,
        weight: |w| w.price_above_ema,
        check: |input, _| {
            let ema50 = input.snapshot.ema50?;
            (input.price > ema50).then(|| format!("Price above EMA50 ({:.2})", ema50))
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.bullish_stack,
        check: |input, _| {
            let s = input.snapshot;
            let (e20, e50, e200) = (s.ema20?, s.ema50?, s.ema200?);
            (e20 > e50 && e50 > e200)
                .then(|| "Bullish EMA stack (EMA20 > EMA50 > EMA200)".to_string())
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.near_support,
        check: |input, config| {
            let support = input.nearest(LevelRole::Support)?;
            let distance = (input.price - support.price) / support.price;
            (0.0..=config.proximity_pct).contains(&distance).then(|| {
                format!(
                    "Near support at {:.2} ({:.2}% above)",
                    support.price,
                    distance * 100.0
                )
            })
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.rsi_bullish_band,
        check: |input, config| {
            let rsi = input.snapshot.rsi?;
            in_band(
                rsi,
                config.rsi_oversold,
                config.rsi_neutral,
                config.rsi_inclusive_bounds,
            )
            .then(|| format!("RSI in bullish band ({:.1})", rsi))
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.rsi_oversold,
        check: |input, config| {
            let rsi = input.snapshot.rsi?;
            (rsi < config.rsi_oversold).then(|| format!("RSI oversold ({:.1})", rsi))
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.macd_bullish_cross,
        check: |input, _| {
            (input.snapshot.macd_crossover? == MacdCrossover::Bullish)
                .then(|| "MACD bullish crossover".to_string())
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.high_volume,
        check: |input, config| {
            let ratio = input.snapshot.volume_ratio?;
            (ratio > config.high_volume_ratio)
                .then(|| format!("High volume ({:.1}x avg)", ratio))
        },
    },
    Rule {
        side: Side::Bull,
        weight: |w| w.bullish_flip,
        check: |input, _| {
            let flip = input.flip(FlipDirection::Bullish)?;
            Some(format!(
                "Bullish S/R flip at {:.2} (resistance became support)",
                flip.level_price
            ))
        },
    },
    // Bear rules
    Rule {
        side: Side::Bear,
        weight: |w| w.price_below_ema,
        check: |input, _| {
            let ema50 = input.snapshot.ema50?;
            (input.price < ema50).then(|| format!("Price below EMA50 ({:.2})", ema50))
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.bearish_stack,
        check: |input, _| {
            let s = input.snapshot;
            let (e20, e50, e200) = (s.ema20?, s.ema50?, s.ema200?);
            (e20 < e50 && e50 < e200)
                .then(|| "Bearish EMA stack (EMA20 < EMA50 < EMA200)".to_string())
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.near_resistance,
        check: |input, config| {
            let resistance = input.nearest(LevelRole::Resistance)?;
            let distance = (resistance.price - input.price) / resistance.price;
            (0.0..=config.proximity_pct).contains(&distance).then(|| {
                format!(
                    "Near resistance at {:.2} ({:.2}% below)",
                    resistance.price,
                    distance * 100.0
                )
            })
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.rsi_bearish_band,
        check: |input, config| {
            let rsi = input.snapshot.rsi?;
            in_band(
                rsi,
                config.rsi_neutral,
                config.rsi_overbought,
                config.rsi_inclusive_bounds,
            )
            .then(|| format!("RSI in bearish band ({:.1})", rsi))
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.rsi_overbought,
        check: |input, config| {
            let rsi = input.snapshot.rsi?;
            (rsi > config.rsi_overbought).then(|| format!("RSI overbought ({:.1})", rsi))
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.macd_bearish_cross,
        check: |input, _| {
            (input.snapshot.macd_crossover? == MacdCrossover::Bearish)
                .then(|| "MACD bearish crossover".to_string())
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.low_volume,
        check: |input, config| {
            let ratio = input.snapshot.volume_ratio?;
            (ratio < config.low_volume_ratio).then(|| format!("Low volume ({:.1}x avg)", ratio))
        },
    },
    Rule {
        side: Side::Bear,
        weight: |w| w.bearish_flip,
        check: |input, _| {
            let flip = input.flip(FlipDirection::Bearish)?;
            Some(format!(
                "Bearish S/R flip at {:.2} (support became resistance)",
                flip.level_price
            ))
        },
    },
];

/// Clamped bull/bear scores and fired reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scores {
    pub bull: u8,
    pub bear: u8,
    pub reasons: Vec<String>,
}

/// Run the rule table. Rules with absent inputs neither score nor give a reason.
pub fn evaluate_rules(input: &ScoreInput, config: &ScoringConfig) -> Scores {
    let mut bull: u32 = 0;
    let mut bear: u32 = 0;
    let mut reasons = Vec::new();

    for rule in RULES {
        if let Some(reason) = (rule.check)(input, config) {
            let weight = u32::from((rule.weight)(&config.weights));
            match rule.side {
                Side::Bull => bull += weight,
                Side::Bear => bear += weight,
            }
            reasons.push(reason);
        }
    }

    Scores {
        bull: bull.min(100) as u8,
        bear: bear.min(100) as u8,
        reasons,
    }
}

/// Category from the two clamped scores.
///
/// Evaluated as a cascade: strong tiers, then buy/sell, then weak, else hold.
pub fn classify(bull: u8, bear: u8) -> SignalCategory {
    let net = i16::from(bull) - i16::from(bear);
    let magnitude = bull.max(bear);

    if net >= 40 && magnitude >= 80 {
        SignalCategory::StrongBuy
    } else if net <= -40 && magnitude >= 80 {
        SignalCategory::StrongSell
    } else if net >= 20 && magnitude >= 60 {
        SignalCategory::Buy
    } else if net <= -20 && magnitude >= 60 {
        SignalCategory::Sell
    } else if net > 0 && magnitude >= 40 {
        SignalCategory::WeakBuy
    } else if net < 0 && magnitude >= 40 {
        SignalCategory::WeakSell
    } else {
        SignalCategory::Hold
    }
}

fn is_mixed(bull: u8, bear: u8, config: &ScoringConfig) -> bool {
    bull > config.mixed_threshold && bear > config.mixed_threshold
}

/// Confidence: the larger side, capped for HOLD and reduced on mixed evidence.
pub fn confidence(bull: u8, bear: u8, category: SignalCategory, config: &ScoringConfig) -> u8 {
    let mut confidence = bull.max(bear).min(100);
    if category == SignalCategory::Hold {
        confidence = confidence.min(config.hold_confidence_cap);
    }
    if is_mixed(bull, bear, config) {
        confidence = (f64::from(confidence) * config.mixed_penalty) as u8;
    }
    confidence
}

/// Cautions shown next to the reasons. They never change the scores.
pub fn warnings(input: &ScoreInput, bull: u8, bear: u8, config: &ScoringConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let snapshot = input.snapshot;

    if let Some(ratio) = snapshot.volume_ratio {
        if ratio < config.low_volume_ratio {
            warnings.push(format!("Low volume ({:.1}x avg) - weak conviction", ratio));
        }
    }
    if let Some(rsi) = snapshot.rsi {
        if rsi > config.rsi_overbought {
            warnings.push("RSI overbought - potential reversal".to_string());
        } else if rsi < config.rsi_oversold {
            warnings.push("RSI oversold - potential bounce".to_string());
        }
    }
    if is_mixed(bull, bear, config) {
        warnings.push("Mixed signals - reduced confidence".to_string());
    }

    warnings
}

/// Score one candle into a [`Signal`].
pub fn score(input: &ScoreInput, config: &ScoringConfig) -> Signal {
    let Scores { bull, bear, reasons } = evaluate_rules(input, config);
    let category = classify(bull, bear);

    Signal {
        symbol: input.symbol.to_string(),
        timestamp: input.timestamp,
        bull_score: bull,
        bear_score: bear,
        net_score: i16::from(bull) - i16::from(bear),
        category,
        confidence: confidence(bull, bear, category, config),
        reasons,
        warnings: warnings(input, bull, bear, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PivotKind;

    fn support(price: f64) -> SrLevel {
        SrLevel {
            price,
            role: LevelRole::Support,
            strength: 2,
            first_seen_index: 0,
            last_touched_index: 0,
            high_touches: 0,
            low_touches: 2,
            last_touch_kind: PivotKind::Low,
        }
    }

    fn resistance(price: f64) -> SrLevel {
        SrLevel {
            role: LevelRole::Resistance,
            last_touch_kind: PivotKind::High,
            ..support(price)
        }
    }

    fn bullish_flip(price: f64) -> FlipEvent {
        FlipEvent {
            level_price: price,
            from_role: LevelRole::Resistance,
            to_role: LevelRole::Support,
            detected_at_index: 0,
        }
    }

    fn input<'a>(
        snapshot: &'a IndicatorSnapshot,
        price: f64,
        levels: &'a [SrLevel],
        flips: &'a [FlipEvent],
    ) -> ScoreInput<'a> {
        ScoreInput {
            symbol: "BTCUSDT",
            timestamp: 1_700_000_000_000,
            snapshot,
            price,
            levels,
            flips,
        }
    }

    // =========================================================================
    // Rule Tests
    // =========================================================================

    #[test]
    fn test_empty_snapshot_scores_nothing() {
        let snapshot = IndicatorSnapshot::default();
        let signal = score(&input(&snapshot, 100.0, &[], &[]), &ScoringConfig::default());
        assert_eq!(signal.bull_score, 0);
        assert_eq!(signal.bear_score, 0);
        assert!(signal.reasons.is_empty());
        assert_eq!(signal.category, SignalCategory::Hold);
    }

    #[test]
    fn test_strong_buy_clamps_to_100() {
        let snapshot = IndicatorSnapshot {
            ema20: Some(98.0),
            ema50: Some(95.0),
            ema200: Some(90.0),
            rsi: Some(25.0),
            macd_crossover: Some(MacdCrossover::Bullish),
            volume_ratio: Some(1.5),
            ..IndicatorSnapshot::default()
        };
        let flips = [bullish_flip(99.5)];
        let signal = score(&input(&snapshot, 100.0, &[], &flips), &ScoringConfig::default());
        assert_eq!(signal.bull_score, 100);
        assert_eq!(signal.bear_score, 0);
        assert_eq!(signal.net_score, 100);
        assert_eq!(signal.category, SignalCategory::StrongBuy);
        assert_eq!(signal.reasons.len(), 6);
        assert!(signal.reasons[0].starts_with("Price above EMA50"));
        assert!(signal.reasons[5].starts_with("Bullish S/R flip"));
    }

    #[test]
    fn test_rsi_rules_are_exclusive() {
        let config = ScoringConfig::default();
        let oversold = IndicatorSnapshot {
            rsi: Some(25.0),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&oversold, 100.0, &[], &[]), &config);
        assert_eq!(scores.bull, 15);
        assert_eq!(scores.reasons, vec!["RSI oversold (25.0)".to_string()]);

        let band = IndicatorSnapshot {
            rsi: Some(40.0),
            ..IndicatorSnapshot::default()
        };
        assert_eq!(evaluate_rules(&input(&band, 100.0, &[], &[]), &config).bull, 10);
    }

    #[test]
    fn test_rsi_bear_rules_are_exclusive() {
        let config = ScoringConfig::default();
        let overbought = IndicatorSnapshot {
            rsi: Some(75.0),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&overbought, 100.0, &[], &[]), &config);
        assert_eq!((scores.bull, scores.bear), (0, 15));
        assert_eq!(scores.reasons, vec!["RSI overbought (75.0)".to_string()]);

        let at_70 = IndicatorSnapshot {
            rsi: Some(70.0),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&at_70, 100.0, &[], &[]), &config);
        assert_eq!((scores.bull, scores.bear), (0, 10));
        assert_eq!(scores.reasons, vec!["RSI in bearish band (70.0)".to_string()]);
    }

    #[test]
    fn test_macd_bearish_crossover() {
        let snapshot = IndicatorSnapshot {
            macd_crossover: Some(MacdCrossover::Bearish),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&snapshot, 100.0, &[], &[]), &ScoringConfig::default());
        assert_eq!((scores.bull, scores.bear), (0, 15));
        assert_eq!(scores.reasons, vec!["MACD bearish crossover".to_string()]);
    }

    #[test]
    fn test_strong_sell_clamps_to_100() {
        let snapshot = IndicatorSnapshot {
            ema20: Some(103.0),
            ema50: Some(105.0),
            ema200: Some(110.0),
            rsi: Some(75.0),
            macd_crossover: Some(MacdCrossover::Bearish),
            volume_ratio: Some(0.5),
            ..IndicatorSnapshot::default()
        };
        let levels = [resistance(101.0)];
        let flips = [FlipEvent {
            level_price: 100.5,
            from_role: LevelRole::Support,
            to_role: LevelRole::Resistance,
            detected_at_index: 0,
        }];
        let signal = score(
            &input(&snapshot, 100.0, &levels, &flips),
            &ScoringConfig::default(),
        );
        assert_eq!(signal.bull_score, 0);
        assert_eq!(signal.bear_score, 100);
        assert_eq!(signal.net_score, -100);
        assert_eq!(signal.category, SignalCategory::StrongSell);
        assert_eq!(signal.reasons.len(), 7);
        assert!(signal.reasons[0].starts_with("Price below EMA50"));
        assert!(signal.reasons[6].starts_with("Bearish S/R flip"));
    }

    #[test]
    fn test_rsi_boundaries_inclusive_by_default() {
        let config = ScoringConfig::default();
        let at_30 = IndicatorSnapshot {
            rsi: Some(30.0),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&at_30, 100.0, &[], &[]), &config);
        assert_eq!((scores.bull, scores.bear), (10, 0));

        let at_50 = IndicatorSnapshot {
            rsi: Some(50.0),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&at_50, 100.0, &[], &[]), &config);
        assert_eq!((scores.bull, scores.bear), (10, 10));
    }

    #[test]
    fn test_rsi_boundaries_exclusive() {
        let config = ScoringConfig {
            rsi_inclusive_bounds: false,
            ..ScoringConfig::default()
        };
        let at_50 = IndicatorSnapshot {
            rsi: Some(50.0),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&at_50, 100.0, &[], &[]), &config);
        assert_eq!((scores.bull, scores.bear), (0, 0));
    }

    #[test]
    fn test_support_proximity() {
        let config = ScoringConfig::default();
        let snapshot = IndicatorSnapshot::default();
        let near = [support(99.0)];
        let scores = evaluate_rules(&input(&snapshot, 100.0, &near, &[]), &config);
        assert_eq!(scores.bull, 15);

        let far = [support(97.0)];
        let scores = evaluate_rules(&input(&snapshot, 100.0, &far, &[]), &config);
        assert_eq!(scores.bull, 0);
    }

    #[test]
    fn test_resistance_proximity() {
        let snapshot = IndicatorSnapshot::default();
        let levels = [resistance(101.0), support(90.0)];
        let scores = evaluate_rules(
            &input(&snapshot, 100.0, &levels, &[]),
            &ScoringConfig::default(),
        );
        assert_eq!((scores.bull, scores.bear), (0, 15));
        assert!(scores.reasons[0].starts_with("Near resistance at 101.00"));
    }

    #[test]
    fn test_low_volume_bear_weight() {
        let snapshot = IndicatorSnapshot {
            volume_ratio: Some(0.5),
            ..IndicatorSnapshot::default()
        };
        let scores = evaluate_rules(&input(&snapshot, 100.0, &[], &[]), &ScoringConfig::default());
        assert_eq!(scores.bear, 5);
    }

    #[test]
    fn test_scores_are_additive() {
        let config = ScoringConfig::default();
        let mut snapshot = IndicatorSnapshot::default();
        let mut last = 0;
        let steps: [fn(&mut IndicatorSnapshot); 5] = [
            |s: &mut IndicatorSnapshot| s.ema50 = Some(95.0),
            |s: &mut IndicatorSnapshot| {
                s.ema20 = Some(97.0);
                s.ema200 = Some(90.0);
            },
            |s: &mut IndicatorSnapshot| s.rsi = Some(45.0),
            |s: &mut IndicatorSnapshot| s.macd_crossover = Some(MacdCrossover::Bullish),
            |s: &mut IndicatorSnapshot| s.volume_ratio = Some(2.0),
        ];
        for step in steps {
            step(&mut snapshot);
            let bull = evaluate_rules(&input(&snapshot, 100.0, &[], &[]), &config).bull;
            assert!(bull >= last);
            assert!(bull <= 100);
            last = bull;
        }
        assert_eq!(last, 70);
    }

    #[test]
    fn test_reason_order_is_stable() {
        let snapshot = IndicatorSnapshot {
            ema20: Some(90.0),
            ema50: Some(95.0),
            ema200: Some(99.0),
            rsi: Some(50.0),
            volume_ratio: Some(0.5),
            ..IndicatorSnapshot::default()
        };
        let levels = [support(99.5), resistance(100.5)];
        let a = score(&input(&snapshot, 100.0, &levels, &[]), &ScoringConfig::default());
        let b = score(&input(&snapshot, 100.0, &levels, &[]), &ScoringConfig::default());
        assert_eq!(a, b);
        assert_eq!(
            a.reasons,
            vec![
                "Price above EMA50 (95.00)".to_string(),
                "Near support at 99.50 (0.50% above)".to_string(),
                "RSI in bullish band (50.0)".to_string(),
                "Bearish EMA stack (EMA20 < EMA50 < EMA200)".to_string(),
                "Near resistance at 100.50 (0.50% below)".to_string(),
                "RSI in bearish band (50.0)".to_string(),
                "Low volume (0.5x avg)".to_string(),
            ]
        );
    }

    // =========================================================================
    // Classification Tests
    // =========================================================================

    #[test]
    fn test_classification_cascade() {
        assert_eq!(classify(100, 0), SignalCategory::StrongBuy);
        assert_eq!(classify(80, 40), SignalCategory::StrongBuy);
        assert_eq!(classify(90, 60), SignalCategory::Buy);
        assert_eq!(classify(65, 45), SignalCategory::Buy);
        assert_eq!(classify(45, 30), SignalCategory::WeakBuy);
        assert_eq!(classify(35, 0), SignalCategory::Hold);
        assert_eq!(classify(30, 45), SignalCategory::WeakSell);
        assert_eq!(classify(10, 70), SignalCategory::Sell);
        assert_eq!(classify(0, 85), SignalCategory::StrongSell);
    }

    #[test]
    fn test_balanced_scores_hold() {
        assert_eq!(classify(50, 50), SignalCategory::Hold);
        assert_eq!(classify(100, 100), SignalCategory::Hold);
    }

    // =========================================================================
    // Confidence Tests
    // =========================================================================

    #[test]
    fn test_confidence_capped_for_hold() {
        let config = ScoringConfig::default();
        assert_eq!(confidence(15, 10, SignalCategory::Hold, &config), 15);
        // 50/50 is mixed: 39 * 0.8
        assert_eq!(confidence(50, 50, SignalCategory::Hold, &config), 31);
    }

    #[test]
    fn test_confidence_mixed_penalty() {
        let config = ScoringConfig::default();
        assert_eq!(confidence(80, 10, SignalCategory::StrongBuy, &config), 80);
        assert_eq!(confidence(80, 25, SignalCategory::Buy, &config), 64);
    }

    #[test]
    fn test_warnings() {
        let snapshot = IndicatorSnapshot {
            rsi: Some(75.0),
            volume_ratio: Some(0.5),
            ..IndicatorSnapshot::default()
        };
        let w = warnings(&input(&snapshot, 100.0, &[], &[]), 30, 30, &ScoringConfig::default());
        assert_eq!(w.len(), 3);
        assert!(w[0].starts_with("Low volume"));
        assert!(w[1].starts_with("RSI overbought"));
        assert!(w[2].starts_with("Mixed signals"));
    }
}
