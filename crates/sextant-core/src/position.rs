//! Heuristic semantic positioning.
//!
//! A component's [`SemanticPosition`] is derived from the set of
//! [`Signal`]s detected in its source. Each signal contributes fixed
//! per-axis deltas taken from [`SIGNAL_DELTAS`]; contributions are summed
//! from the zero vector, an optional platform bias is added, and the result
//! is clamped to `[-1, 1]` per axis.
//!
//! | Signal | Axis | Δ |
//! |--------|------|---|
//! | scanline pattern | terminal_organic | −0.4 |
//! | terminal keywords | terminal_organic | −0.3 |
//! | organic / breathing keywords | terminal_organic | +0.4 |
//! | file longer than the large-file threshold | minimal_dense | +0.3 |
//! | file shorter than 60 lines | minimal_dense | −0.2 |
//! | cool token hits | cool_warm | −0.4 |
//! | warm token hits | cool_warm | +0.4 |
//! | animation keywords | static_animated | +0.3 |
//! | breathing pattern | static_animated | +0.4 |
//! | particle / canvas pattern | static_animated | +0.5 |

use serde::{Deserialize, Serialize};

use crate::models::{Axis, SemanticPosition};

/// Share of a platform's canonical position added to its components.
pub const PLATFORM_BIAS_WEIGHT: f64 = 0.2;

/// A positioning signal detected in a component's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ScanlinePattern,
    TerminalKeywords,
    OrganicKeywords,
    LargeFile,
    SmallFile,
    CoolTokens,
    WarmTokens,
    AnimationKeywords,
    BreathingPattern,
    ParticlePattern,
}

pub const SIGNAL_DELTAS: &[(Signal, Axis, f64)] = &[
    (Signal::ScanlinePattern, Axis::TerminalOrganic, -0.4),
    (Signal::TerminalKeywords, Axis::TerminalOrganic, -0.3),
    (Signal::OrganicKeywords, Axis::TerminalOrganic, 0.4),
    (Signal::LargeFile, Axis::MinimalDense, 0.3),
    (Signal::SmallFile, Axis::MinimalDense, -0.2),
    (Signal::CoolTokens, Axis::CoolWarm, -0.4),
    (Signal::WarmTokens, Axis::CoolWarm, 0.4),
    (Signal::AnimationKeywords, Axis::StaticAnimated, 0.3),
    (Signal::BreathingPattern, Axis::StaticAnimated, 0.4),
    (Signal::ParticlePattern, Axis::StaticAnimated, 0.5),
];

/// Deltas contributed by one signal.
pub fn deltas(signal: Signal) -> impl Iterator<Item = (Axis, f64)> {
    SIGNAL_DELTAS
        .iter()
        .filter(move |(s, _, _)| *s == signal)
        .map(|(_, axis, d)| (*axis, *d))
}

/// Sum the deltas of `signals` (each counted once) plus the weighted
/// platform bias, then clamp.
pub fn derive_position(signals: &[Signal], platform_bias: Option<&SemanticPosition>) -> SemanticPosition {
    let mut unique: Vec<Signal> = signals.to_vec();
    unique.sort();
    unique.dedup();

    let mut pos = SemanticPosition::default();
    for signal in unique {
        for (axis, d) in deltas(signal) {
            pos.set(axis, pos.get(axis) + d);
        }
    }
    if let Some(bias) = platform_bias {
        for axis in Axis::ALL {
            pos.set(axis, pos.get(axis) + bias.get(axis) * PLATFORM_BIAS_WEIGHT);
        }
    }
    pos.clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_signals_is_origin() {
        assert_eq!(derive_position(&[], None), SemanticPosition::default());
    }

    #[test]
    fn test_scanline_moves_terminal() {
        let p = derive_position(&[Signal::ScanlinePattern], None);
        assert!(close(p.terminal_organic, -0.4));
        assert!(close(p.static_animated, 0.0));
    }

    #[test]
    fn test_organic_keywords() {
        let p = derive_position(&[Signal::OrganicKeywords], None);
        assert!(close(p.terminal_organic, 0.4));
    }

    #[test]
    fn test_large_file_is_dense() {
        let p = derive_position(&[Signal::LargeFile], None);
        assert!(close(p.minimal_dense, 0.3));
    }

    #[test]
    fn test_cool_and_warm_cancel() {
        let p = derive_position(&[Signal::CoolTokens, Signal::WarmTokens], None);
        assert!(close(p.cool_warm, 0.0));
    }

    #[test]
    fn test_animation_signals_sum_and_clamp() {
        let p = derive_position(
            &[
                Signal::AnimationKeywords,
                Signal::BreathingPattern,
                Signal::ParticlePattern,
            ],
            None,
        );
        assert!(close(p.static_animated, 1.0));
    }

    #[test]
    fn test_duplicate_signals_count_once() {
        let p = derive_position(&[Signal::ScanlinePattern, Signal::ScanlinePattern], None);
        assert!(close(p.terminal_organic, -0.4));
    }

    #[test]
    fn test_platform_bias_is_weighted() {
        let bias = SemanticPosition::new(-1.0, 0.0, 0.5, 0.0);
        let p = derive_position(&[], Some(&bias));
        assert!(close(p.terminal_organic, -PLATFORM_BIAS_WEIGHT));
        assert!(close(p.cool_warm, 0.5 * PLATFORM_BIAS_WEIGHT));
    }

    #[test]
    fn test_every_signal_has_a_delta() {
        let all = [
            Signal::ScanlinePattern,
            Signal::TerminalKeywords,
            Signal::OrganicKeywords,
            Signal::LargeFile,
            Signal::SmallFile,
            Signal::CoolTokens,
            Signal::WarmTokens,
            Signal::AnimationKeywords,
            Signal::BreathingPattern,
            Signal::ParticlePattern,
        ];
        for s in all {
            assert!(deltas(s).next().is_some(), "{:?} has no delta", s);
        }
    }
}
