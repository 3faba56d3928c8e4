//! # Natural-Language Hint Parsing
//!
//! Turns short free-text descriptions of a functional relationship
//! ("quadratic in x2", "periodic in x1 with two peaks") into a structured
//! `FeatureRecipe` that governs design-matrix construction downstream.
//!
//! Parsing is a fixed, ordered list of keyword rules over a small scratch
//! state; later rules overwrite earlier ones. The ordering is part of the
//! observable contract: when several dimension markers co-occur, the last
//! one tested wins (x3 over x2 over x1). Degrees and harmonic counts are
//! capped so the model stays stable on tiny observation sets.

use serde::{Deserialize, Serialize};

/// A structured description of the feature expansion to perform, derived
/// from a text hint. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureRecipe {
    /// Use the raw input columns unchanged.
    Linear,
    /// Full polynomial expansion of all columns up to the given total degree.
    Polynomial { degree: usize },
    /// Fourier expansion of one selected input column (1-based index),
    /// appended to the raw columns.
    Periodic { dim: usize, harmonics: usize },
}

/// Scratch tag for the expansion family while the rules run.
#[derive(PartialEq)]
enum Kind {
    Linear,
    Polynomial,
    Periodic,
}

/// Parses a natural-language hint into a feature recipe.
///
/// Case-insensitive and infallible: unrecognized text yields the default
/// linear recipe. Each rule unconditionally overwrites the scratch state,
/// so co-occurring markers resolve to whichever rule runs last.
pub fn parse_hint(text: &str) -> FeatureRecipe {
    let s = text.to_lowercase();

    let mut kind = Kind::Linear;
    let mut degree: usize = 1;
    let mut dim: usize = 3;
    let mut harmonics: usize = 1;

    // Which x-dimension the hint refers to. Independent checks: the last
    // matching marker wins when several are present.
    if s.contains("x1") {
        dim = 1;
    }
    if s.contains("x2") {
        dim = 2;
    }
    if s.contains("x3") {
        dim = 3;
    }

    // Polynomial degree. The cubic check runs second and wins if both match.
    if s.contains("quadratic") || s.contains("polynomial") {
        kind = Kind::Polynomial;
        degree = 2;
    }
    if s.contains("cubic") {
        kind = Kind::Polynomial;
        degree = 3;
    }

    // Periodicity overrides any polynomial decision above.
    if ["periodic", "sinusoid", "oscillation", "wave"]
        .iter()
        .any(|w| s.contains(w))
    {
        kind = Kind::Periodic;
        harmonics = if s.contains("high") || s.contains("three peak") {
            3
        } else if s.contains("two") || s.contains("2 peak") {
            2
        } else {
            1
        };
    }

    // Vague "flat then rising" phrasing: allow curvature.
    if kind == Kind::Linear && s.contains("flat") && s.contains("then") {
        kind = Kind::Polynomial;
        degree = 2;
    }

    // Caps against runaway complexity.
    degree = degree.clamp(1, 3);
    harmonics = harmonics.clamp(1, 3);

    match kind {
        Kind::Linear => FeatureRecipe::Linear,
        Kind::Polynomial => FeatureRecipe::Polynomial { degree },
        Kind::Periodic => FeatureRecipe::Periodic { dim, harmonics },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_hint_with_dimension_marker() {
        assert_eq!(parse_hint("linear in x3"), FeatureRecipe::Linear);
    }

    #[test]
    fn quadratic_hint() {
        assert_eq!(
            parse_hint("quadratic in x2"),
            FeatureRecipe::Polynomial { degree: 2 }
        );
    }

    #[test]
    fn periodic_hint_with_three_peaks() {
        assert_eq!(
            parse_hint("periodic in x1 with three peaks"),
            FeatureRecipe::Periodic { dim: 1, harmonics: 3 }
        );
    }

    #[test]
    fn empty_hint_falls_back_to_default() {
        assert_eq!(parse_hint(""), FeatureRecipe::Linear);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(
            parse_hint("QUADRATIC in X2"),
            FeatureRecipe::Polynomial { degree: 2 }
        );
    }

    #[test]
    fn cubic_overrides_quadratic() {
        assert_eq!(
            parse_hint("quadratic, maybe even cubic"),
            FeatureRecipe::Polynomial { degree: 3 }
        );
    }

    #[test]
    fn periodic_overrides_polynomial() {
        assert_eq!(
            parse_hint("a quadratic-looking wave in x1"),
            FeatureRecipe::Periodic { dim: 1, harmonics: 1 }
        );
    }

    #[test]
    fn last_dimension_marker_wins_when_several_are_present() {
        // x2 is tested after x1, so it overwrites.
        assert_eq!(
            parse_hint("oscillation in x2, not x1"),
            FeatureRecipe::Periodic { dim: 2, harmonics: 1 }
        );
        // x3 is tested last and wins over both.
        assert_eq!(
            parse_hint("sinusoid in x1 or x3"),
            FeatureRecipe::Periodic { dim: 3, harmonics: 1 }
        );
    }

    #[test]
    fn two_peaks_selects_two_harmonics() {
        assert_eq!(
            parse_hint("periodic in x1 with two peaks"),
            FeatureRecipe::Periodic { dim: 1, harmonics: 2 }
        );
    }

    #[test]
    fn high_frequency_selects_three_harmonics() {
        assert_eq!(
            parse_hint("high-frequency wave in x2"),
            FeatureRecipe::Periodic { dim: 2, harmonics: 3 }
        );
    }

    #[test]
    fn flat_then_rising_allows_curvature() {
        assert_eq!(
            parse_hint("flat at first, then rising"),
            FeatureRecipe::Polynomial { degree: 2 }
        );
        // The fallback only fires when nothing else matched.
        assert_eq!(
            parse_hint("flat then a wave"),
            FeatureRecipe::Periodic { dim: 3, harmonics: 1 }
        );
    }

    #[test]
    fn unrelated_text_yields_default() {
        assert_eq!(
            parse_hint("the output depends on the inputs somehow"),
            FeatureRecipe::Linear
        );
    }
}
