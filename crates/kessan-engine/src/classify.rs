//! Ordered threshold classification.
//!
//! Each metric declares its bands from most favorable to least
//! favorable; the first matching cutoff wins, boundary values included.

/// Comparison direction for a banded metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Higher values are better; a band matches when `value >= cutoff`.
    HigherIsBetter,
    /// Lower values are better (e.g. D/E ratio); a band matches when
    /// `value <= cutoff`.
    LowerIsBetter,
}

/// Classify `value` against `(label, cutoff)` bands ordered best to
/// worst. Bands whose cutoff is absent from the criteria document are
/// skipped. Returns `None` when no band has a configured cutoff at all,
/// which suppresses the metric; otherwise falls through to
/// `default_label`.
pub fn classify(
    value: f64,
    direction: Direction,
    bands: &[(&'static str, Option<f64>)],
    default_label: &'static str,
) -> Option<&'static str> {
    let mut any_configured = false;
    for (label, cutoff) in bands {
        let Some(cutoff) = cutoff else { continue };
        any_configured = true;
        let matched = match direction {
            Direction::HigherIsBetter => value >= *cutoff,
            Direction::LowerIsBetter => value <= *cutoff,
        };
        if matched {
            return Some(label);
        }
    }
    if any_configured {
        Some(default_label)
    } else {
        None
    }
}
