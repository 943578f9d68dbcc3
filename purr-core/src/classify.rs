//! Valence × arousal classifiers.
//!
//! Two tables partition the affect plane:
//!
//! - the **coarse** table names the mood ([`AffectiveLabel`]) and is used
//!   for temperament and the current session mood;
//! - the **fine** table picks the exact display ([`Expression`]) for a
//!   fuzzed response.
//!
//! Boundaries are data, evaluated top to bottom. The coarse table has
//! gaps on its boundary lines; a point in a gap is `Neutral`.

use tracing::debug;

use crate::types::{AffectiveLabel, Expression};

// ---------------------------------------------------------------------------
// Interval data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Edge {
    Free,
    Open(f32),
    Closed(f32),
}

/// An interval on one axis.
#[derive(Debug, Clone, Copy)]
struct Span {
    lo: Edge,
    hi: Edge,
}

impl Span {
    const fn new(lo: Edge, hi: Edge) -> Self {
        Self { lo, hi }
    }

    fn contains(self, x: f32) -> bool {
        let above = match self.lo {
            Edge::Free => true,
            Edge::Open(b) => x > b,
            Edge::Closed(b) => x >= b,
        };
        let below = match self.hi {
            Edge::Free => true,
            Edge::Open(b) => x < b,
            Edge::Closed(b) => x <= b,
        };
        above && below
    }
}

use Edge::{Closed, Free, Open};

const fn gt(b: f32) -> Span {
    Span::new(Open(b), Free)
}
const fn lt(b: f32) -> Span {
    Span::new(Free, Open(b))
}
const fn le(b: f32) -> Span {
    Span::new(Free, Closed(b))
}
const fn between(lo: f32, hi: f32) -> Span {
    Span::new(Open(lo), Open(hi))
}
const fn between_incl_hi(lo: f32, hi: f32) -> Span {
    Span::new(Open(lo), Closed(hi))
}

// ---------------------------------------------------------------------------
// Coarse mood table
// ---------------------------------------------------------------------------

/// (valence span, arousal span, label), first match wins.
const COARSE_TABLE: [(Span, Span, AffectiveLabel); 13] = [
    (gt(3.0), gt(3.0), AffectiveLabel::Excited),
    (gt(3.0), between(-3.0, 3.0), AffectiveLabel::Happy),
    (gt(3.0), lt(-3.0), AffectiveLabel::Relaxed),
    (between(-2.0, 3.0), gt(8.0), AffectiveLabel::Surprised),
    (between(-2.0, 3.0), between(5.0, 8.0), AffectiveLabel::Energetic),
    (between(-2.0, 3.0), between(-3.0, 5.0), AffectiveLabel::Neutral),
    (between(-2.0, 3.0), lt(-3.0), AffectiveLabel::Tired),
    (between(-5.0, -2.0), gt(5.0), AffectiveLabel::Tense),
    (le(-5.0), gt(8.0), AffectiveLabel::Scared),
    (le(-5.0), between_incl_hi(6.0, 8.0), AffectiveLabel::Angry),
    (lt(-2.0), between_incl_hi(-3.0, 5.0), AffectiveLabel::Miserable),
    (lt(-2.0), between_incl_hi(-7.0, -3.0), AffectiveLabel::Sad),
    (lt(-2.0), le(-7.0), AffectiveLabel::Gloomy),
];

/// Name the mood at a point on the affect plane.
///
/// Points on boundary gaps, and NaN, classify as `Neutral`.
#[must_use]
pub fn classify_mood(valence: f32, arousal: f32) -> AffectiveLabel {
    COARSE_TABLE
        .iter()
        .find(|(v, a, _)| v.contains(valence) && a.contains(arousal))
        .map_or_else(
            || {
                debug!(valence, arousal, "affect point outside mood table, using Neutral");
                AffectiveLabel::Neutral
            },
            |(_, _, label)| *label,
        )
}

// ---------------------------------------------------------------------------
// Fine display table
// ---------------------------------------------------------------------------

/// Valence rows, top to bottom: V≥6, 3≤V<6, -2<V<3, -6<V≤-2, V≤-6.
const VALENCE_ROWS: [Span; 5] = [
    Span::new(Closed(6.0), Free),
    Span::new(Closed(3.0), Open(6.0)),
    Span::new(Open(-2.0), Open(3.0)),
    Span::new(Open(-6.0), Closed(-2.0)),
    Span::new(Free, Closed(-6.0)),
];

/// Arousal columns, left to right: A≥7, 3≤A<7, -3<A<3, -7<A≤-3, A≤-7.
const AROUSAL_COLUMNS: [Span; 5] = [
    Span::new(Closed(7.0), Free),
    Span::new(Closed(3.0), Open(7.0)),
    Span::new(Open(-3.0), Open(3.0)),
    Span::new(Open(-7.0), Closed(-3.0)),
    Span::new(Free, Closed(-7.0)),
];

const DISPLAY_GRID: [[Expression; 5]; 5] = {
    use Expression as E;
    [
        [E::Ecstatic, E::Excited, E::Happy, E::Content, E::HappySleepy],
        [E::Excited, E::Cheerful, E::Pleased, E::Relaxed, E::HappySleepy],
        [E::Surprised, E::Alert, E::Neutral, E::Calm, E::Sleepy],
        [E::Tense, E::Annoyed, E::Unhappy, E::Sad, E::SadSleepy],
        [E::Scared, E::Angry, E::Miserable, E::Gloomy, E::SadSleepy],
    ]
};

/// Pick the display for a (fuzzed) affect point.
///
/// The grid covers the whole plane, so only NaN falls back to `neutral`.
#[must_use]
pub fn classify_display(valence: f32, arousal: f32) -> Expression {
    let row = VALENCE_ROWS.iter().position(|s| s.contains(valence));
    let col = AROUSAL_COLUMNS.iter().position(|s| s.contains(arousal));
    match (row, col) {
        (Some(r), Some(c)) => DISPLAY_GRID[r][c],
        _ => {
            debug!(valence, arousal, "affect point outside display grid, using neutral");
            Expression::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarse_table_regions() {
        assert_eq!(classify_mood(10.0, 0.0), AffectiveLabel::Happy);
        assert_eq!(classify_mood(5.0, 5.0), AffectiveLabel::Excited);
        assert_eq!(classify_mood(5.0, -5.0), AffectiveLabel::Relaxed);
        assert_eq!(classify_mood(0.0, 9.0), AffectiveLabel::Surprised);
        assert_eq!(classify_mood(0.0, 6.0), AffectiveLabel::Energetic);
        assert_eq!(classify_mood(0.0, 0.0), AffectiveLabel::Neutral);
        assert_eq!(classify_mood(0.0, -5.0), AffectiveLabel::Tired);
        assert_eq!(classify_mood(-3.0, 7.0), AffectiveLabel::Tense);
        assert_eq!(classify_mood(-7.0, 9.0), AffectiveLabel::Scared);
        assert_eq!(classify_mood(-7.0, 7.0), AffectiveLabel::Angry);
        assert_eq!(classify_mood(-4.0, 0.0), AffectiveLabel::Miserable);
        assert_eq!(classify_mood(-4.0, -5.0), AffectiveLabel::Sad);
        assert_eq!(classify_mood(-4.0, -9.0), AffectiveLabel::Gloomy);
    }

    #[test]
    fn coarse_boundary_values_follow_the_table() {
        // V = -5 belongs to the Scared/Angry column, not Tense.
        assert_eq!(classify_mood(-5.0, 9.0), AffectiveLabel::Scared);
        assert_eq!(classify_mood(-5.0, 8.0), AffectiveLabel::Angry);
        // A = 5 is the top of Miserable.
        assert_eq!(classify_mood(-4.0, 5.0), AffectiveLabel::Miserable);
        // A = -7 is Gloomy, A = -3 is Sad.
        assert_eq!(classify_mood(-4.0, -7.0), AffectiveLabel::Gloomy);
        assert_eq!(classify_mood(-4.0, -3.0), AffectiveLabel::Sad);
    }

    #[test]
    fn coarse_gaps_default_to_neutral() {
        // Exactly on V = 3 and V = -2.
        assert_eq!(classify_mood(3.0, 9.0), AffectiveLabel::Neutral);
        assert_eq!(classify_mood(-2.0, -9.0), AffectiveLabel::Neutral);
        // V > 3 with A exactly ±3.
        assert_eq!(classify_mood(5.0, 3.0), AffectiveLabel::Neutral);
        assert_eq!(classify_mood(5.0, -3.0), AffectiveLabel::Neutral);
        // Mid valence at A = 8.
        assert_eq!(classify_mood(0.0, 8.0), AffectiveLabel::Neutral);
        // V ≤ -5 with 5 < A ≤ 6 is covered by no row.
        assert_eq!(classify_mood(-6.0, 5.5), AffectiveLabel::Neutral);
        assert_eq!(classify_mood(f32::NAN, 0.0), AffectiveLabel::Neutral);
    }

    #[test]
    fn coarse_classifier_never_yields_sleep() {
        for v in -20..=20 {
            for a in -20..=20 {
                let label = classify_mood(v as f32 * 0.5, a as f32 * 0.5);
                assert_ne!(label, AffectiveLabel::Sleep);
            }
        }
    }

    #[test]
    fn fine_grid_corners_and_centre() {
        assert_eq!(classify_display(10.0, 10.0), Expression::Ecstatic);
        assert_eq!(classify_display(10.0, -10.0), Expression::HappySleepy);
        assert_eq!(classify_display(-10.0, 10.0), Expression::Scared);
        assert_eq!(classify_display(-10.0, -10.0), Expression::SadSleepy);
        assert_eq!(classify_display(0.0, 0.0), Expression::Neutral);
    }

    #[test]
    fn fine_grid_boundaries_are_closed_on_the_outer_side() {
        assert_eq!(classify_display(6.0, 0.0), Expression::Happy);
        assert_eq!(classify_display(5.99, 0.0), Expression::Pleased);
        assert_eq!(classify_display(3.0, 3.0), Expression::Cheerful);
        assert_eq!(classify_display(-2.0, 0.0), Expression::Unhappy);
        assert_eq!(classify_display(0.0, -3.0), Expression::Calm);
        assert_eq!(classify_display(0.0, -7.0), Expression::Sleepy);
    }

    #[test]
    fn fine_grid_is_total_except_nan() {
        for v in -40..=40 {
            for a in -40..=40 {
                let (v, a) = (v as f32 * 0.25, a as f32 * 0.25);
                let row = VALENCE_ROWS.iter().filter(|s| s.contains(v)).count();
                let col = AROUSAL_COLUMNS.iter().filter(|s| s.contains(a)).count();
                assert_eq!((row, col), (1, 1), "({v}, {a})");
            }
        }
        assert_eq!(classify_display(f32::NAN, 5.0), Expression::Neutral);
    }

    #[test]
    fn fine_grid_uses_22_distinct_displays() {
        let mut seen: Vec<Expression> = DISPLAY_GRID.iter().flatten().copied().collect();
        seen.sort_by_key(|e| e.as_str());
        seen.dedup();
        assert_eq!(seen.len(), 22);
    }
}
