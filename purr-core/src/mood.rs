//! Long-term temperament and session mood.
//!
//! The long-term baseline persists across restarts. Each session starts
//! from that baseline plus uniform jitter, then drifts: every handled event
//! adds a small fraction (`event_bleed`) of its fuzzed response. At shutdown
//! a larger fraction (`session_bleed`) of the session's net drift is folded
//! back into the baseline. The two fractions are independent.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::classify::classify_mood;
use crate::config::{MAX_NOISE_RANGE, MoodConfig};
use crate::persistence::StoredBaseline;
use crate::response::Response;
use crate::types::{Affect, AffectiveLabel};

/// Mood state for one engine.
#[derive(Debug, Clone)]
pub struct MoodEngine {
    config: MoodConfig,
    long_term: Affect,
    session: Affect,
    session_start: Affect,
    temperament: AffectiveLabel,
    current: AffectiveLabel,
    rng: StdRng,
}

impl MoodEngine {
    /// Mood at the configured defaults. Call [`MoodEngine::begin_session`]
    /// before use.
    #[must_use]
    pub fn new(config: &MoodConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let long_term = Affect::new(config.default_valence, config.default_arousal);
        let label = classify_mood(long_term.valence, long_term.arousal);
        Self {
            config: config.clone(),
            long_term,
            session: long_term,
            session_start: long_term,
            temperament: label,
            current: label,
            rng,
        }
    }

    fn jitter(&mut self, range: f32) -> f32 {
        // Unvalidated configs can still reach here through `new`.
        let range = if range.is_finite() { range.min(MAX_NOISE_RANGE) } else { 0.0 };
        if range > 0.0 {
            self.rng.gen_range(-range..=range)
        } else {
            0.0
        }
    }

    /// Start a session from a stored baseline (missing keys use defaults).
    pub fn begin_session(&mut self, stored: StoredBaseline) {
        self.long_term = stored.or_defaults(self.config.default_valence, self.config.default_arousal);
        self.temperament = classify_mood(self.long_term.valence, self.long_term.arousal);

        let jitter = self.config.session_jitter;
        let dv = self.jitter(jitter);
        let da = self.jitter(jitter);
        self.session = self.long_term.shifted(dv, da);
        self.session_start = self.session;
        self.current = classify_mood(self.session.valence, self.session.arousal);

        debug!(
            long_term = %self.long_term,
            session = %self.session,
            temperament = %self.temperament,
            mood = %self.current,
            "mood session started"
        );
    }

    /// Re-derive the current mood from the session point.
    pub fn reclassify(&mut self) -> AffectiveLabel {
        self.current = classify_mood(self.session.valence, self.session.arousal);
        self.current
    }

    /// Add ±`fuzz_range` uniform noise to a response's affect, clamped.
    pub fn fuzz(&mut self, response: &Response) -> Affect {
        let range = self.config.fuzz_range;
        let dv = self.jitter(range);
        let da = self.jitter(range);
        Affect::new(response.valence + dv, response.arousal + da)
    }

    /// Bleed `event_bleed` of a fuzzed response into the session mood.
    pub fn absorb(&mut self, fuzzed: Affect) -> AffectiveLabel {
        let k = self.config.event_bleed;
        self.session = self.session.shifted(fuzzed.valence * k, fuzzed.arousal * k);
        self.reclassify()
    }

    /// Fold `session_bleed` of the session's net drift into the long-term
    /// baseline and return it. Calling twice does not apply the drift twice.
    pub fn end_session(&mut self) -> Affect {
        let (dv, da) = self.session.delta_from(self.session_start);
        let k = self.config.session_bleed;
        self.long_term = self.long_term.shifted(dv * k, da * k);
        self.session_start = self.session;
        debug!(long_term = %self.long_term, "mood session folded into baseline");
        self.long_term
    }

    /// Persistent baseline.
    #[must_use]
    pub fn long_term(&self) -> Affect {
        self.long_term
    }

    /// Current session point.
    #[must_use]
    pub fn session(&self) -> Affect {
        self.session
    }

    /// Session point when the session began.
    #[must_use]
    pub fn session_start(&self) -> Affect {
        self.session_start
    }

    /// Label of the long-term baseline at session start.
    #[must_use]
    pub fn temperament(&self) -> AffectiveLabel {
        self.temperament
    }

    /// Label of the session point as of the last reclassify.
    #[must_use]
    pub fn current_mood(&self) -> AffectiveLabel {
        self.current
    }

    /// Move the session point directly (debug consoles, scripted scenes).
    pub fn set_session(&mut self, session: Affect) {
        self.session = Affect::new(session.valence, session.arousal);
        self.reclassify();
    }
}
