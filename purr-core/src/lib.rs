//! # purr Core Library
//!
//! Device-agnostic affect engine for an interactive companion.
//!
//! The engine decides, for every stimulus a sensor reports, what the
//! companion should show. It is built from five parts:
//!
//! - **Gauges**: four decaying needs (touch, rest, social, hunger)
//! - **Classifier**: valence × arousal grid → named affective state
//! - **Response table**: (event × mood) → valence/arousal/need deltas
//! - **Mood**: persistent temperament plus a drifting session mood
//! - **Arbiter**: cooldown, sleep and auto-reset rules for the display
//!
//! Everything is driven by [`EmotionEngine::tick`] and synchronous event
//! calls from a single owner. Rendering lives behind the [`Presenter`] trait.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod arbiter;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod gauge;
pub mod metrics;
pub mod mood;
pub mod persistence;
pub mod presentation;
pub mod response;
pub mod types;

pub use config::PurrConfig;
pub use engine::{EmotionEngine, EmotionalResponse, EventOutcome};
pub use error::PurrError;
pub use presentation::{CommandLog, PresentationCommand, Presenter};
pub use response::{Response, ResponseTable};
pub use types::*;
