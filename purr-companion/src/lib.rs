//! # purr-companion: device integration for the purr affect engine
//!
//! Glue between the companion's sensors and renderer and the
//! device-agnostic `purr-core` engine.
//!
//! ```text
//!   sensors ──▶ hooks ──▶ mpsc ──▶ ┌──────────────┐ ──▶ ChannelPresenter ──▶ renderer
//!                                  │ runtime loop │
//!              interval tick ────▶ │ SharedEngine │
//!                                  └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: typed sensor events and their direct triggers
//! - `hooks`: edge detection and keyword spotting over raw readings
//! - `presenter`: presenter that forwards commands over a channel
//! - `runtime`: tokio driving loop and its handle
//! - `config`: `purr.toml` with runtime and sensor sections

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod events;
pub mod hooks;
pub mod presenter;
pub mod runtime;

pub use config::CompanionConfig;
pub use events::SensorEvent;
pub use presenter::ChannelPresenter;
pub use runtime::{CompanionRuntime, RuntimeHandle, RuntimeSummary, SharedEngine};
