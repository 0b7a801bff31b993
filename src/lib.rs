//! # Puhevisa Quiz Engine
//!
//! This library provides the core logic for an accessibility-oriented
//! spoken quiz: multiple-choice questions grouped into themes, narrated
//! through a speech synthesizer, answered by keyboard or pointer against a
//! per-question countdown, with scores and question packs persisted in
//! browser-local storage by the embedding application.
//!
//! The engine is deliberately I/O-free. Rendering, speech, tone
//! generation, and storage sit behind the traits in [`surface`] and
//! [`store`]; time arrives as scheduled [`AlarmMessage`] deliveries and
//! narration-completion callbacks. See [`game::Game`] for the event
//! surface an embedder drives.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

use serde::{Deserialize, Serialize};

pub mod constants;

pub mod game;
pub mod input;
pub mod lang;
pub mod pack;
pub mod session;
pub mod store;
pub mod surface;
pub mod theme;
pub mod timer;

pub use game::{Game, SyncMessage, UpdateMessage};

/// Alarm messages for timed events across the engine
///
/// The engine never sleeps; whenever it needs the future it hands one of
/// these to the embedder's scheduler together with a delay, and acts when
/// the message comes back through
/// [`Game::receive_alarm`](game::Game::receive_alarm). Stale deliveries,
/// from a paused countdown or a replaced session, are recognized by their
/// stamps and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown tick alarms
    Timer(timer::AlarmMessage),
    /// Coordinator sequencing alarms (verdict, advance, grade, restart)
    Game(game::AlarmMessage),
}

impl AlarmMessage {
    /// Converts the alarm message to a JSON string for host schedulers
    /// that round-trip payloads as text
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never
    /// happen with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}
