//! Collaborator traits
//!
//! The engine never touches the DOM, the speech synthesizer, or the audio
//! context directly. These traits are its only output seams; the embedding
//! application implements them over whatever platform facilities exist.
//! All three are called from the single logical thread the engine runs on.

use web_time::Duration;

use super::{UpdateMessage, lang::Utterance};

/// Speech synthesis seam
pub trait Narrator {
    /// Starts synthesizing one utterance
    ///
    /// Returns `false` when no speech engine is available, in which case
    /// the engine treats the utterance as having completed instantly.
    /// When `true` is returned, the embedder must call
    /// [`Game::narration_finished`](crate::game::Game::narration_finished)
    /// exactly once when the utterance ends, whether it succeeded or was
    /// cut off; the coordinator's sequencing stalls otherwise.
    fn speak(&self, utterance: &Utterance) -> bool;
}

/// Tone generation seam, fire-and-forget
pub trait Chime {
    /// Plays a short sine cue
    fn play_tone(&self, frequency_hz: f32, duration: Duration);
}

/// Rendering seam
///
/// Receives incremental view updates, including the accessibility live
/// status line. Raw keyboard and pointer events flow back through
/// [`Game::receive_input`](crate::game::Game::receive_input).
pub trait Surface {
    /// Applies one view update
    fn render(&self, message: &UpdateMessage);
}
