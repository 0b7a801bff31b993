//! Input gate
//!
//! Raw keyboard and pointer events arrive here and leave as commands, or
//! not at all. Three guards apply, in order: nothing passes while narration
//! is active (dropped events are not queued; the player presses again),
//! auto-repeated key events never pass, and keyboard commands within the
//! debounce interval of the previously accepted one are swallowed. Pointer
//! events skip the repeat and debounce guards; a click is already a
//! deliberate act.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::constants;

/// Keys the quiz reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Move selection up
    ArrowUp,
    /// Move selection down
    ArrowDown,
    /// Confirm the current selection
    Enter,
    /// Start a session
    Start,
    /// Open the theme editor
    Editor,
    /// Open the import picker
    Import,
}

impl Key {
    /// Maps a platform key name to a quiz key
    ///
    /// Letter bindings accept both cases, matching how the original
    /// shortcuts were advertised to players.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(Self::ArrowUp),
            "ArrowDown" => Some(Self::ArrowDown),
            "Enter" => Some(Self::Enter),
            "s" | "S" => Some(Self::Start),
            "e" | "E" => Some(Self::Editor),
            "i" | "I" => Some(Self::Import),
            _ => None,
        }
    }
}

/// A raw event as reported by the rendering collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawEvent {
    /// Keyboard event; `repeat` mirrors the platform's auto-repeat flag
    Key {
        /// Which key
        key: Key,
        /// Whether the platform flagged this as a held-key repeat
        repeat: bool,
    },
    /// Pointer activation of an option
    PointerSelect {
        /// Zero-based option index, valid by construction on the surface
        index: usize,
    },
    /// Pointer activation of the confirm control
    PointerConfirm,
}

/// A filtered, accepted command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Move selection up, clamped
    MoveUp,
    /// Move selection down, clamped
    MoveDown,
    /// Select a specific option (pointer)
    Select(usize),
    /// Lock in the current selection
    Confirm,
    /// Start a session with the current settings
    StartSession,
    /// Hand off to the theme editor
    OpenEditor,
    /// Hand off to the import picker
    TriggerImport,
}

/// The gate itself: one debounce timestamp and nothing else
#[derive(Debug, Clone, Default)]
pub struct Gate {
    last_accepted: Option<Instant>,
}

impl Gate {
    /// Filters one raw event into at most one command
    ///
    /// `speaking` is the coordinator's narration flag; `now` is supplied by
    /// the caller so the guard is a pure condition over its inputs.
    pub fn admit(&mut self, event: RawEvent, speaking: bool, now: Instant) -> Option<Command> {
        if speaking {
            return None;
        }
        match event {
            RawEvent::PointerSelect { index } => Some(Command::Select(index)),
            RawEvent::PointerConfirm => Some(Command::Confirm),
            RawEvent::Key { repeat: true, .. } => None,
            RawEvent::Key { key, repeat: false } => {
                if self.debounced(now) {
                    return None;
                }
                self.last_accepted = Some(now);
                Some(match key {
                    Key::ArrowUp => Command::MoveUp,
                    Key::ArrowDown => Command::MoveDown,
                    Key::Enter => Command::Confirm,
                    Key::Start => Command::StartSession,
                    Key::Editor => Command::OpenEditor,
                    Key::Import => Command::TriggerImport,
                })
            }
        }
    }

    fn debounced(&self, now: Instant) -> bool {
        self.last_accepted.is_some_and(|last| {
            now.duration_since(last) < Duration::from_millis(constants::input::DEBOUNCE_MS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key) -> RawEvent {
        RawEvent::Key { key, repeat: false }
    }

    #[test]
    fn test_key_name_mapping() {
        assert_eq!(Key::from_name("ArrowDown"), Some(Key::ArrowDown));
        assert_eq!(Key::from_name("s"), Some(Key::Start));
        assert_eq!(Key::from_name("S"), Some(Key::Start));
        assert_eq!(Key::from_name("E"), Some(Key::Editor));
        assert_eq!(Key::from_name("i"), Some(Key::Import));
        assert_eq!(Key::from_name("x"), None);
    }

    #[test]
    fn test_debounce_swallows_rapid_repeat() {
        let mut gate = Gate::default();
        let t0 = Instant::now();
        assert_eq!(gate.admit(key(Key::ArrowDown), false, t0), Some(Command::MoveDown));
        assert_eq!(gate.admit(key(Key::ArrowDown), false, t0 + Duration::from_millis(50)), None);
    }

    #[test]
    fn test_debounce_admits_spaced_events() {
        let mut gate = Gate::default();
        let t0 = Instant::now();
        assert_eq!(gate.admit(key(Key::ArrowDown), false, t0), Some(Command::MoveDown));
        assert_eq!(
            gate.admit(key(Key::ArrowDown), false, t0 + Duration::from_millis(250)),
            Some(Command::MoveDown)
        );
    }

    #[test]
    fn test_rejected_event_does_not_reset_debounce() {
        let mut gate = Gate::default();
        let t0 = Instant::now();
        gate.admit(key(Key::ArrowDown), false, t0);
        // swallowed at +150ms, so +250ms is still measured from t0
        assert_eq!(gate.admit(key(Key::ArrowUp), false, t0 + Duration::from_millis(150)), None);
        assert_eq!(
            gate.admit(key(Key::ArrowUp), false, t0 + Duration::from_millis(250)),
            Some(Command::MoveUp)
        );
    }

    #[test]
    fn test_auto_repeat_rejected() {
        let mut gate = Gate::default();
        let now = Instant::now();
        assert_eq!(gate.admit(RawEvent::Key { key: Key::Enter, repeat: true }, false, now), None);
    }

    #[test]
    fn test_speaking_gate_drops_everything() {
        let mut gate = Gate::default();
        let now = Instant::now();
        assert_eq!(gate.admit(key(Key::Enter), true, now), None);
        assert_eq!(gate.admit(RawEvent::PointerConfirm, true, now), None);
        assert_eq!(gate.admit(RawEvent::PointerSelect { index: 0 }, true, now), None);
        // no queueing: the same press passes once narration ends
        assert_eq!(gate.admit(key(Key::Enter), false, now), Some(Command::Confirm));
    }

    #[test]
    fn test_pointer_bypasses_debounce() {
        let mut gate = Gate::default();
        let t0 = Instant::now();
        gate.admit(key(Key::ArrowDown), false, t0);
        assert_eq!(
            gate.admit(RawEvent::PointerSelect { index: 2 }, false, t0 + Duration::from_millis(10)),
            Some(Command::Select(2))
        );
        assert_eq!(
            gate.admit(RawEvent::PointerConfirm, false, t0 + Duration::from_millis(20)),
            Some(Command::Confirm)
        );
    }

    #[test]
    fn test_command_keys_map() {
        let mut gate = Gate::default();
        let t0 = Instant::now();
        let step = Duration::from_millis(300);
        assert_eq!(gate.admit(key(Key::Start), false, t0), Some(Command::StartSession));
        assert_eq!(gate.admit(key(Key::Editor), false, t0 + step), Some(Command::OpenEditor));
        assert_eq!(gate.admit(key(Key::Import), false, t0 + step * 2), Some(Command::TriggerImport));
    }
}
