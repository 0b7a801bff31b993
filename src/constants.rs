//! Configuration constants for the quiz engine
//!
//! This module contains the timing parameters, tone parameters, and data
//! limits used throughout the engine. Durations are in milliseconds unless
//! the name says otherwise.

/// Theme and question shape limits
pub mod theme {
    /// Maximum length of a theme name in characters
    pub const MAX_NAME_LENGTH: usize = 200;
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_LENGTH: usize = 300;
    /// Minimum number of options a playable question must offer
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of options per question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of a single option text in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
}

/// Session construction limits
pub mod session {
    /// Default number of questions drawn into a session
    pub const DEFAULT_SESSION_LENGTH: usize = 10;
    /// Upper bound on the configurable session length
    pub const MAX_SESSION_LENGTH: usize = 100;
}

/// Fixed delays in the lock/verdict/advance sequence
pub mod timing {
    /// Delay between the locking acknowledgment and the verdict reveal
    pub const ACKNOWLEDGMENT_DELAY_MS: u64 = 400;
    /// Delay after the verdict before advancing to the next question
    pub const VERDICT_DELAY_MS: u64 = 900;
    /// Pause between the final summary and the qualitative grade
    pub const GRADE_PAUSE_MS: u64 = 1200;
    /// Delay before a finished session auto-restarts (when enabled)
    pub const RESTART_DELAY_MS: u64 = 5000;
    /// Interval between countdown ticks
    pub const TICK_INTERVAL_MS: u64 = 1000;
    /// Remaining seconds at or below which each tick emits an audible cue
    pub const WARNING_SECONDS: u32 = 3;
}

/// Input gate parameters
pub mod input {
    /// Minimum interval between accepted keyboard commands
    pub const DEBOUNCE_MS: u64 = 200;
}

/// Speech rates per narration kind, as passed to the speech engine
pub mod narration {
    /// Rate for question text
    pub const QUESTION_RATE: f32 = 0.9;
    /// Rate for option echoes
    pub const OPTION_RATE: f32 = 0.95;
    /// Rate for verdicts, notices, and summaries
    pub const VERDICT_RATE: f32 = 1.0;
    /// Rate for the final-seconds number words
    pub const COUNTDOWN_RATE: f32 = 0.8;
}

/// Tone cue parameters (frequency in hertz, duration in seconds)
pub mod tone {
    /// Countdown warning tick
    pub const TICK_HZ: f32 = 1320.0;
    /// Duration of the warning tick
    pub const TICK_SECONDS: f32 = 0.07;
    /// Locking acknowledgment
    pub const LOCK_HZ: f32 = 660.0;
    /// Duration of the locking acknowledgment
    pub const LOCK_SECONDS: f32 = 0.12;
    /// Correct-answer cue
    pub const CORRECT_HZ: f32 = 880.0;
    /// Duration of the correct-answer cue
    pub const CORRECT_SECONDS: f32 = 0.14;
    /// Wrong-answer cue
    pub const WRONG_HZ: f32 = 220.0;
    /// Duration of the wrong-answer cue
    pub const WRONG_SECONDS: f32 = 0.34;
}
