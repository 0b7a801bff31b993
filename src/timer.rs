//! Per-question countdown
//!
//! The countdown never owns a thread or an interval; it asks the embedder
//! to schedule one tick at a time through the same alarm channel the rest
//! of the engine uses, and each delivered tick schedules the next. Pausing
//! therefore does not cancel anything; it bumps an epoch stamp so that the
//! already-scheduled tick is recognized as stale when it arrives. The same
//! stamp implements the unconditional cancellation required when a session
//! is replaced.
//!
//! Granularity is whole seconds; no sub-second precision is guaranteed.

use enum_map::enum_map;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{constants, theme::Difficulty};

/// Alarm payload for countdown ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Due one tick interval after the previous tick (or after resume)
    Tick {
        /// Stamp of the timer run that scheduled this tick
        epoch: u64,
    },
}

/// What a delivered tick did to the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belonged to a paused, stopped, or superseded run
    Stale,
    /// A second elapsed, outside the warning window
    Counting {
        /// Seconds left on the clock
        remaining: u32,
    },
    /// A second elapsed inside the final-seconds window; cue the player
    Warning {
        /// Seconds left on the clock, in `1..=WARNING_SECONDS`
        remaining: u32,
    },
    /// The clock reached zero; the current question must be resolved
    Expired,
}

/// Seconds on the clock for a difficulty setting
pub fn time_limit(difficulty: Difficulty) -> u32 {
    (enum_map! {
        Difficulty::Easy => 25,
        Difficulty::Normal => 15,
        Difficulty::Hard => 8,
    })[difficulty]
}

/// A pausable whole-second countdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Countdown {
    remaining_seconds: u32,
    running: bool,
    epoch: u64,
}

impl Countdown {
    /// Loads the clock for a new question without starting it
    ///
    /// The value stays frozen until [`resume`](Self::resume); question
    /// narration happens in between.
    pub fn arm(&mut self, difficulty: Difficulty) {
        self.remaining_seconds = time_limit(difficulty);
        self.running = false;
        self.epoch += 1;
    }

    /// Starts or resumes ticking from the preserved remaining value
    pub fn resume<S: FnMut(crate::AlarmMessage, Duration)>(&mut self, mut schedule: S) {
        if self.running || self.remaining_seconds == 0 {
            return;
        }
        self.running = true;
        self.epoch += 1;
        schedule(
            AlarmMessage::Tick { epoch: self.epoch }.into(),
            Duration::from_millis(constants::timing::TICK_INTERVAL_MS),
        );
    }

    /// Stops ticking without touching the remaining value
    ///
    /// The tick already in flight, if any, becomes stale.
    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.epoch += 1;
        }
    }

    /// Processes one delivered tick
    ///
    /// A live tick decrements the clock and schedules its successor;
    /// anything else is reported [`TickOutcome::Stale`] and ignored.
    pub fn tick<S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        epoch: u64,
        mut schedule: S,
    ) -> TickOutcome {
        if !self.running || epoch != self.epoch {
            return TickOutcome::Stale;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.running = false;
            self.epoch += 1;
            return TickOutcome::Expired;
        }
        schedule(
            AlarmMessage::Tick { epoch: self.epoch }.into(),
            Duration::from_millis(constants::timing::TICK_INTERVAL_MS),
        );
        if self.remaining_seconds <= constants::timing::WARNING_SECONDS {
            TickOutcome::Warning {
                remaining: self.remaining_seconds,
            }
        } else {
            TickOutcome::Counting {
                remaining: self.remaining_seconds,
            }
        }
    }

    /// Seconds left on the clock
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Whether the clock is ticking
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_schedule(_: crate::AlarmMessage, _: Duration) {}

    fn current_epoch(countdown: &Countdown) -> u64 {
        countdown.epoch
    }

    #[test]
    fn test_time_limits_per_difficulty() {
        assert_eq!(time_limit(Difficulty::Easy), 25);
        assert_eq!(time_limit(Difficulty::Normal), 15);
        assert_eq!(time_limit(Difficulty::Hard), 8);
    }

    #[test]
    fn test_arm_loads_but_does_not_run() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Normal);
        assert_eq!(countdown.remaining_seconds(), 15);
        assert!(!countdown.is_running());
    }

    #[test]
    fn test_resume_schedules_first_tick() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Hard);
        let mut scheduled = Vec::new();
        countdown.resume(|message, delay| scheduled.push((message, delay)));
        assert!(countdown.is_running());
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].1, Duration::from_secs(1));
    }

    #[test]
    fn test_pause_preserves_remaining() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Normal);
        countdown.resume(no_schedule);
        let epoch = current_epoch(&countdown);
        let outcome = countdown.tick(epoch, no_schedule);
        assert_eq!(outcome, TickOutcome::Counting { remaining: 14 });
        countdown.pause();
        assert_eq!(countdown.remaining_seconds(), 14);
        countdown.resume(no_schedule);
        assert_eq!(countdown.remaining_seconds(), 14);
    }

    #[test]
    fn test_stale_tick_after_pause_is_ignored() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Normal);
        countdown.resume(no_schedule);
        let epoch = current_epoch(&countdown);
        countdown.pause();
        assert_eq!(countdown.tick(epoch, no_schedule), TickOutcome::Stale);
        assert_eq!(countdown.remaining_seconds(), 15);
    }

    #[test]
    fn test_stale_tick_after_rearm_is_ignored() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Normal);
        countdown.resume(no_schedule);
        let epoch = current_epoch(&countdown);
        countdown.arm(Difficulty::Normal);
        countdown.resume(no_schedule);
        assert_eq!(countdown.tick(epoch, no_schedule), TickOutcome::Stale);
        assert_eq!(countdown.remaining_seconds(), 15);
    }

    #[test]
    fn test_warning_window_and_expiry() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Hard);
        countdown.resume(no_schedule);
        let mut outcomes = Vec::new();
        for _ in 0..8 {
            let epoch = current_epoch(&countdown);
            outcomes.push(countdown.tick(epoch, no_schedule));
        }
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Counting { remaining: 7 },
                TickOutcome::Counting { remaining: 6 },
                TickOutcome::Counting { remaining: 5 },
                TickOutcome::Counting { remaining: 4 },
                TickOutcome::Warning { remaining: 3 },
                TickOutcome::Warning { remaining: 2 },
                TickOutcome::Warning { remaining: 1 },
                TickOutcome::Expired,
            ]
        );
        assert!(!countdown.is_running());
    }

    #[test]
    fn test_tick_after_expiry_is_stale() {
        let mut countdown = Countdown::default();
        countdown.arm(Difficulty::Hard);
        countdown.resume(no_schedule);
        for _ in 0..8 {
            let epoch = current_epoch(&countdown);
            countdown.tick(epoch, no_schedule);
        }
        let epoch = current_epoch(&countdown);
        assert_eq!(countdown.tick(epoch, no_schedule), TickOutcome::Stale);
    }
}
