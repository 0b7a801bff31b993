//! Session state and scoring
//!
//! A session is one timed play-through of a shuffled subset of questions.
//! This module owns the ordered question list, the cursor, the score, and
//! the per-question phase latch; it knows nothing about narration, timing,
//! or rendering. Every mutation goes through a guarded transition in the
//! style of a one-way latch: once a question locks, no later selection,
//! confirm, or timeout can touch the score or the selection again.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    lang::Language,
    theme::{Difficulty, Question, Theme},
};

/// Phase of the current question
///
/// `Presenting → Awaitable → Locked` per question, with `Ended` once the
/// cursor moves past the last question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Question narration in progress; selection is not yet accepted
    Presenting,
    /// Narration done; selection and confirmation are live
    Awaitable,
    /// Answer final; stray events for this question are ignored
    Locked,
    /// Past the last question
    Ended,
}

/// Navigation direction for keyboard selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the first option
    Up,
    /// Towards the last option
    Down,
}

/// The recorded outcome of a locked question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the locked selection matched the correct index
    pub correct: bool,
    /// Whether the lock came from timer expiry rather than a confirm
    pub timed_out: bool,
    /// The correct option index, for verdict narration
    pub correct_index: usize,
}

/// Why a session could not start
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// The selected themes (after all fallbacks) yielded no playable questions
    #[error("no playable questions in the selected themes")]
    NoQuestions,
}

/// Why a confirm was not acted on
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfirmError {
    /// Confirm pressed with no option selected; reported to the player
    #[error("no option selected")]
    NoSelection,
    /// The current question is not in a confirmable phase; ignored silently
    #[error("question is not awaiting an answer")]
    NotAnswerable,
}

/// One timed play-through of a shuffled question subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    ordered_questions: Vec<Question>,
    current_index: usize,
    score: usize,
    selected_option: Option<usize>,
    language: Language,
    difficulty: Difficulty,
    phase: Phase,
}

impl Session {
    /// Builds a session from the selected themes
    ///
    /// Pools every playable question from the themes named in
    /// `selected_ids` (all themes when the selection is empty, the first
    /// theme when the selection yields nothing), shuffles the pool
    /// in place with an unbiased Fisher–Yates pass, and keeps the first
    /// `session_length` questions.
    ///
    /// # Errors
    ///
    /// [`StartError::NoQuestions`] when the pool is empty after all
    /// fallbacks. Nothing is mutated anywhere in that case; the caller
    /// reports the condition and stays on the previous state.
    pub fn start(
        themes: &[Theme],
        selected_ids: &[String],
        language: Language,
        difficulty: Difficulty,
        session_length: usize,
    ) -> Result<Self, StartError> {
        let mut pool = pool_questions(themes, selected_ids);
        if pool.is_empty() {
            return Err(StartError::NoQuestions);
        }
        fastrand::shuffle(&mut pool);
        pool.truncate(session_length.min(pool.len()));
        Ok(Self {
            ordered_questions: pool,
            current_index: 0,
            score: 0,
            selected_option: None,
            language,
            difficulty,
            phase: Phase::Presenting,
        })
    }

    /// The question at the cursor, absent once the session has ended
    pub fn current_question(&self) -> Option<&Question> {
        self.ordered_questions.get(self.current_index)
    }

    /// Zero-based cursor position
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of questions in this session
    pub fn question_count(&self) -> usize {
        self.ordered_questions.len()
    }

    /// Points scored so far
    pub fn score(&self) -> usize {
        self.score
    }

    /// Currently highlighted option, if any
    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    /// Narration language for this session
    pub fn language(&self) -> Language {
        self.language
    }

    /// Difficulty this session was started with
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Marks question narration as finished, opening the question for input
    ///
    /// Returns `false` when the session was not in `Presenting`.
    pub fn mark_awaitable(&mut self) -> bool {
        self.change_phase(Phase::Presenting, Phase::Awaitable)
    }

    /// Moves the highlight one step, clamped to the option range
    ///
    /// With nothing selected the highlight lands on the first option
    /// regardless of direction. Returns the new index when the highlight
    /// moved (or first appeared), `None` when the event changed nothing.
    pub fn move_selection(&mut self, direction: Direction) -> Option<usize> {
        if self.phase != Phase::Awaitable {
            return None;
        }
        let last = self.current_question()?.options.len() - 1;
        let next = match (self.selected_option, direction) {
            (None, _) => 0,
            (Some(i), Direction::Down) => (i + 1).min(last),
            (Some(i), Direction::Up) => i.saturating_sub(1),
        };
        if self.selected_option == Some(next) {
            return None;
        }
        self.selected_option = Some(next);
        Some(next)
    }

    /// Sets the highlight directly (pointer selection)
    ///
    /// Returns `false` for an out-of-range index or outside `Awaitable`.
    /// Re-selecting the already highlighted option is accepted, so a second
    /// click re-echoes the option.
    pub fn record_selection(&mut self, index: usize) -> bool {
        if self.phase != Phase::Awaitable {
            return false;
        }
        let Some(question) = self.ordered_questions.get(self.current_index) else {
            return false;
        };
        if index >= question.options.len() {
            return false;
        }
        self.selected_option = Some(index);
        true
    }

    /// Locks in the current selection and scores it
    ///
    /// This is the single point where the score changes. The transition to
    /// `Locked` happens in the same step, so a repeated confirm can never
    /// score twice.
    ///
    /// # Errors
    ///
    /// [`ConfirmError::NoSelection`] with nothing selected (reported, no
    /// state change); [`ConfirmError::NotAnswerable`] outside `Awaitable`
    /// (ignored by callers; this is the latch observing a stray event).
    pub fn confirm_current(&mut self) -> Result<Verdict, ConfirmError> {
        if self.phase != Phase::Awaitable {
            return Err(ConfirmError::NotAnswerable);
        }
        let Some(selected) = self.selected_option else {
            return Err(ConfirmError::NoSelection);
        };
        Ok(self.lock(Some(selected), false))
    }

    /// Resolves the question on timer expiry
    ///
    /// A standing selection is locked and scored exactly as a confirm
    /// would; with no selection the question locks as answered
    /// incorrectly. Returns `None` when the question is not open (the
    /// latch again: a tick racing a confirm resolves to whichever ran
    /// first).
    pub fn timeout_current(&mut self) -> Option<Verdict> {
        if self.phase != Phase::Awaitable {
            return None;
        }
        Some(self.lock(self.selected_option, true))
    }

    /// Moves past a locked question
    ///
    /// Clears the selection and either enters `Presenting` for the next
    /// question or `Ended` past the last one. Returns the phase entered;
    /// calling outside `Locked` returns the current phase unchanged.
    pub fn advance(&mut self) -> Phase {
        if self.phase != Phase::Locked {
            return self.phase;
        }
        self.current_index += 1;
        self.selected_option = None;
        self.phase = if self.current_index >= self.ordered_questions.len() {
            Phase::Ended
        } else {
            Phase::Presenting
        };
        debug_assert!(self.score <= self.current_index);
        debug_assert!(self.current_index <= self.ordered_questions.len());
        self.phase
    }

    fn lock(&mut self, selected: Option<usize>, timed_out: bool) -> Verdict {
        let question = &self.ordered_questions[self.current_index];
        let correct = selected == Some(question.correct_index);
        if correct {
            self.score += 1;
        }
        self.selected_option = selected;
        self.phase = Phase::Locked;
        Verdict {
            correct,
            timed_out,
            correct_index: question.correct_index,
        }
    }

    fn change_phase(&mut self, before: Phase, after: Phase) -> bool {
        if self.phase == before {
            self.phase = after;
            true
        } else {
            false
        }
    }
}

/// Pools playable questions per the selection fallback chain
fn pool_questions(themes: &[Theme], selected_ids: &[String]) -> Vec<Question> {
    let chosen = if selected_ids.is_empty() {
        themes.iter().collect_vec()
    } else {
        themes
            .iter()
            .filter(|theme| selected_ids.iter().any(|id| *id == theme.id))
            .collect_vec()
    };
    let pool = chosen
        .iter()
        .flat_map(|theme| theme.questions.iter().filter(|q| q.is_playable()).cloned())
        .collect_vec();
    if pool.is_empty() {
        if let Some(first) = themes.first() {
            return first
                .questions
                .iter()
                .filter(|q| q.is_playable())
                .cloned()
                .collect_vec();
        }
    }
    pool
}
