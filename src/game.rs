//! Narration-coordinated quiz engine
//!
//! This module contains the main engine struct tying the pieces together:
//! the session state machine, the countdown, the input gate, and the
//! narration queue. Its job is sequencing: exactly one utterance plays at
//! a time, the countdown never ticks while question narration is in
//! progress, input is gated while anything is being spoken, and the
//! lock → verdict → advance chain runs on scheduled alarms so narration
//! for one question can never overlap the next.
//!
//! The engine owns no clock and no I/O. Time arrives as alarms the
//! embedder was asked to schedule (the `schedule` parameter on every
//! event method), narration completion arrives as
//! [`narration_finished`](Game::narration_finished) calls, and raw input
//! arrives through [`receive_input`](Game::receive_input). All calls
//! happen on one logical thread.

use std::collections::VecDeque;

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::{Duration, Instant};

use crate::{
    constants,
    input::{Command, Gate, RawEvent},
    lang::{Language, NarrationKind, Utterance},
    pack::{self, PackRecord},
    session::{ConfirmError, Direction, Phase, Session, StartError, Verdict},
    store::{self, ThemeStore},
    surface::{Chime, Narrator, Surface},
    theme::{Difficulty, Theme},
    timer::{self, Countdown, TickOutcome},
};

/// Alarm payloads for the coordinator's fixed delays
///
/// Every variant carries the generation stamp current when it was
/// scheduled; replacing the session bumps the stamp, which cancels
/// everything still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Acknowledgment delay after locking elapsed; reveal the verdict
    RevealVerdict {
        /// Stamp of the session flow that scheduled this alarm
        generation: u64,
    },
    /// Verdict display delay elapsed; advance to the next question
    ProceedToNext {
        /// Stamp of the session flow that scheduled this alarm
        generation: u64,
    },
    /// Pause between the summary and the qualitative grade elapsed
    AnnounceGrade {
        /// Stamp of the session flow that scheduled this alarm
        generation: u64,
    },
    /// Auto-restart delay after a finished session elapsed
    Restart {
        /// Stamp of the session flow that scheduled this alarm
        generation: u64,
    },
}

impl AlarmMessage {
    fn generation(self) -> u64 {
        match self {
            Self::RevealVerdict { generation }
            | Self::ProceedToNext { generation }
            | Self::AnnounceGrade { generation }
            | Self::Restart { generation } => generation,
        }
    }
}

/// Engine configuration options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct Options {
    /// Number of questions drawn into each session
    #[garde(range(min = 1, max = constants::session::MAX_SESSION_LENGTH))]
    pub session_length: usize,
    /// Whether a finished session starts a new one after a delay
    #[garde(skip)]
    pub auto_restart: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            session_length: constants::session::DEFAULT_SESSION_LENGTH,
            auto_restart: false,
        }
    }
}

/// Incremental view updates sent through the rendering collaborator
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UpdateMessage {
    /// Show a question with its options
    Question {
        /// Zero-based question index
        index: usize,
        /// Total questions in the session
        count: usize,
        /// The question text
        question_text: String,
        /// Ordered option texts
        options: Vec<String>,
        /// Currently highlighted option
        selected: Option<usize>,
    },
    /// The highlight moved
    SelectionChanged {
        /// Newly highlighted option
        selected: usize,
    },
    /// Accessibility live status line
    Status(String),
    /// The answer locked; show the persistent locked banner
    AnswerLocked,
    /// The locked banner can be cleared
    LockCleared,
    /// Verdict reveal
    Verdict {
        /// Whether the locked answer was correct
        correct: bool,
        /// Index of the correct option
        correct_index: usize,
    },
    /// Score indicator update
    Score {
        /// Points scored so far
        score: usize,
    },
    /// Session finished
    Summary {
        /// Final score
        score: usize,
        /// Questions in the session
        count: usize,
    },
    /// The host should open the theme editor
    EditorRequested,
    /// The host should open the import picker
    ImportRequested,
}

/// Full-view synchronization message for mounting or re-rendering
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyncMessage {
    /// No session running; show the theme list
    Idle {
        /// `(id, name)` pairs of available themes
        themes: Vec<(String, String)>,
    },
    /// Mid-question view
    Question {
        /// Zero-based question index
        index: usize,
        /// Total questions in the session
        count: usize,
        /// The question text
        question_text: String,
        /// Ordered option texts
        options: Vec<String>,
        /// Currently highlighted option
        selected: Option<usize>,
        /// Points scored so far
        score: usize,
        /// Seconds left on the countdown
        remaining_seconds: u32,
        /// Whether the answer has locked
        locked: bool,
    },
    /// Finished view
    Summary {
        /// Final score
        score: usize,
        /// Questions in the session
        count: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Speaking {
    kind: NarrationKind,
    generation: u64,
}

/// The engine: session, countdown, input gate, and narration queue
pub struct Game {
    themes: Vec<Theme>,
    selected_theme_ids: Vec<String>,
    language: Language,
    difficulty: Difficulty,
    options: Options,
    session: Option<Session>,
    timer: Countdown,
    gate: Gate,
    speaking: Option<Speaking>,
    pending_utterances: VecDeque<Utterance>,
    pending_verdict: Option<Verdict>,
    generation: u64,
}

impl Game {
    /// Creates an engine over a theme set
    ///
    /// The first theme starts out selected, matching the idle view the
    /// surface shows on mount.
    pub fn new(themes: Vec<Theme>, options: Options) -> Self {
        let selected_theme_ids = themes.first().map(|t| t.id.clone()).into_iter().collect();
        Self {
            themes,
            selected_theme_ids,
            language: Language::default(),
            difficulty: Difficulty::default(),
            options,
            session: None,
            timer: Countdown::default(),
            gate: Gate::default(),
            speaking: None,
            pending_utterances: VecDeque::new(),
            pending_verdict: None,
            generation: 0,
        }
    }

    /// Creates an engine from the store, seeding defaults on first run
    pub fn bootstrap<R: ThemeStore>(store: &R, options: Options) -> Self {
        let themes = store.load_themes().unwrap_or_else(|| {
            let seeded = pack::seed_themes();
            store.save_themes(&seeded);
            seeded
        });
        Self::new(themes, options)
    }

    /// The current theme set
    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// The running session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The per-question countdown (read-only)
    pub fn countdown(&self) -> &Countdown {
        &self.timer
    }

    /// Whether an utterance is currently with the narrator
    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    /// Replaces the theme selection for the next session
    pub fn select_themes(&mut self, ids: Vec<String>) {
        self.selected_theme_ids = ids;
    }

    /// Sets the difficulty for the next session
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Switches the narration language and announces the change
    ///
    /// The announcement is spoken in the new language. A running session
    /// keeps the language it started with.
    pub fn set_language<N: Narrator, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        language: Language,
        narrator: &N,
        mut schedule: S,
    ) {
        self.language = language;
        self.say(language.language_changed(), narrator, &mut schedule);
    }

    /// Exports the theme set in the interchange JSON shape
    pub fn export(&self) -> String {
        pack::export_json(&self.themes)
    }

    /// Merges imported records into the theme set
    ///
    /// Saves the enlarged set and announces the import when anything was
    /// added. Returns the number of questions added; zero means every
    /// record was unusable and nothing changed.
    pub fn merge_pack<N, R, S>(
        &mut self,
        records: Vec<PackRecord>,
        narrator: &N,
        store: &R,
        mut schedule: S,
    ) -> usize
    where
        N: Narrator,
        R: ThemeStore,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let added = pack::merge_into(&mut self.themes, records);
        if added > 0 {
            store.save_themes(&self.themes);
            self.say(self.language.import_successful(), narrator, &mut schedule);
        }
        added
    }

    /// Feeds one raw input event through the gate
    ///
    /// `now` is the event timestamp for the debounce guard. Rejected
    /// events vanish; accepted ones become commands and are applied
    /// immediately.
    pub fn receive_input<P, S>(&mut self, event: RawEvent, now: Instant, platform: &P, schedule: S)
    where
        P: Narrator + Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let speaking = self.speaking.is_some();
        let Some(command) = self.gate.admit(event, speaking, now) else {
            return;
        };
        self.apply(command, platform, schedule);
    }

    /// Starts a session with the current settings
    ///
    /// On an empty question pool the condition is spoken and shown and
    /// nothing else changes; the previous idle or finished state stays
    /// up. On success any alarms and queued narration from an earlier
    /// session are invalidated before the first question is presented.
    pub fn start_session<P, S>(&mut self, platform: &P, mut schedule: S)
    where
        P: Narrator + Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match Session::start(
            &self.themes,
            &self.selected_theme_ids,
            self.language,
            self.difficulty,
            self.options.session_length,
        ) {
            Ok(session) => {
                self.generation += 1;
                self.timer.pause();
                self.pending_utterances.clear();
                self.pending_verdict = None;
                self.session = Some(session);
                platform.render(&UpdateMessage::Status(self.language.status_running()));
                platform.render(&UpdateMessage::Score { score: 0 });
                self.present_current(platform, &mut schedule);
            }
            Err(StartError::NoQuestions) => {
                let notice = self.language.no_questions();
                platform.render(&UpdateMessage::Status(notice.text.clone()));
                self.say(notice, platform, &mut schedule);
            }
        }
    }

    /// Reports that the utterance handed to the narrator has ended
    ///
    /// Must be called exactly once per [`Narrator::speak`] call that
    /// returned `true`, on success or failure. Completion of question
    /// narration opens the question for input and lets the countdown run;
    /// completion of the summary starts the pause before the grade; any
    /// completion drains the next queued utterance.
    pub fn narration_finished<N, S>(&mut self, narrator: &N, mut schedule: S)
    where
        N: Narrator,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.utterance_finished(narrator, &mut schedule);
    }

    /// Processes one scheduled alarm
    ///
    /// Countdown ticks go to the timer; coordinator alarms whose
    /// generation stamp no longer matches are discarded, which is how
    /// replacing a session cancels its scheduled future.
    pub fn receive_alarm<P, R, S>(
        &mut self,
        message: crate::AlarmMessage,
        platform: &P,
        store: &R,
        mut schedule: S,
    ) where
        P: Narrator + Chime + Surface,
        R: ThemeStore,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match message {
            crate::AlarmMessage::Timer(timer::AlarmMessage::Tick { epoch }) => {
                self.handle_tick(epoch, platform, &mut schedule);
            }
            crate::AlarmMessage::Game(alarm) => {
                if alarm.generation() != self.generation {
                    return;
                }
                match alarm {
                    AlarmMessage::RevealVerdict { .. } => {
                        self.reveal_verdict(platform, &mut schedule);
                    }
                    AlarmMessage::ProceedToNext { .. } => {
                        self.proceed(platform, store, &mut schedule);
                    }
                    AlarmMessage::AnnounceGrade { .. } => {
                        self.announce_grade(platform, &mut schedule);
                    }
                    AlarmMessage::Restart { .. } => self.start_session(platform, schedule),
                }
            }
        }
    }

    /// Full-view message for mounting or re-rendering the surface
    pub fn state_message(&self) -> SyncMessage {
        match &self.session {
            Some(session) if session.phase() == Phase::Ended => SyncMessage::Summary {
                score: session.score(),
                count: session.question_count(),
            },
            Some(session) => match session.current_question() {
                Some(question) => SyncMessage::Question {
                    index: session.current_index(),
                    count: session.question_count(),
                    question_text: question.question_text.clone(),
                    options: question.options.clone(),
                    selected: session.selected_option(),
                    score: session.score(),
                    remaining_seconds: self.timer.remaining_seconds(),
                    locked: session.phase() == Phase::Locked,
                },
                None => self.idle_message(),
            },
            None => self.idle_message(),
        }
    }

    fn idle_message(&self) -> SyncMessage {
        SyncMessage::Idle {
            themes: self
                .themes
                .iter()
                .map(|t| (t.id.clone(), t.name.clone()))
                .collect(),
        }
    }

    fn apply<P, S>(&mut self, command: Command, platform: &P, mut schedule: S)
    where
        P: Narrator + Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match command {
            Command::StartSession => self.start_session(platform, schedule),
            Command::MoveUp => self.handle_move(Direction::Up, platform, &mut schedule),
            Command::MoveDown => self.handle_move(Direction::Down, platform, &mut schedule),
            Command::Select(index) => self.handle_select(index, platform, &mut schedule),
            Command::Confirm => self.handle_confirm(platform, &mut schedule),
            Command::OpenEditor => platform.render(&UpdateMessage::EditorRequested),
            Command::TriggerImport => platform.render(&UpdateMessage::ImportRequested),
        }
    }

    /// Presents the question at the cursor: render, arm the clock, narrate
    ///
    /// The countdown is armed but held while the question is spoken; it
    /// only starts running when the narration-complete signal arrives.
    fn present_current<P, S>(&mut self, platform: &P, schedule: &mut S)
    where
        P: Narrator + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let Some(session) = &self.session else { return };
        let Some(question) = session.current_question() else {
            return;
        };
        let difficulty = session.difficulty();
        let message = UpdateMessage::Question {
            index: session.current_index(),
            count: session.question_count(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            selected: session.selected_option(),
        };
        let utterance = session.language().question(&question.question_text);
        self.timer.pause();
        self.timer.arm(difficulty);
        platform.render(&message);
        self.say(utterance, platform, schedule);
    }

    fn handle_move<P, S>(&mut self, direction: Direction, platform: &P, schedule: &mut S)
    where
        P: Narrator + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let Some(session) = &mut self.session else { return };
        let Some(index) = session.move_selection(direction) else {
            return;
        };
        let Some(question) = session.current_question() else {
            return;
        };
        let echo = session.language().option_echo(index, &question.options[index]);
        platform.render(&UpdateMessage::SelectionChanged { selected: index });
        // option narration leaves the countdown running; only question
        // narration holds the clock
        self.say(echo, platform, schedule);
    }

    fn handle_select<P, S>(&mut self, index: usize, platform: &P, schedule: &mut S)
    where
        P: Narrator + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let Some(session) = &mut self.session else { return };
        if !session.record_selection(index) {
            return;
        }
        let Some(question) = session.current_question() else {
            return;
        };
        let echo = session.language().option_echo(index, &question.options[index]);
        platform.render(&UpdateMessage::SelectionChanged { selected: index });
        self.say(echo, platform, schedule);
    }

    fn handle_confirm<P, S>(&mut self, platform: &P, schedule: &mut S)
    where
        P: Narrator + Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let result = match &mut self.session {
            Some(session) => session.confirm_current(),
            None => return,
        };
        match result {
            Ok(verdict) => self.lock_answer(verdict, platform, schedule),
            Err(ConfirmError::NoSelection) => {
                let language = self.session_language();
                self.say(language.no_option_selected(), platform, schedule);
            }
            // the locked latch observing a stray confirm
            Err(ConfirmError::NotAnswerable) => {}
        }
    }

    /// Runs the locking acknowledgment: banner, tone, and the fixed delay
    /// before the verdict is revealed
    fn lock_answer<P, S>(&mut self, verdict: Verdict, platform: &P, schedule: &mut S)
    where
        P: Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.timer.pause();
        self.pending_verdict = Some(verdict);
        platform.render(&UpdateMessage::AnswerLocked);
        platform.render(&UpdateMessage::Status(self.session_language().status_locked()));
        platform.play_tone(
            constants::tone::LOCK_HZ,
            Duration::from_secs_f32(constants::tone::LOCK_SECONDS),
        );
        schedule(
            AlarmMessage::RevealVerdict {
                generation: self.generation,
            }
            .into(),
            Duration::from_millis(constants::timing::ACKNOWLEDGMENT_DELAY_MS),
        );
    }

    fn reveal_verdict<P, S>(&mut self, platform: &P, schedule: &mut S)
    where
        P: Narrator + Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let Some(verdict) = self.pending_verdict.take() else {
            return;
        };
        let Some(session) = &self.session else { return };
        let language = session.language();
        let correct_option = session
            .current_question()
            .map(|q| q.correct_option().to_owned())
            .unwrap_or_default();
        let score = session.score();
        if verdict.correct {
            platform.play_tone(
                constants::tone::CORRECT_HZ,
                Duration::from_secs_f32(constants::tone::CORRECT_SECONDS),
            );
        } else {
            platform.play_tone(
                constants::tone::WRONG_HZ,
                Duration::from_secs_f32(constants::tone::WRONG_SECONDS),
            );
        }
        platform.render(&UpdateMessage::Verdict {
            correct: verdict.correct,
            correct_index: verdict.correct_index,
        });
        platform.render(&UpdateMessage::Score { score });
        self.say(
            language.verdict(verdict.correct, verdict.timed_out, &correct_option),
            platform,
            schedule,
        );
        schedule(
            AlarmMessage::ProceedToNext {
                generation: self.generation,
            }
            .into(),
            Duration::from_millis(constants::timing::VERDICT_DELAY_MS),
        );
    }

    fn proceed<P, R, S>(&mut self, platform: &P, store: &R, schedule: &mut S)
    where
        P: Narrator + Chime + Surface,
        R: ThemeStore,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        platform.render(&UpdateMessage::LockCleared);
        let phase = match &mut self.session {
            Some(session) => session.advance(),
            None => return,
        };
        match phase {
            Phase::Presenting => self.present_current(platform, schedule),
            Phase::Ended => self.finish_session(platform, store, schedule),
            Phase::Awaitable | Phase::Locked => {}
        }
    }

    fn finish_session<P, R, S>(&mut self, platform: &P, store: &R, schedule: &mut S)
    where
        P: Narrator + Chime + Surface,
        R: ThemeStore,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.timer.pause();
        let (language, score, count) = match &self.session {
            Some(session) => (session.language(), session.score(), session.question_count()),
            None => return,
        };
        platform.render(&UpdateMessage::Summary { score, count });
        platform.render(&UpdateMessage::Status(language.status_over()));
        self.say(language.summary(score, count), platform, schedule);
        let key = self.best_score_key();
        if store::record_best(store, &key, score) {
            self.say(language.new_record(score), platform, schedule);
        }
    }

    fn announce_grade<P, S>(&mut self, platform: &P, schedule: &mut S)
    where
        P: Narrator,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let utterance = match &self.session {
            Some(session) if session.phase() == Phase::Ended => {
                session.language().grade(session.score(), session.question_count())
            }
            _ => return,
        };
        self.say(utterance, platform, schedule);
    }

    fn handle_tick<P, S>(&mut self, epoch: u64, platform: &P, schedule: &mut S)
    where
        P: Narrator + Chime + Surface,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        match self.timer.tick(epoch, &mut *schedule) {
            TickOutcome::Stale | TickOutcome::Counting { .. } => {}
            TickOutcome::Warning { remaining } => {
                platform.play_tone(
                    constants::tone::TICK_HZ,
                    Duration::from_secs_f32(constants::tone::TICK_SECONDS),
                );
                let utterance = self.session_language().count_word(remaining);
                self.say(utterance, platform, schedule);
            }
            TickOutcome::Expired => {
                let verdict = match &mut self.session {
                    Some(session) => session.timeout_current(),
                    None => None,
                };
                if let Some(verdict) = verdict {
                    self.lock_answer(verdict, platform, schedule);
                }
            }
        }
    }

    /// Enqueues an utterance, starting it immediately when nothing is playing
    fn say<N, S>(&mut self, utterance: Utterance, narrator: &N, schedule: &mut S)
    where
        N: Narrator,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        if self.speaking.is_some() {
            self.pending_utterances.push_back(utterance);
            return;
        }
        self.begin_utterance(utterance, narrator, schedule);
    }

    fn begin_utterance<N, S>(&mut self, utterance: Utterance, narrator: &N, schedule: &mut S)
    where
        N: Narrator,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        self.speaking = Some(Speaking {
            kind: utterance.kind,
            generation: self.generation,
        });
        if !narrator.speak(&utterance) {
            // absent speech engine: the utterance completes instantly so
            // the sequencing never stalls
            log::debug!("speech engine unavailable, completing utterance instantly");
            self.utterance_finished(narrator, schedule);
        }
    }

    fn utterance_finished<N, S>(&mut self, narrator: &N, schedule: &mut S)
    where
        N: Narrator,
        S: FnMut(crate::AlarmMessage, Duration),
    {
        let Some(Speaking { kind, generation }) = self.speaking.take() else {
            return;
        };
        if generation == self.generation {
            match kind {
                NarrationKind::Question => {
                    if let Some(session) = &mut self.session {
                        if session.mark_awaitable() {
                            self.timer.resume(&mut *schedule);
                        }
                    }
                }
                NarrationKind::Summary => schedule(
                    AlarmMessage::AnnounceGrade {
                        generation: self.generation,
                    }
                    .into(),
                    Duration::from_millis(constants::timing::GRADE_PAUSE_MS),
                ),
                NarrationKind::Grade => {
                    if self.options.auto_restart {
                        schedule(
                            AlarmMessage::Restart {
                                generation: self.generation,
                            }
                            .into(),
                            Duration::from_millis(constants::timing::RESTART_DELAY_MS),
                        );
                    }
                }
                NarrationKind::OptionEcho
                | NarrationKind::Notice
                | NarrationKind::Countdown
                | NarrationKind::Verdict => {}
            }
        }
        if let Some(next) = self.pending_utterances.pop_front() {
            self.begin_utterance(next, narrator, schedule);
        }
    }

    fn session_language(&self) -> Language {
        self.session
            .as_ref()
            .map_or(self.language, Session::language)
    }

    fn best_score_key(&self) -> String {
        match self.selected_theme_ids.as_slice() {
            [only] => only.clone(),
            _ => "default".to_owned(),
        }
    }
}
