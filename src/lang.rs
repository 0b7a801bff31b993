//! Localized narration texts
//!
//! Everything the engine says passes through here. Two languages are
//! supported, Finnish and English; the phrase set matches the accessible
//! quiz it narrates, so Finnish wording is the reference and English is the
//! fallback pair. No localization framework is involved: the catalog is a
//! set of methods on [`Language`].

use serde::{Deserialize, Serialize};

use crate::constants;

/// Narration language for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Finnish
    #[default]
    Fi,
    /// English
    En,
}

/// What an utterance is for
///
/// The coordinator branches on this when an utterance completes: question
/// narration gates input and the timer, summaries chain into the grade, and
/// the rest just drain the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NarrationKind {
    /// Question text, spoken on entering a question
    Question,
    /// Echo of a selected option
    OptionEcho,
    /// Short informational message (errors, confirmations)
    Notice,
    /// Final-seconds number word
    Countdown,
    /// Correct/wrong/timeout verdict
    Verdict,
    /// End-of-session score summary
    Summary,
    /// Qualitative judgment after the summary
    Grade,
}

/// One utterance handed to the speech collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    /// Text to synthesize
    pub text: String,
    /// BCP 47 tag for the speech engine
    pub language_tag: &'static str,
    /// Speech rate (1.0 is the engine default)
    pub rate: f32,
    /// Role of this utterance in the coordination protocol
    pub kind: NarrationKind,
}

impl Language {
    /// The BCP 47 language tag passed to the speech engine
    pub fn tag(self) -> &'static str {
        match self {
            Self::Fi => "fi-FI",
            Self::En => "en-US",
        }
    }

    fn pick<'a>(self, fi: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::Fi => fi,
            Self::En => en,
        }
    }

    /// Question announcement, prefixed so screen-less players hear the role
    pub fn question(self, text: &str) -> Utterance {
        self.utter(
            format!("{}{text}", self.pick("Kysymys: ", "Question: ")),
            constants::narration::QUESTION_RATE,
            NarrationKind::Question,
        )
    }

    /// Echo of a selected option; `index` is zero-based, spoken one-based
    pub fn option_echo(self, index: usize, text: &str) -> Utterance {
        self.utter(
            format!(
                "{}{}. {text}",
                self.pick("Valitsit vaihtoehdon ", "Selected option "),
                index + 1
            ),
            constants::narration::OPTION_RATE,
            NarrationKind::OptionEcho,
        )
    }

    /// Reported when confirm is pressed with nothing selected
    pub fn no_option_selected(self) -> Utterance {
        self.notice(self.pick("Et valinnut vaihtoehtoa", "No option selected"))
    }

    /// Reported when a session cannot start for lack of questions
    pub fn no_questions(self) -> Utterance {
        self.notice(self.pick(
            "Valittu teema ei sisällä kysymyksiä",
            "Selected theme has no questions",
        ))
    }

    /// Spoken after the language setting changes, in the new language
    pub fn language_changed(self) -> Utterance {
        self.notice(self.pick("Kieli vaihdettu", "Language changed"))
    }

    /// Spoken after a successful import
    pub fn import_successful(self) -> Utterance {
        self.notice(self.pick("Tuo onnistui", "Import successful"))
    }

    /// Spoken when the session score beats the stored best
    pub fn new_record(self, score: usize) -> Utterance {
        self.notice(&format!("{} {score}", self.pick("Uusi ennätys", "New record")))
    }

    /// Verdict for a locked answer
    ///
    /// Correct answers get the short affirmation; wrong ones name the
    /// correct option. Timeouts carry a "time's up" prefix in both cases.
    pub fn verdict(self, correct: bool, timed_out: bool, correct_option: &str) -> Utterance {
        let mut text = String::new();
        if timed_out {
            text.push_str(self.pick("Aika loppui. ", "Time's up. "));
        }
        if correct {
            text.push_str(self.pick("Oikein!", "Correct!"));
        } else {
            text.push_str(self.pick(
                "Väärin. Oikea vastaus oli: ",
                "Wrong. Correct answer was: ",
            ));
            text.push_str(correct_option);
        }
        self.utter(text, constants::narration::VERDICT_RATE, NarrationKind::Verdict)
    }

    /// End-of-session score summary
    pub fn summary(self, score: usize, count: usize) -> Utterance {
        self.utter(
            match self {
                Self::Fi => format!("Sait {score}/{count} oikein"),
                Self::En => format!("You got {score}/{count} correct"),
            },
            constants::narration::VERDICT_RATE,
            NarrationKind::Summary,
        )
    }

    /// Qualitative judgment of a finished session, scaled to its length
    pub fn grade(self, score: usize, count: usize) -> Utterance {
        #[allow(clippy::cast_precision_loss)]
        let ratio = if count == 0 { 0.0 } else { score as f64 / count as f64 };
        let word = if ratio <= 0.2 {
            self.pick("heikko", "poor")
        } else if ratio <= 0.5 {
            self.pick("kohtalainen", "fair")
        } else if ratio <= 0.7 {
            self.pick("hyvä", "good")
        } else if ratio <= 0.9 {
            self.pick("erinomainen", "excellent")
        } else {
            self.pick("täydellinen", "perfect")
        };
        self.utter(word.to_owned(), constants::narration::VERDICT_RATE, NarrationKind::Grade)
    }

    /// Number word for the final-seconds countdown cue
    pub fn count_word(self, n: u32) -> Utterance {
        let word = match (self, n) {
            (Self::Fi, 1) => "yksi",
            (Self::Fi, 2) => "kaksi",
            (Self::Fi, 3) => "kolme",
            (Self::En, 1) => "one",
            (Self::En, 2) => "two",
            (Self::En, 3) => "three",
            _ => {
                return self.utter(
                    n.to_string(),
                    constants::narration::COUNTDOWN_RATE,
                    NarrationKind::Countdown,
                );
            }
        };
        self.utter(word.to_owned(), constants::narration::COUNTDOWN_RATE, NarrationKind::Countdown)
    }

    /// Status line shown while a session is running
    pub fn status_running(self) -> String {
        self.pick("Peli käynnissä", "Game running").to_owned()
    }

    /// Status line shown when a session ends
    pub fn status_over(self) -> String {
        self.pick("Peli päättyi", "Game over").to_owned()
    }

    /// Persistent status announced when an answer locks
    pub fn status_locked(self) -> String {
        self.pick("Vastaus lukittu", "Answer locked").to_owned()
    }

    fn notice(self, text: &str) -> Utterance {
        self.utter(text.to_owned(), constants::narration::VERDICT_RATE, NarrationKind::Notice)
    }

    fn utter(self, text: String, rate: f32, kind: NarrationKind) -> Utterance {
        Utterance {
            text,
            language_tag: self.tag(),
            rate,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags() {
        assert_eq!(Language::Fi.tag(), "fi-FI");
        assert_eq!(Language::En.tag(), "en-US");
    }

    #[test]
    fn test_question_prefix() {
        let u = Language::Fi.question("Kuka?");
        assert_eq!(u.text, "Kysymys: Kuka?");
        assert_eq!(u.kind, NarrationKind::Question);
        assert_eq!(u.language_tag, "fi-FI");
    }

    #[test]
    fn test_option_echo_is_one_based() {
        let u = Language::En.option_echo(0, "Muumimamma");
        assert_eq!(u.text, "Selected option 1. Muumimamma");
    }

    #[test]
    fn test_verdict_wrong_names_correct_option() {
        let u = Language::En.verdict(false, false, "Muumimamma");
        assert_eq!(u.text, "Wrong. Correct answer was: Muumimamma");
    }

    #[test]
    fn test_verdict_timeout_prefix() {
        let u = Language::En.verdict(false, true, "Muumimamma");
        assert_eq!(u.text, "Time's up. Wrong. Correct answer was: Muumimamma");
        let u = Language::Fi.verdict(true, true, "Muumimamma");
        assert_eq!(u.text, "Aika loppui. Oikein!");
    }

    #[test]
    fn test_summary_counts() {
        assert_eq!(Language::En.summary(3, 10).text, "You got 3/10 correct");
        assert_eq!(Language::Fi.summary(1, 1).text, "Sait 1/1 oikein");
    }

    #[test]
    fn test_grade_thresholds_scale_with_length() {
        // 1/5 = 20% sits on the poor boundary regardless of session length
        assert_eq!(Language::En.grade(1, 5).text, "poor");
        assert_eq!(Language::En.grade(2, 5).text, "fair");
        assert_eq!(Language::En.grade(7, 10).text, "good");
        assert_eq!(Language::En.grade(9, 10).text, "excellent");
        assert_eq!(Language::En.grade(10, 10).text, "perfect");
        assert_eq!(Language::En.grade(20, 20).text, "perfect");
    }

    #[test]
    fn test_count_words_and_digit_fallback() {
        assert_eq!(Language::Fi.count_word(3).text, "kolme");
        assert_eq!(Language::En.count_word(1).text, "one");
        assert_eq!(Language::En.count_word(7).text, "7");
    }
}
