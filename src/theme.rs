//! Themes and questions
//!
//! This module defines the data model the rest of the engine works with:
//! named themes holding ordered multiple-choice questions. Themes come from
//! the persistence store, from pack imports, or from the editor; a running
//! session always holds copies of questions, never references into a theme,
//! so edits cannot corrupt play in progress.

use enum_map::Enum;
use garde::Validate;
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::constants;

/// Difficulty setting controlling the per-question time limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Generous countdown
    Easy,
    /// Standard countdown
    #[default]
    Normal,
    /// Short countdown
    Hard,
}

/// A single multiple-choice question
///
/// `difficulty` and `source` are optional metadata carried through from the
/// pack format; they do not affect play (the session-level difficulty
/// setting controls timing).
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// The question text read to the player
    #[garde(length(min = 1, max = constants::theme::MAX_QUESTION_LENGTH))]
    pub question_text: String,
    /// Ordered answer options
    #[garde(
        length(min = constants::theme::MIN_OPTION_COUNT, max = constants::theme::MAX_OPTION_COUNT),
        inner(length(max = constants::theme::MAX_OPTION_LENGTH))
    )]
    pub options: Vec<String>,
    /// Index into `options` of the correct answer
    #[garde(skip)]
    pub correct_index: usize,
    /// Optional per-question difficulty metadata
    #[garde(skip)]
    pub difficulty: Option<Difficulty>,
    /// Optional attribution
    #[garde(skip)]
    pub source: Option<String>,
}

impl Question {
    /// Whether this question can be presented at all
    ///
    /// Records whose option list came back empty or whose correct index
    /// points outside it are carried in the theme but never enter a
    /// session. Length validation is `garde`'s job; this is the structural
    /// invariant between the two fields.
    pub fn is_playable(&self) -> bool {
        self.options.len() >= constants::theme::MIN_OPTION_COUNT
            && self.correct_index < self.options.len()
    }

    /// The text of the correct option
    ///
    /// # Panics
    ///
    /// Panics if the question is not playable; callers obtain questions
    /// from a session, which only admits playable ones.
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// A named, independently selectable bucket of questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Theme {
    /// Stable identifier, also the best-score storage key
    #[garde(skip)]
    pub id: String,
    /// Display name
    #[garde(length(min = 1, max = constants::theme::MAX_NAME_LENGTH))]
    pub name: String,
    /// Ordered questions
    #[garde(dive)]
    pub questions: Vec<Question>,
}

impl Theme {
    /// Creates an empty theme, deriving its id from the name
    pub fn new(name: &str) -> Self {
        Self {
            id: storage_key(name),
            name: name.to_owned(),
            questions: Vec::new(),
        }
    }

    /// Whether the theme holds at least one playable question
    pub fn is_playable(&self) -> bool {
        self.questions.iter().any(Question::is_playable)
    }
}

/// Derives a stable storage key from a theme name
///
/// Names reduce to a snake_case slug (`"Muumit"` → `"muumit"`); names with
/// no usable characters fall back to a generated id so two such themes
/// never collide in the store.
pub fn storage_key(name: &str) -> String {
    let slug = name.to_snake_case();
    if slug.is_empty() {
        format!("t_{}", Uuid::new_v4())
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, options: &[&str], correct_index: usize) -> Question {
        Question {
            question_text: text.to_owned(),
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            correct_index,
            difficulty: None,
            source: None,
        }
    }

    #[test]
    fn test_valid_question_passes_validation() {
        let q = question("Kuka on Muumipapan puoliso?", &["Muumimamma", "Niiskuneiti"], 0);
        assert!(q.validate().is_ok());
        assert!(q.is_playable());
    }

    #[test]
    fn test_single_option_fails_validation() {
        let q = question("Mikä?", &["ainoa"], 0);
        assert!(q.validate().is_err());
        assert!(!q.is_playable());
    }

    #[test]
    fn test_out_of_bounds_correct_index_is_not_playable() {
        let q = question("Mikä?", &["a", "b"], 2);
        assert!(!q.is_playable());
    }

    #[test]
    fn test_correct_option_text() {
        let q = question("Mikä?", &["a", "b", "c"], 1);
        assert_eq!(q.correct_option(), "b");
    }

    #[test]
    fn test_storage_key_from_name() {
        assert_eq!(storage_key("Muumit"), "muumit");
        assert_eq!(storage_key("Suomen historia"), "suomen_historia");
    }

    #[test]
    fn test_storage_key_fallback_for_unusable_name() {
        let key = storage_key("!!!");
        assert!(key.starts_with("t_"));
        assert_ne!(storage_key("!!!"), key);
    }

    #[test]
    fn test_theme_playability() {
        let mut theme = Theme::new("Muumit");
        assert!(!theme.is_playable());
        theme.questions.push(question("Mikä?", &["a"], 0));
        assert!(!theme.is_playable());
        theme.questions.push(question("Mikä?", &["a", "b"], 0));
        assert!(theme.is_playable());
    }

    #[test]
    fn test_difficulty_serde_names() {
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), "\"easy\"");
        let parsed: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed, Difficulty::Hard);
    }
}
