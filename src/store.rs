//! Persistence seam and best-score bookkeeping
//!
//! The engine persists two things: the theme set and one best score per
//! theme key. Both go through [`ThemeStore`]; the browser embedding backs
//! it with local storage, tests and native harnesses use [`MemoryStore`].
//! Store failures are not errors the engine can act on; an implementation
//! that cannot persist simply behaves as an empty store.

use std::{cell::RefCell, collections::HashMap};

use crate::theme::Theme;

/// Storage collaborator
///
/// All methods take `&self`; implementations over platform storage use
/// interior mutability, which is safe under the engine's single-threaded
/// execution model.
pub trait ThemeStore {
    /// Loads the persisted theme set, `None` when nothing is stored
    fn load_themes(&self) -> Option<Vec<Theme>>;

    /// Persists the full theme set
    fn save_themes(&self, themes: &[Theme]);

    /// Loads the best score for a theme key, zero when absent
    fn load_best_score(&self, key: &str) -> usize;

    /// Persists the best score for a theme key
    fn save_best_score(&self, key: &str, score: usize);
}

/// Writes a best score only on strict improvement
///
/// Returns `true` when a new record was written, which the caller
/// announces to the player.
pub fn record_best<S: ThemeStore>(store: &S, key: &str, score: usize) -> bool {
    if score > store.load_best_score(key) {
        store.save_best_score(key, score);
        true
    } else {
        false
    }
}

/// Volatile in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    themes: RefCell<Option<Vec<Theme>>>,
    best_scores: RefCell<HashMap<String, usize>>,
}

impl ThemeStore for MemoryStore {
    fn load_themes(&self) -> Option<Vec<Theme>> {
        self.themes.borrow().clone()
    }

    fn save_themes(&self, themes: &[Theme]) {
        *self.themes.borrow_mut() = Some(themes.to_vec());
    }

    fn load_best_score(&self, key: &str) -> usize {
        self.best_scores.borrow().get(key).copied().unwrap_or(0)
    }

    fn save_best_score(&self, key: &str, score: usize) {
        self.best_scores.borrow_mut().insert(key.to_owned(), score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        assert!(store.load_themes().is_none());
        let themes = vec![Theme::new("Muumit")];
        store.save_themes(&themes);
        assert_eq!(store.load_themes().unwrap()[0].name, "Muumit");
    }

    #[test]
    fn test_record_best_requires_strict_improvement() {
        let store = MemoryStore::default();
        assert_eq!(store.load_best_score("muumit"), 0);
        assert!(record_best(&store, "muumit", 3));
        assert_eq!(store.load_best_score("muumit"), 3);
        assert!(!record_best(&store, "muumit", 3));
        assert!(!record_best(&store, "muumit", 2));
        assert_eq!(store.load_best_score("muumit"), 3);
        assert!(record_best(&store, "muumit", 4));
        assert_eq!(store.load_best_score("muumit"), 4);
    }

    #[test]
    fn test_zero_score_never_writes() {
        let store = MemoryStore::default();
        assert!(!record_best(&store, "default", 0));
        assert_eq!(store.load_best_score("default"), 0);
    }
}
