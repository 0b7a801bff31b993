//! Question-pack import and export
//!
//! The interchange shape is a flat JSON list of question records with a
//! `theme` tag on each record; field names vary between pack authors
//! (`question` vs `questionText`, `answerIndex` vs `correctIndex`), so
//! normalization to the canonical [`Question`] happens entirely here, and the
//! rest of the engine never sees alternate spellings. A line-oriented
//! alternate format (`Question|opt1;opt2;opt3|correctIndex`) serves quick
//! authoring and is the fallback when a payload is not JSON.
//!
//! Imports never abort on bad data: malformed records are skipped with a
//! warning and the usable remainder goes through.

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::theme::{Difficulty, Question, Theme};

/// Theme name applied to records that carry none
const FALLBACK_THEME: &str = "Imported";

/// One record in the interchange shape
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackRecord {
    /// Question text (`questionText`, or legacy `question`)
    #[serde(alias = "question")]
    pub question_text: String,
    /// Answer options; a missing list marks the record unusable
    #[serde(default)]
    pub options: Vec<String>,
    /// Correct option index (`correctIndex`, or legacy `answerIndex`)
    #[serde(default, alias = "answerIndex")]
    pub correct_index: usize,
    /// Theme name this record belongs to
    pub theme: Option<String>,
    /// Optional difficulty metadata; unknown values collapse to absent
    #[serde(default, deserialize_with = "lenient_difficulty")]
    pub difficulty: Option<Difficulty>,
    /// Optional attribution
    pub source: Option<String>,
}

/// Why a payload produced nothing
#[derive(Debug, Error)]
pub enum PackError {
    /// Neither JSON nor the line format yielded a single usable record
    #[error("payload contains no usable question records")]
    NoUsableRecords,
}

#[derive(Debug, Deserialize)]
struct PackFile {
    #[serde(default)]
    questions: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct PackFileOut<'a> {
    questions: Vec<ExportRecord<'a>>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRecord<'a> {
    question_text: &'a str,
    options: &'a [String],
    correct_index: usize,
    theme: &'a str,
    difficulty: Option<Difficulty>,
    source: Option<&'a str>,
}

/// Parses a payload in either supported format
///
/// JSON is tried first; anything else is treated as line-format text, one
/// record per line. Records that fail to normalize are skipped.
///
/// # Errors
///
/// [`PackError::NoUsableRecords`] when nothing usable came out, so the
/// caller can report a failed import without having touched any theme.
pub fn parse(text: &str) -> Result<Vec<PackRecord>, PackError> {
    let records = match serde_json::from_str::<PackFile>(text) {
        Ok(file) => file
            .questions
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<PackRecord>(value) {
                Ok(record) => Some(record),
                Err(error) => {
                    log::warn!("skipping malformed pack record: {error}");
                    None
                }
            })
            .collect_vec(),
        Err(_) => parse_lines(text),
    };
    let records = records.into_iter().filter(record_is_usable).collect_vec();
    if records.is_empty() {
        return Err(PackError::NoUsableRecords);
    }
    Ok(records)
}

/// Parses the line-oriented authoring format
///
/// `Question|opt1;opt2;opt3|correctIndex`; blank lines and lines with
/// fewer than three fields are skipped. An unparsable index defaults to 0.
pub fn parse_lines(text: &str) -> Vec<PackRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(3, '|');
            let question_text = parts.next()?.trim();
            let options = parts.next()?;
            let index = parts.next()?;
            if question_text.is_empty() {
                return None;
            }
            Some(PackRecord {
                question_text: question_text.to_owned(),
                options: options
                    .split(';')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_owned)
                    .collect_vec(),
                correct_index: index.trim().parse().unwrap_or(0),
                theme: None,
                difficulty: None,
                source: None,
            })
        })
        .collect_vec()
}

/// Merges records into a theme set, grouping by theme name
///
/// Records join an existing theme with the same name or create a new one,
/// preserving record order within each theme. Returns the number of
/// questions added; partial success is the normal case for messy packs.
pub fn merge_into(themes: &mut Vec<Theme>, records: Vec<PackRecord>) -> usize {
    let mut added = 0;
    for record in records {
        let Some(question) = normalize(record.clone()) else {
            continue;
        };
        let name = record.theme.as_deref().unwrap_or(FALLBACK_THEME);
        let theme = match themes.iter_mut().find(|t| t.name == name) {
            Some(theme) => theme,
            None => {
                themes.push(Theme::new(name));
                themes.last_mut().expect("theme was just pushed")
            }
        };
        theme.questions.push(question);
        added += 1;
    }
    added
}

/// Flattens a theme set back into the interchange JSON shape
///
/// # Panics
///
/// Panics if serialization fails, which cannot happen for well-formed
/// themes with the default serializer.
pub fn export_json(themes: &[Theme]) -> String {
    let out = PackFileOut {
        questions: themes
            .iter()
            .flat_map(|theme| {
                theme.questions.iter().map(|q| ExportRecord {
                    question_text: &q.question_text,
                    options: &q.options,
                    correct_index: q.correct_index,
                    theme: &theme.name,
                    difficulty: q.difficulty,
                    source: q.source.as_deref(),
                })
            })
            .collect_vec(),
    };
    serde_json::to_string_pretty(&out).expect("default serializer cannot fail")
}

/// The theme set seeded on first run, when the store is empty
pub fn seed_themes() -> Vec<Theme> {
    let mut muumit = Theme::new("Muumit");
    muumit.questions.push(Question {
        question_text: "Kuka on Muumipapan puoliso?".to_owned(),
        options: vec![
            "Muumimamma".to_owned(),
            "Niiskuneiti".to_owned(),
            "Pikku Myy".to_owned(),
        ],
        correct_index: 0,
        difficulty: Some(Difficulty::Easy),
        source: None,
    });
    vec![muumit]
}

fn record_is_usable(record: &PackRecord) -> bool {
    let usable = normalize(record.clone()).is_some();
    if !usable {
        log::warn!("skipping unusable pack record: {:?}", record.question_text);
    }
    usable
}

/// Converts a record to the canonical question shape, or rejects it
///
/// Shape limits (text and option lengths, option count) come from the
/// validation rules on [`Question`]; the index bound check is separate
/// because it spans two fields.
fn normalize(record: PackRecord) -> Option<Question> {
    let question = Question {
        question_text: record.question_text,
        options: record.options,
        correct_index: record.correct_index,
        difficulty: record.difficulty,
        source: record.source,
    };
    if question.validate().is_err() || !question.is_playable() {
        return None;
    }
    Some(question)
}

fn lenient_difficulty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Difficulty>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.as_str() {
        "easy" => Some(Difficulty::Easy),
        "normal" => Some(Difficulty::Normal),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_import_skips_malformed_record() {
        let payload = r#"{
            "questions": [
                { "questionText": "Kuka on Muumipapan puoliso?",
                  "options": ["Muumimamma", "Niiskuneiti", "Pikku Myy"],
                  "correctIndex": 0,
                  "theme": "Muumit" },
                { "questionText": "rikkinäinen", "correctIndex": 1 }
            ]
        }"#;
        let records = parse(payload).unwrap();
        assert_eq!(records.len(), 1);
        let mut themes = Vec::new();
        assert_eq!(merge_into(&mut themes, records), 1);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Muumit");
        assert_eq!(themes[0].questions.len(), 1);
    }

    #[test]
    fn test_json_import_accepts_alias_field_names() {
        let payload = r#"{
            "questions": [
                { "question": "Mikä?", "options": ["a", "b"], "answerIndex": 1 }
            ]
        }"#;
        let records = parse(payload).unwrap();
        assert_eq!(records[0].question_text, "Mikä?");
        assert_eq!(records[0].correct_index, 1);
    }

    #[test]
    fn test_unknown_difficulty_collapses_to_absent() {
        let payload = r#"{
            "questions": [
                { "questionText": "Mikä?", "options": ["a", "b"],
                  "correctIndex": 0, "difficulty": "impossible" }
            ]
        }"#;
        let records = parse(payload).unwrap();
        assert_eq!(records[0].difficulty, None);
    }

    #[test]
    fn test_out_of_bounds_correct_index_is_skipped() {
        let payload = r#"{
            "questions": [
                { "questionText": "Mikä?", "options": ["a", "b"], "correctIndex": 5 }
            ]
        }"#;
        assert!(matches!(parse(payload), Err(PackError::NoUsableRecords)));
    }

    #[test]
    fn test_line_format_parses() {
        let records = parse("Kuka?|Muumimamma;Niiskuneiti|0\n\nMikä?|a;b;c|2\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].options.len(), 2);
        assert_eq!(records[1].correct_index, 2);
    }

    #[test]
    fn test_line_format_bad_index_defaults_to_zero() {
        let records = parse_lines("Kuka?|a;b|eka");
        assert_eq!(records[0].correct_index, 0);
    }

    #[test]
    fn test_garbage_payload_reports_no_usable_records() {
        assert!(matches!(parse("pelkkää roskaa"), Err(PackError::NoUsableRecords)));
    }

    #[test]
    fn test_merge_groups_by_theme_name() {
        let payload = r#"{
            "questions": [
                { "questionText": "a?", "options": ["x", "y"], "correctIndex": 0, "theme": "A" },
                { "questionText": "b?", "options": ["x", "y"], "correctIndex": 0, "theme": "B" },
                { "questionText": "c?", "options": ["x", "y"], "correctIndex": 1, "theme": "A" },
                { "questionText": "d?", "options": ["x", "y"], "correctIndex": 0 }
            ]
        }"#;
        let mut themes = Vec::new();
        assert_eq!(merge_into(&mut themes, parse(payload).unwrap()), 4);
        assert_eq!(themes.len(), 3);
        assert_eq!(themes[0].name, "A");
        assert_eq!(themes[0].questions.len(), 2);
        assert_eq!(themes[1].name, "B");
        assert_eq!(themes[2].name, FALLBACK_THEME);
    }

    #[test]
    fn test_merge_appends_to_existing_theme() {
        let mut themes = seed_themes();
        let records = parse("Uusi?|a;b|1").unwrap();
        let mut tagged = records;
        tagged[0].theme = Some("Muumit".to_owned());
        assert_eq!(merge_into(&mut themes, tagged), 1);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].questions.len(), 2);
    }

    #[test]
    fn test_export_round_trips_through_parse() {
        let themes = seed_themes();
        let json = export_json(&themes);
        let records = parse(&json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].theme.as_deref(), Some("Muumit"));
        assert_eq!(records[0].difficulty, Some(Difficulty::Easy));
        let mut rebuilt = Vec::new();
        merge_into(&mut rebuilt, records);
        assert_eq!(rebuilt[0].questions, themes[0].questions);
    }

    #[test]
    fn test_seed_theme_is_playable() {
        let themes = seed_themes();
        assert_eq!(themes[0].id, "muumit");
        assert!(themes[0].is_playable());
    }
}
