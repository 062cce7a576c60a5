//! Case-insensitive substring search over question text.

use crate::db::Question;

/// A usable search term, or `None` when the input should not trigger a search.
pub fn normalize_term(raw: Option<&str>) -> Option<&str> {
    raw.filter(|t| !t.is_empty())
}

/// Keep questions whose text contains `term`, ignoring case. Input order is kept.
pub fn filter_questions(questions: Vec<Question>, term: &str) -> Vec<Question> {
    let needle = term.to_lowercase();
    questions
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&needle))
        .collect()
}
