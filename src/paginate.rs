//! Offset pagination over an already-ordered result set.

use std::ops::Range;

pub const QUESTIONS_PER_PAGE: usize = 10;

/// Interpret a raw `page` query value. Absent or non-numeric input means page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// Index range covered by `page` (1-based), clipped to `len`.
/// Pages below 1, or past the end, give an empty range.
pub fn page_range(page: i64, len: usize) -> Range<usize> {
    if page < 1 {
        return 0..0;
    }
    let start = usize::try_from(page - 1)
        .ok()
        .and_then(|p| p.checked_mul(QUESTIONS_PER_PAGE))
        .unwrap_or(usize::MAX)
        .min(len);
    let end = start.saturating_add(QUESTIONS_PER_PAGE).min(len);
    start..end
}

/// The items on `page`. Never fails; the caller decides whether an empty page
/// is an error.
pub fn paginate<T: Clone>(items: &[T], page: i64) -> Vec<T> {
    items[page_range(page, items.len())].to_vec()
}
