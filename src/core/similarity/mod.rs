//! # Similarity Module
//!
//! Scores how close two filenames are, 0-100.
//!
//! The score is tiered:
//! 1. identical strings score 100
//! 2. if one string contains the other, the score is the length ratio
//! 3. otherwise it is the share of characters the two strings have in
//!    common, counted as a multiset
//!
//! This is not an edit distance. Character order is ignored, so anagrams
//! score 100.

/// Score two strings against each other.
///
/// Comparison is case-sensitive; callers that want case-insensitive matching
/// lower-case both sides first (see [`score_ignore_case`]).
///
/// ```
/// use digital_ingest::core::similarity::score;
///
/// assert_eq!(score("photo1.jpg", "photo1.jpg"), 100);
/// assert_eq!(score("photo1", "photo1.jpg"), 60);
/// ```
pub fn score(a: &str, b: &str) -> u8 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 && b_len == 0 {
        return 0;
    }

    if a == b {
        return 100;
    }

    let longest = a_len.max(b_len);

    if a.contains(b) || b.contains(a) {
        return percent(a_len.min(b_len), longest);
    }

    percent(shared_characters(a, b), longest)
}

/// [`score`] after lower-casing both sides.
pub fn score_ignore_case(a: &str, b: &str) -> u8 {
    score(&a.to_lowercase(), &b.to_lowercase())
}

/// Count characters of `a` that pair off one-for-one with characters of `b`.
fn shared_characters(a: &str, b: &str) -> usize {
    let mut remaining: Vec<char> = b.chars().collect();
    let mut matched = 0;

    for c in a.chars() {
        if let Some(pos) = remaining.iter().position(|&r| r == c) {
            remaining.swap_remove(pos);
            matched += 1;
        }
    }

    matched
}

/// `round(100 * part / whole)` with halves rounding up. `whole` is never 0.
fn percent(part: usize, whole: usize) -> u8 {
    ((200 * part + whole) / (2 * whole)) as u8
}
