//! String length, whitespace, character set and pattern statistics.
//!
//! Every figure is computed over the string form of the non-null values;
//! lengths count characters, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::batch::Column;
use crate::config::CompiledPattern;
use crate::profiling::statistics::percentage;
use crate::profiling::types::{CharacterSetSummary, PatternFrequency, StringStats};

/// Anything outside word characters, whitespace, `-` and `.`.
static SPECIAL_CHARACTER: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[^\w\s\-.]").expect("Hard-coded regex pattern should be valid")
});

/// Computes the string block.
pub fn string_stats(
    column: &Column,
    patterns: &[CompiledPattern],
    top_patterns: usize,
) -> StringStats {
    let values: Vec<String> = column.non_null().map(ToString::to_string).collect();
    let count = values.len();

    let mut min_length = usize::MAX;
    let mut max_length = 0;
    let mut total_length = 0;
    let mut stats = StringStats {
        count,
        min_length: 0,
        max_length: 0,
        avg_length: 0.0,
        empty_count: 0,
        whitespace_only_count: 0,
        leading_whitespace_count: 0,
        trailing_whitespace_count: 0,
        untrimmed_count: 0,
        character_set: CharacterSetSummary::default(),
        top_patterns: Vec::new(),
        lowercase_count: 0,
        uppercase_count: 0,
        mixed_case: false,
        special_character_count: 0,
    };
    let mut pattern_counts = vec![0usize; patterns.len()];

    for value in &values {
        let length = value.chars().count();
        min_length = min_length.min(length);
        max_length = max_length.max(length);
        total_length += length;

        if value.is_empty() {
            stats.empty_count += 1;
        } else if value.trim().is_empty() {
            stats.whitespace_only_count += 1;
        }

        let leading = value.starts_with(char::is_whitespace);
        let trailing = value.ends_with(char::is_whitespace);
        stats.leading_whitespace_count += usize::from(leading);
        stats.trailing_whitespace_count += usize::from(trailing);
        stats.untrimmed_count += usize::from(leading || trailing);

        for c in value.chars() {
            let bucket = if c.is_ascii_alphanumeric() {
                &mut stats.character_set.ascii_alphanumeric
            } else if c.is_ascii_whitespace() {
                &mut stats.character_set.ascii_whitespace
            } else if c.is_ascii() {
                &mut stats.character_set.ascii_special
            } else {
                &mut stats.character_set.non_ascii
            };
            *bucket += 1;
        }

        let has_lower = value.chars().any(char::is_lowercase);
        let has_upper = value.chars().any(char::is_uppercase);
        stats.lowercase_count += usize::from(has_lower && !has_upper);
        stats.uppercase_count += usize::from(has_upper && !has_lower);

        if SPECIAL_CHARACTER.is_match(value) {
            stats.special_character_count += 1;
        }

        for (slot, pattern) in pattern_counts.iter_mut().zip(patterns) {
            if pattern.regex.is_match(value) {
                *slot += 1;
            }
        }
    }

    if count > 0 {
        stats.min_length = min_length;
        stats.max_length = max_length;
        stats.avg_length = total_length as f64 / count as f64;
    }
    stats.mixed_case = stats.lowercase_count > 0 && stats.uppercase_count > 0;

    let mut matched: Vec<PatternFrequency> = patterns
        .iter()
        .zip(pattern_counts)
        .filter(|(_, matches)| *matches > 0)
        .map(|(pattern, matches)| PatternFrequency {
            pattern: pattern.name.clone(),
            count: matches,
            percentage: percentage(matches, count),
        })
        .collect();
    // Stable: ties keep catalog order.
    matched.sort_by(|a, b| b.count.cmp(&a.count));
    matched.truncate(top_patterns);
    stats.top_patterns = matched;

    stats
}
