//! Regex and column-name heuristic PII scoring.
//!
//! This is a heuristic classifier, not a guarantee. Both false positives
//! (a five digit product code read as a postal code) and false negatives
//! (an address without a recognizable shape) are expected; tune the catalog,
//! keywords and weights in [`PiiConfig`] for the data at hand.

use crate::batch::{CellValue, Column};
use crate::config::{CompiledPiiPattern, PiiConfig, PiiValidator};
use crate::profiling::statistics::ratio;
use crate::profiling::types::{PiiCategoryMatch, PiiFinding, RiskLevel};

/// Scores one column against the compiled catalog.
pub fn detect_pii(
    column: &Column,
    patterns: &[CompiledPiiPattern],
    config: &PiiConfig,
) -> PiiFinding {
    let mut categories: Vec<PiiCategoryMatch> = Vec::new();
    for pattern in patterns {
        if !categories.iter().any(|c| c.category == pattern.category) {
            categories.push(PiiCategoryMatch {
                category: pattern.category.clone(),
                match_count: 0,
            });
        }
    }

    let mut non_null_count = 0;
    let mut matched_count = 0;
    let mut sample_values = Vec::new();

    for value in column.non_null() {
        non_null_count += 1;
        let text = value.to_string();
        let is_text = matches!(value, CellValue::Text(_));
        let mut matched_categories: Vec<&str> = Vec::new();

        for pattern in patterns {
            if matched_categories.contains(&pattern.category.as_str())
                || (pattern.text_only && !is_text)
            {
                continue;
            }
            if pattern_matches(pattern, &text) {
                matched_categories.push(&pattern.category);
            }
        }

        if matched_categories.is_empty() {
            continue;
        }
        matched_count += 1;
        for category in &mut categories {
            if matched_categories.contains(&category.category.as_str()) {
                category.match_count += 1;
            }
        }
        if sample_values.len() < config.max_samples {
            sample_values.push(text);
        }
    }

    let match_rate = ratio(matched_count, non_null_count);
    let matched_keyword = name_keyword(&column.name, config);
    let name_hint = if matched_keyword.is_some() {
        config.name_hint_bonus
    } else {
        0.0
    };
    let confidence_score = (config.match_weight * match_rate + name_hint).clamp(0.0, 1.0);

    categories.retain(|c| c.match_count > 0);

    PiiFinding {
        matched_count,
        match_rate,
        name_hint,
        matched_keyword,
        confidence_score,
        risk_level: risk_level(confidence_score, config),
        pii_categories: categories,
        sample_values,
    }
}

/// Buckets a confidence score: Low below the medium threshold, Medium up to
/// and including the high threshold, High above it.
pub fn risk_level(score: f64, config: &PiiConfig) -> RiskLevel {
    if score < config.medium_threshold {
        RiskLevel::Low
    } else if score <= config.high_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

fn pattern_matches(pattern: &CompiledPiiPattern, text: &str) -> bool {
    match pattern.validator {
        None => pattern.regex.is_match(text),
        Some(PiiValidator::Luhn) => pattern
            .regex
            .find_iter(text)
            .any(|m| luhn_valid(m.as_str())),
    }
}

/// The first configured keyword contained in the lower-cased column name.
fn name_keyword(column_name: &str, config: &PiiConfig) -> Option<String> {
    let name = column_name.to_lowercase();
    config
        .name_keywords
        .iter()
        .find(|keyword| name.contains(keyword.to_lowercase().as_str()))
        .cloned()
}

/// Luhn checksum over the digits of `candidate`, ignoring separators.
pub fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(12..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                *d
            }
        })
        .sum();
    sum % 10 == 0
}
