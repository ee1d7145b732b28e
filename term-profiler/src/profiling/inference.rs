//! Type inference over a column's non-null sample.
//!
//! Each sampled value is tested against the coercions in priority order
//! boolean, integer, float, date/time. The first coercion reached by at
//! least `majority_threshold` of the sample wins; text always succeeds and
//! is the fallback.

use std::collections::BTreeSet;

use tracing::debug;

use crate::batch::{CellValue, Column};
use crate::config::{InferenceConfig, RuleConfig, SamplingStrategy};
use crate::profiling::datetime::parse_datetime;
use crate::profiling::types::{CoercionKind, InferredType, TypeAnalysis};

/// Per-sample coercion tallies.
#[derive(Debug, Default)]
struct CoercionCounts {
    boolean: usize,
    integer: usize,
    float: usize,
    date: usize,
    formats: Vec<(String, usize)>,
}

impl CoercionCounts {
    fn record_format(&mut self, format: &str) {
        match self.formats.iter_mut().find(|(f, _)| f == format) {
            Some((_, count)) => *count += 1,
            None => self.formats.push((format.to_string(), 1)),
        }
    }
}

/// Infers the dominant type of a column.
pub fn infer_type(column: &Column, config: &RuleConfig) -> TypeAnalysis {
    let native_kinds: Vec<_> = column
        .non_null()
        .filter_map(CellValue::kind)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let non_null: Vec<&CellValue> = column.non_null().collect();
    let sample = draw_sample(&non_null, &config.inference);

    if sample.is_empty() {
        return TypeAnalysis {
            inferred_type: InferredType::Unknown,
            coercion: None,
            type_consistency_rate: 0.0,
            sampled_count: 0,
            type_mismatch_count: 0,
            detected_formats: Vec::new(),
            native_kinds,
        };
    }

    let mut counts = CoercionCounts::default();
    for value in &sample {
        if coerce_bool(value, &config.inference).is_some() {
            counts.boolean += 1;
        }
        if is_integer(value) {
            counts.integer += 1;
        }
        if value.as_f64().is_some() {
            counts.float += 1;
        }
        if let Some(format) = date_format_of(value, config) {
            counts.date += 1;
            counts.record_format(&format);
        }
    }

    let total = sample.len();
    let threshold = config.inference.majority_threshold;
    let reaches = |count: usize| count as f64 / total as f64 >= threshold;

    let coercion = if reaches(counts.boolean) {
        CoercionKind::Boolean
    } else if reaches(counts.integer) {
        CoercionKind::Integer
    } else if reaches(counts.float) {
        CoercionKind::Float
    } else if reaches(counts.date) {
        CoercionKind::DateTime
    } else {
        CoercionKind::Text
    };

    // Integers and floats are one family, so every number is consistent
    // with a numeric column.
    let consistent = match coercion {
        CoercionKind::Boolean => counts.boolean,
        CoercionKind::Integer | CoercionKind::Float => counts.float,
        CoercionKind::DateTime => counts.date,
        CoercionKind::Text => total,
    };

    // Stable sort keeps first-seen order among equally frequent formats.
    let mut formats = counts.formats;
    formats.sort_by(|a, b| b.1.cmp(&a.1));

    debug!(
        column = %column.name,
        coercion = ?coercion,
        sampled = total,
        consistent,
        "Inferred column type"
    );

    TypeAnalysis {
        inferred_type: coercion.inferred_type(),
        coercion: Some(coercion),
        type_consistency_rate: consistent as f64 / total as f64,
        sampled_count: total,
        type_mismatch_count: total - consistent,
        detected_formats: formats.into_iter().map(|(f, _)| f).collect(),
        native_kinds,
    }
}

/// Draws the inference sample from the non-null values.
fn draw_sample<'a>(non_null: &[&'a CellValue], config: &InferenceConfig) -> Vec<&'a CellValue> {
    let cap = config.sample_size;
    if non_null.len() <= cap {
        return non_null.to_vec();
    }
    match config.sampling {
        SamplingStrategy::Head => non_null[..cap].to_vec(),
        SamplingStrategy::Uniform => (0..cap)
            .map(|i| non_null[i * non_null.len() / cap])
            .collect(),
    }
}

/// Boolean view of a cell: native booleans and the configured text tokens.
pub fn coerce_bool(value: &CellValue, config: &InferenceConfig) -> Option<bool> {
    match value {
        CellValue::Bool(b) => Some(*b),
        CellValue::Text(s) => {
            let token = s.trim().to_lowercase();
            if config.true_tokens.iter().any(|t| t.eq_ignore_ascii_case(&token)) {
                Some(true)
            } else if config.false_tokens.iter().any(|t| t.eq_ignore_ascii_case(&token)) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_integer(value: &CellValue) -> bool {
    match value {
        CellValue::Int(_) => true,
        CellValue::Float(f) => f.is_finite() && f.fract() == 0.0,
        CellValue::Text(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

/// The date format a cell parses with, `native` for date cells.
fn date_format_of(value: &CellValue, config: &RuleConfig) -> Option<String> {
    match value {
        CellValue::Date(_) => Some("native".to_string()),
        CellValue::Text(s) => parse_datetime(s, &config.datetime.formats).map(|p| p.format),
        _ => None,
    }
}
