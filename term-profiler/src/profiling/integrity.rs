//! Referential integrity checks for declared foreign-key pairs.
//!
//! Declarations are supplied by the caller; nothing here discovers foreign
//! keys. Values are compared by their canonical join key, so an integer id
//! matches the same id stored as text.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use crate::batch::{Column, TabularBatch};
use crate::config::ForeignKeyDeclaration;
use crate::error::{ProfilerError, Result};
use crate::profiling::types::{
    FindingKind, IntegrityFinding, IntegrityStatus, ReferentialIntegrityReport,
    ReferentialIntegrityResult,
};

/// Resolves `column` or `entity.column` against the profiled batch first,
/// then against the related batches.
pub fn resolve_column<'a>(
    reference: &str,
    batch: &'a TabularBatch,
    related: &'a [TabularBatch],
) -> Option<&'a Column> {
    if let Some(column) = batch.column(reference) {
        return Some(column);
    }
    let (entity, column) = reference.rsplit_once('.')?;
    std::iter::once(batch)
        .chain(related)
        .find(|b| b.name() == entity)
        .and_then(|b| b.column(column))
}

/// Runs every declared check.
pub fn check_integrity(
    batch: &TabularBatch,
    related: &[TabularBatch],
    declarations: &[ForeignKeyDeclaration],
    max_orphan_samples: usize,
    cancel: &CancellationToken,
) -> Result<ReferentialIntegrityReport> {
    let mut results = Vec::with_capacity(declarations.len());
    let mut findings = Vec::new();

    for declaration in declarations {
        if cancel.is_cancelled() {
            return Err(ProfilerError::Cancelled);
        }

        let child = resolve_column(&declaration.child_column, batch, related);
        let parent = resolve_column(&declaration.parent_column, batch, related);
        let (child, parent) = match (child, parent) {
            (Some(child), Some(parent)) => (child, parent),
            (None, _) => {
                results.push(not_evaluated(declaration, "child column not found"));
                continue;
            }
            (_, None) => {
                results.push(not_evaluated(declaration, "parent column not found"));
                continue;
            }
        };

        let result = check_pair(declaration, child, parent, max_orphan_samples);
        let missing = result.missing_count;
        let match_rate = result.match_rate.unwrap_or(1.0);
        if missing > 0 {
            findings.push(IntegrityFinding {
                kind: FindingKind::OrphanRecords,
                child_column: declaration.child_column.clone(),
                parent_column: declaration.parent_column.clone(),
                message: format!(
                    "{missing} of {} child values have no matching parent",
                    result.non_null_child_count
                ),
            });
        }
        if match_rate < 1.0 {
            findings.push(IntegrityFinding {
                kind: FindingKind::Consistency,
                child_column: declaration.child_column.clone(),
                parent_column: declaration.parent_column.clone(),
                message: format!("Match rate is {:.1}%", match_rate * 100.0),
            });
        }
        results.push(result);
    }

    Ok(ReferentialIntegrityReport { results, findings })
}

fn check_pair(
    declaration: &ForeignKeyDeclaration,
    child: &Column,
    parent: &Column,
    max_orphan_samples: usize,
) -> ReferentialIntegrityResult {
    let parent_keys: HashSet<String> = parent
        .values
        .iter()
        .filter_map(|v| v.join_key())
        .collect();

    let mut non_null_child_count = 0;
    let mut missing_count = 0;
    let mut orphan_samples: Vec<String> = Vec::new();
    for key in child.values.iter().filter_map(|v| v.join_key()) {
        non_null_child_count += 1;
        if parent_keys.contains(&key) {
            continue;
        }
        missing_count += 1;
        if orphan_samples.len() < max_orphan_samples && !orphan_samples.contains(&key) {
            orphan_samples.push(key);
        }
    }

    let match_rate = if non_null_child_count == 0 {
        1.0
    } else {
        1.0 - missing_count as f64 / non_null_child_count as f64
    };

    ReferentialIntegrityResult {
        child_column: declaration.child_column.clone(),
        parent_column: declaration.parent_column.clone(),
        status: IntegrityStatus::Evaluated,
        reason: None,
        non_null_child_count,
        missing_count,
        match_rate: Some(match_rate),
        orphan_samples,
    }
}

fn not_evaluated(
    declaration: &ForeignKeyDeclaration,
    reason: &str,
) -> ReferentialIntegrityResult {
    ReferentialIntegrityResult {
        child_column: declaration.child_column.clone(),
        parent_column: declaration.parent_column.clone(),
        status: IntegrityStatus::NotEvaluated,
        reason: Some(reason.to_string()),
        non_null_child_count: 0,
        missing_count: 0,
        match_rate: None,
        orphan_samples: Vec::new(),
    }
}
