//! Rule catalog and dependency resolution.
//!
//! Attribute-level rules are leaves that run per column; dataset-level
//! rules form the final aggregation stage. A rule that is disabled but
//! needed by an enabled rule is still computed, it just isn't emitted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::Rulesets;

/// Every rule group the engine knows, in a valid execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    ColumnStatistics,
    DataTypeAnalysis,
    NumericAnalysis,
    StringAnalysis,
    DateTimeAnalysis,
    ValueDistribution,
    PiiDetection,
    ColumnQuality,
    DatasetStatistics,
    CandidateKeys,
    ReferentialIntegrity,
    DatasetQuality,
}

/// Granularity at which a rule produces output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLevel {
    Attribute,
    Dataset,
}

impl RuleKind {
    pub const ALL: [RuleKind; 12] = [
        RuleKind::ColumnStatistics,
        RuleKind::DataTypeAnalysis,
        RuleKind::NumericAnalysis,
        RuleKind::StringAnalysis,
        RuleKind::DateTimeAnalysis,
        RuleKind::ValueDistribution,
        RuleKind::PiiDetection,
        RuleKind::ColumnQuality,
        RuleKind::DatasetStatistics,
        RuleKind::CandidateKeys,
        RuleKind::ReferentialIntegrity,
        RuleKind::DatasetQuality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::ColumnStatistics => "column_statistics",
            RuleKind::DataTypeAnalysis => "data_type_analysis",
            RuleKind::NumericAnalysis => "numeric_analysis",
            RuleKind::StringAnalysis => "string_analysis",
            RuleKind::DateTimeAnalysis => "date_time_analysis",
            RuleKind::ValueDistribution => "value_distribution",
            RuleKind::PiiDetection => "pii_detection",
            RuleKind::ColumnQuality => "column_quality",
            RuleKind::DatasetStatistics => "dataset_statistics",
            RuleKind::CandidateKeys => "candidate_keys",
            RuleKind::ReferentialIntegrity => "referential_integrity",
            RuleKind::DatasetQuality => "dataset_quality",
        }
    }

    pub fn level(&self) -> RuleLevel {
        match self {
            RuleKind::DatasetStatistics
            | RuleKind::CandidateKeys
            | RuleKind::ReferentialIntegrity
            | RuleKind::DatasetQuality => RuleLevel::Dataset,
            _ => RuleLevel::Attribute,
        }
    }

    /// Rules whose output this rule consumes.
    pub fn dependencies(&self) -> &'static [RuleKind] {
        match self {
            RuleKind::ColumnStatistics
            | RuleKind::DataTypeAnalysis
            | RuleKind::PiiDetection
            | RuleKind::DatasetStatistics
            | RuleKind::CandidateKeys
            | RuleKind::ReferentialIntegrity => &[],
            RuleKind::NumericAnalysis
            | RuleKind::StringAnalysis
            | RuleKind::DateTimeAnalysis
            | RuleKind::ValueDistribution => &[RuleKind::DataTypeAnalysis],
            RuleKind::ColumnQuality => &[
                RuleKind::ColumnStatistics,
                RuleKind::DataTypeAnalysis,
                RuleKind::NumericAnalysis,
                RuleKind::StringAnalysis,
                RuleKind::DateTimeAnalysis,
            ],
            RuleKind::DatasetQuality => &[RuleKind::ColumnQuality, RuleKind::PiiDetection],
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The resolved set of rules for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePlan {
    enabled: BTreeSet<RuleKind>,
    required: BTreeSet<RuleKind>,
}

impl RulePlan {
    /// Resolves the enabled rules and the transitive closure of their dependencies.
    pub fn resolve(rulesets: &Rulesets) -> Self {
        let enabled: BTreeSet<RuleKind> = RuleKind::ALL
            .into_iter()
            .filter(|kind| rulesets.is_enabled(*kind))
            .collect();

        let mut required = BTreeSet::new();
        let mut stack: Vec<RuleKind> = enabled.iter().copied().collect();
        while let Some(kind) = stack.pop() {
            if required.insert(kind) {
                stack.extend(kind.dependencies().iter().copied());
            }
        }

        Self { enabled, required }
    }

    /// Whether the rule's output appears in the profile.
    pub fn emits(&self, kind: RuleKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Whether the rule runs at all, either for output or as a dependency.
    pub fn computes(&self, kind: RuleKind) -> bool {
        self.required.contains(&kind)
    }

    /// Whether any attribute-level rule has to run.
    pub fn has_column_stage(&self) -> bool {
        self.required
            .iter()
            .any(|kind| kind.level() == RuleLevel::Attribute)
    }

    pub fn enabled(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.enabled.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_topologically_ordered() {
        for (position, kind) in RuleKind::ALL.iter().enumerate() {
            for dependency in kind.dependencies() {
                let dep_position = RuleKind::ALL
                    .iter()
                    .position(|k| k == dependency)
                    .unwrap();
                assert!(
                    dep_position < position,
                    "{dependency} must precede {kind}"
                );
            }
        }
    }

    #[test]
    fn test_disabled_dependency_is_computed_not_emitted() {
        let mut rulesets = Rulesets::default();
        rulesets.set(RuleKind::DataTypeAnalysis, false);
        rulesets.set(RuleKind::NumericAnalysis, false);

        let plan = RulePlan::resolve(&rulesets);
        assert!(!plan.emits(RuleKind::DataTypeAnalysis));
        assert!(plan.computes(RuleKind::DataTypeAnalysis));
        assert!(plan.computes(RuleKind::NumericAnalysis));
    }

    #[test]
    fn test_nothing_enabled() {
        let rulesets = Rulesets::none();
        let plan = RulePlan::resolve(&rulesets);
        assert_eq!(plan.enabled().count(), 0);
        assert!(!plan.has_column_stage());
    }

    #[test]
    fn test_dataset_quality_pulls_column_stage() {
        let rulesets = Rulesets::none().with(RuleKind::DatasetQuality, true);
        let plan = RulePlan::resolve(&rulesets);
        assert!(plan.computes(RuleKind::ColumnQuality));
        assert!(plan.computes(RuleKind::PiiDetection));
        assert!(plan.computes(RuleKind::StringAnalysis));
        assert!(!plan.computes(RuleKind::ValueDistribution));
        assert!(plan.has_column_stage());
    }
}
