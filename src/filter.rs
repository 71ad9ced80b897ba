//! Filter engine
//!
//! Narrows a region's records to the ones qualifying for a workload. The
//! predicate is the conjunction of seven independent layers (sizing floor,
//! generation, three allowlists, exclude tokens, architecture exclusion);
//! because each layer is a pure set-membership test on the record, the
//! layers commute and applying them in any order yields the same result
//! set.
//!
//! An empty result is a normal outcome, reported by selection as
//! `NoMatch`, never as an error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Generation, InstanceRecord};
use crate::provider::{Provider, ProviderSpec};

/// Case-insensitive substring exclusion against `instance_type`, scoped
/// to one provider's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludePattern {
    pub provider: Provider,
    #[serde(rename = "type")]
    pub token: String,
}

/// Read-only filter inputs for one invocation.
///
/// `None` or an empty set for an allowlist leaves that layer inert.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub current_generation_only: bool,
    pub allowed_family_names: Option<BTreeSet<String>>,
    pub allowed_processors: Option<BTreeSet<String>>,
    pub allowed_main_families: Option<BTreeSet<String>>,
    pub exclude_patterns: Vec<ExcludePattern>,
    /// Provider-specific ARM/Graviton exclusion.
    pub exclude_architecture: bool,
}

fn allowlist_permits(set: &Option<BTreeSet<String>>, value: &str) -> bool {
    match set {
        Some(allowed) if !allowed.is_empty() => allowed.contains(value),
        _ => true,
    }
}

/// The full seven-layer predicate for one record.
pub fn qualifies(
    spec: &dyn ProviderSpec,
    record: &InstanceRecord,
    required_cpu: u32,
    required_memory: f64,
    options: &FilterOptions,
) -> bool {
    // Sizing floor. Never relaxed.
    if record.vcpus < required_cpu || record.memory_gib < required_memory {
        return false;
    }

    if options.current_generation_only && record.generation != Generation::Current {
        return false;
    }

    if !allowlist_permits(&options.allowed_family_names, &record.family_name) {
        return false;
    }

    if !allowlist_permits(&options.allowed_processors, &record.processor) {
        return false;
    }

    if !allowlist_permits(
        &options.allowed_main_families,
        &spec.main_family_of(&record.instance_type),
    ) {
        return false;
    }

    if !options.exclude_patterns.is_empty() {
        let lowered = record.instance_type.to_lowercase();
        let excluded = options.exclude_patterns.iter().any(|pattern| {
            pattern.provider == spec.provider()
                && lowered.contains(&pattern.token.to_lowercase())
        });
        if excluded {
            return false;
        }
    }

    if options.exclude_architecture && spec.is_arm(record) {
        return false;
    }

    true
}

/// Qualifying subset of `records`, in catalog order.
pub fn apply_filters<'a>(
    spec: &dyn ProviderSpec,
    records: &'a [InstanceRecord],
    required_cpu: u32,
    required_memory: f64,
    options: &FilterOptions,
) -> Vec<&'a InstanceRecord> {
    records
        .iter()
        .filter(|record| qualifies(spec, record, required_cpu, required_memory, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::spec_for;

    fn aws_records() -> Vec<InstanceRecord> {
        spec_for(Provider::Aws).sample_records("us-east-1")
    }

    fn names(filtered: &[&InstanceRecord]) -> Vec<String> {
        filtered.iter().map(|r| r.instance_type.clone()).collect()
    }

    #[test]
    fn test_sizing_floor_is_hard() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let filtered = apply_filters(
            spec.as_ref(),
            &records,
            2,
            8.0,
            &FilterOptions::default(),
        );
        assert!(filtered.iter().all(|r| r.vcpus >= 2 && r.memory_gib >= 8.0));
        assert!(!names(&filtered).contains(&"t3.micro".to_string()));
    }

    #[test]
    fn test_current_generation_filter() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let options = FilterOptions {
            current_generation_only: true,
            ..Default::default()
        };
        let filtered = apply_filters(spec.as_ref(), &records, 1, 0.5, &options);
        assert!(filtered.iter().all(|r| r.generation == Generation::Current));
        assert!(!names(&filtered).contains(&"t2.micro".to_string()));
    }

    #[test]
    fn test_empty_allowlist_is_inert() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let options = FilterOptions {
            allowed_processors: Some(BTreeSet::new()),
            ..Default::default()
        };
        let all = apply_filters(spec.as_ref(), &records, 1, 0.1, &FilterOptions::default());
        let with_empty = apply_filters(spec.as_ref(), &records, 1, 0.1, &options);
        assert_eq!(names(&all), names(&with_empty));
    }

    #[test]
    fn test_processor_allowlist() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let options = FilterOptions {
            allowed_processors: Some(["AMD".to_string()].into()),
            ..Default::default()
        };
        let filtered = apply_filters(spec.as_ref(), &records, 1, 0.1, &options);
        assert_eq!(names(&filtered), vec!["c7a.medium"]);
    }

    #[test]
    fn test_main_family_allowlist_uses_provider_classification() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let options = FilterOptions {
            allowed_main_families: Some(["r".to_string()].into()),
            ..Default::default()
        };
        let filtered = apply_filters(spec.as_ref(), &records, 1, 0.1, &options);
        assert_eq!(names(&filtered), vec!["r5.large"]);
    }

    #[test]
    fn test_exclude_pattern_is_case_insensitive_and_provider_scoped() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();

        let options = FilterOptions {
            exclude_patterns: vec![ExcludePattern {
                provider: Provider::Aws,
                token: "T3".to_string(),
            }],
            ..Default::default()
        };
        let filtered = apply_filters(spec.as_ref(), &records, 1, 0.1, &options);
        assert!(!names(&filtered).iter().any(|n| n.starts_with("t3")));

        // A pattern for another provider leaves this catalog alone.
        let foreign = FilterOptions {
            exclude_patterns: vec![ExcludePattern {
                provider: Provider::Gcp,
                token: "t3".to_string(),
            }],
            ..Default::default()
        };
        let untouched = apply_filters(spec.as_ref(), &records, 1, 0.1, &foreign);
        assert!(names(&untouched).contains(&"t3.micro".to_string()));
    }

    #[test]
    fn test_architecture_exclusion() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let options = FilterOptions {
            exclude_architecture: true,
            ..Default::default()
        };
        let filtered = apply_filters(spec.as_ref(), &records, 1, 0.1, &options);
        assert!(filtered.iter().all(|r| !spec.is_arm(r)));
        assert!(!names(&filtered).contains(&"m6g.large".to_string()));
    }

    #[test]
    fn test_all_layers_conjoined() {
        let spec = spec_for(Provider::Aws);
        let records = aws_records();
        let options = FilterOptions {
            current_generation_only: true,
            allowed_family_names: Some(["General purpose".to_string()].into()),
            exclude_architecture: true,
            ..Default::default()
        };
        let filtered = apply_filters(spec.as_ref(), &records, 2, 4.0, &options);
        assert_eq!(names(&filtered), vec!["m5.large"]);
    }
}
