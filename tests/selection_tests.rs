//! Integration tests for the filter + selection pipeline
//!
//! Exercises the public API end to end over small hand-built catalogs
//! and the providers' sample datasets.

use std::collections::{BTreeSet, HashMap};

use cloudmatch::catalog::{Catalog, Generation, InstanceRecord, ARM_FLAG};
use cloudmatch::filter::{ExcludePattern, FilterOptions};
use cloudmatch::options::RecommendOptions;
use cloudmatch::provider::{spec_for, Provider};
use cloudmatch::selection::{
    cpu_target, like_to_like, optimized, NoMatchReason, ResizePolicy, Selection,
};

fn record(
    instance_type: &str,
    vcpus: u32,
    memory_gib: f64,
    hourly_price: f64,
    arm: bool,
) -> InstanceRecord {
    let mut architecture_flags = BTreeSet::new();
    if arm {
        architecture_flags.insert(ARM_FLAG.to_string());
    }
    InstanceRecord {
        instance_type: instance_type.to_string(),
        vcpus,
        memory_gib,
        hourly_price,
        family: "m5".to_string(),
        family_name: "General purpose".to_string(),
        processor: if arm { "AWS" } else { "Intel" }.to_string(),
        generation: Generation::Current,
        architecture_flags,
        region: "us-east-1".to_string(),
    }
}

fn catalog_of(records: Vec<InstanceRecord>) -> Catalog {
    Catalog::from_records(
        spec_for(Provider::Aws),
        HashMap::from([("us-east-1".to_string(), records)]),
    )
}

#[test]
fn test_memory_floor_beats_cheaper_instance() {
    let catalog = catalog_of(vec![
        record("m5.large", 2, 8.0, 0.096, false),
        record("t3.micro", 2, 1.0, 0.0104, false),
    ]);

    let selection = like_to_like(&catalog, "us-east-1", 2, 8.0, &FilterOptions::default());
    let rec = selection.recommendation().expect("match");
    assert_eq!(rec.instance_type, "m5.large");
    assert_eq!(
        rec.reason,
        "Selected based on >=2vCPU and >=8GB - cheapest match"
    );
}

#[test]
fn test_small_requirement_picks_cheapest_overall() {
    let catalog = catalog_of(vec![
        record("m5.large", 2, 8.0, 0.096, false),
        record("t3.micro", 2, 1.0, 0.0104, false),
    ]);

    let selection = like_to_like(&catalog, "us-east-1", 1, 1.0, &FilterOptions::default());
    assert_eq!(
        selection.recommendation().unwrap().instance_type,
        "t3.micro"
    );
}

#[test]
fn test_winner_always_meets_the_floor() {
    // Whatever wins must satisfy the requirement; a cheaper undersized
    // record never leaks through.
    let catalog = catalog_of(vec![
        record("tiny.cheap", 1, 0.5, 0.001, false),
        record("mid.fit", 4, 16.0, 0.2, false),
        record("big.fit", 8, 32.0, 0.4, false),
    ]);

    for (cpu, memory) in [(1, 1.0), (2, 8.0), (4, 16.0), (8, 32.0)] {
        if let Selection::Match(rec) =
            like_to_like(&catalog, "us-east-1", cpu, memory, &FilterOptions::default())
        {
            assert!(rec.vcpus >= cpu, "{} vs {cpu}", rec.instance_type);
            assert!(rec.memory_gib >= memory, "{} vs {memory}", rec.instance_type);
        }
    }
}

#[test]
fn test_downsize_at_low_utilization() {
    // 25% CPU utilization with a 30% downsize ceiling halves the request.
    let policy = ResizePolicy {
        cpu_based: true,
        cpu_downsize_max: 30,
        ..Default::default()
    };
    assert_eq!(cpu_target(4, 25.0, &policy), 2);

    let catalog = catalog_of(vec![
        record("m5.xlarge", 4, 16.0, 0.192, false),
        record("m5.large", 2, 8.0, 0.096, false),
    ]);
    let selection = optimized(
        &catalog,
        "us-east-1",
        4,
        8.0,
        25.0,
        0.0,
        &policy,
        &FilterOptions::default(),
    );
    let rec = selection.recommendation().expect("match");
    assert_eq!(rec.instance_type, "m5.large");
    assert_eq!(
        rec.reason,
        "N/2, N, N+1 Strategy optimization from 4vCPU/8GB to 2vCPU/8GB \
         based on utilization (CPU:25%, Mem:0%)"
    );
}

#[test]
fn test_upsize_above_threshold_only() {
    let policy = ResizePolicy {
        cpu_based: true,
        cpu_upsize_min: 80,
        ..Default::default()
    };
    // Strictly greater than the threshold upsizes; at the threshold the
    // sizing holds.
    assert_eq!(cpu_target(4, 85.0, &policy), 5);
    assert_eq!(cpu_target(4, 80.0, &policy), 4);
}

#[test]
fn test_unloaded_region_is_a_reported_non_match() {
    let catalog = catalog_of(vec![record("m5.large", 2, 8.0, 0.096, false)]);
    match like_to_like(&catalog, "eu-west-1", 1, 1.0, &FilterOptions::default()) {
        Selection::NoMatch(reason) => {
            assert_eq!(reason, NoMatchReason::RegionNotLoaded);
            assert_eq!(reason.message(), "region data not loaded");
        }
        Selection::Match(rec) => panic!("unexpected match: {}", rec.instance_type),
    }
}

#[test]
fn test_graviton_exclude_token_steers_to_non_arm() {
    // An AWS "Graviton" exclude token disables ARM results entirely, so
    // the cheapest non-ARM qualifier wins instead of a Graviton type.
    let options = RecommendOptions {
        exclude_types: vec![ExcludePattern {
            provider: Provider::Aws,
            token: "Graviton".to_string(),
        }],
        ..Default::default()
    };
    let filter = options.filter_options();
    assert!(filter.exclude_architecture);

    let catalog = catalog_of(vec![
        record("m6g.large", 2, 8.0, 0.077, true),
        record("m5.large", 2, 8.0, 0.096, false),
    ]);
    let selection = like_to_like(&catalog, "us-east-1", 2, 8.0, &filter);
    assert_eq!(selection.recommendation().unwrap().instance_type, "m5.large");
}

#[test]
fn test_exclude_pattern_is_provider_scoped() {
    // An Azure-scoped token leaves the AWS catalog untouched.
    let filter = FilterOptions {
        exclude_patterns: vec![ExcludePattern {
            provider: Provider::Azure,
            token: "m5".to_string(),
        }],
        ..Default::default()
    };

    let catalog = catalog_of(vec![record("m5.large", 2, 8.0, 0.096, false)]);
    let selection = like_to_like(&catalog, "us-east-1", 2, 8.0, &filter);
    assert!(selection.recommendation().is_some());
}

#[test]
fn test_sample_catalogs_cover_all_providers() {
    for provider in [Provider::Aws, Provider::Azure, Provider::Gcp] {
        let spec = spec_for(provider);
        let region = provider.default_region().to_string();
        let records = spec.sample_records(&region);
        let catalog = Catalog::from_records(
            spec_for(provider),
            HashMap::from([(region.clone(), records)]),
        );

        let selection = like_to_like(&catalog, &region, 1, 1.0, &FilterOptions::default());
        assert!(
            selection.recommendation().is_some(),
            "no sample match for {provider}"
        );
    }
}
