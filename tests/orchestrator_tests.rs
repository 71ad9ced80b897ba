//! End-to-end orchestrator tests
//!
//! Drives the whole pipeline through the public API: CSV parsing, a
//! directory-backed region source under a temp dir, batch processing,
//! and the placeholder policy for degraded rows.

use std::collections::BTreeMap;

use cloudmatch::csvio;
use cloudmatch::options::RecommendOptions;
use cloudmatch::orchestrator::{run, RunContext};
use cloudmatch::provider::Provider;
use cloudmatch::source::{DirSource, SampleOnlySource};

type Row = BTreeMap<String, String>;

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_dir_source_data_overrides_samples() {
    let dir = tempfile::tempdir().unwrap();
    let aws_dir = dir.path().join("aws");
    std::fs::create_dir_all(&aws_dir).unwrap();
    // Region key is the normalized form of the row's region value.
    std::fs::write(
        aws_dir.join("us_east_1.json"),
        r#"{
            "z9.large": {
                "vCpus": 2, "memorySizeInGiB": 8.0, "onDemandLinuxHr": 0.01,
                "instanceFamily": "z9", "instanceFamilyName": "General purpose",
                "processorManufacturer": "Intel", "currentGeneration": 1.0,
                "isGraviton": 0.0
            }
        }"#,
    )
    .unwrap();
    let source = DirSource::new(dir.path());

    let rows = vec![row(&[
        ("CPU Count", "2"),
        ("Memory (GB)", "8"),
        ("AWS Region", "us-east-1"),
    ])];
    let options = RecommendOptions::default();

    let output = run(&rows, &[Provider::Aws], &options, &source).await.unwrap();
    // z9.large exists only in the region file, so the file was used.
    assert_eq!(output[0]["AWS Like-to-Like Instance"], "z9.large");
    assert_eq!(output[0]["AWS Like-to-Like Price"], "0.0100");
    assert_eq!(output[0]["AWS Monthly Cost (USD)"], "7.30");
}

#[tokio::test]
async fn test_missing_region_file_falls_back_to_samples() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirSource::new(dir.path());

    let rows = vec![row(&[
        ("CPU Count", "1"),
        ("Memory (GB)", "1"),
        ("AWS Region", "us-east-1"),
    ])];
    let options = RecommendOptions::default();

    let output = run(&rows, &[Provider::Aws], &options, &source).await.unwrap();
    // Empty data dir; the built-in sample dataset answers instead.
    // Cheapest sample with at least 1 GB is the t4g.micro.
    assert_eq!(output[0]["AWS Like-to-Like Instance"], "t4g.micro");
}

#[tokio::test]
async fn test_degraded_rows_do_not_stop_the_batch() {
    let rows = vec![
        row(&[("CPU Count", "not-a-number"), ("Memory (GB)", "8"), ("AWS Region", "us-east-1")]),
        row(&[("CPU Count", "2"), ("Memory (GB)", "8")]),
        row(&[("CPU Count", "2"), ("Memory (GB)", "8"), ("AWS Region", "us-east-1")]),
    ];
    let options = RecommendOptions::default();

    let output = run(&rows, &[Provider::Aws], &options, &SampleOnlySource)
        .await
        .unwrap();
    assert_eq!(output.len(), 3);
    // Unparseable CPU and a missing region both degrade to placeholders.
    assert_eq!(output[0]["AWS Like-to-Like Instance"], "Missing data");
    assert_eq!(output[1]["AWS Like-to-Like Instance"], "Missing data");
    assert_eq!(output[1]["AWS Monthly Cost (USD)"], "N/A");
    // The healthy row still gets its recommendation.
    assert_eq!(output[2]["AWS Like-to-Like Instance"], "m6g.large");
}

#[tokio::test]
async fn test_invalid_options_abort_before_processing() {
    let rows = vec![row(&[("CPU Count", "2"), ("Memory (GB)", "8")])];
    let options = RecommendOptions {
        cpu_downsize_max: 150,
        ..Default::default()
    };

    let result = run(&rows, &[Provider::Aws], &options, &SampleOnlySource).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unsupported_provider_name_is_fatal() {
    let err = Provider::parse("oracle").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unsupported provider: oracle (supported: aws, azure, gcp)"
    );
}

#[tokio::test]
async fn test_multi_provider_columns_all_present() {
    let rows = vec![row(&[
        ("CPU Count", "2"),
        ("Memory (GB)", "4"),
        ("CPU Utilization", "25"),
        ("Memory Utilization", "40"),
        ("AWS Region", "us-east-1"),
        ("Azure Region", "East US"),
        ("GCP Region", "us-central1-a"),
    ])];
    let options = RecommendOptions {
        generate_optimized: true,
        cpu_based: true,
        memory_based: true,
        ..Default::default()
    };
    let providers = [Provider::Aws, Provider::Azure, Provider::Gcp];

    let context = RunContext::initialize(&rows, &providers, &options, &SampleOnlySource)
        .await
        .unwrap();
    let output = context.process(&rows);

    for name in ["AWS", "Azure", "GCP"] {
        for kind in ["Like-to-Like", "Optimized"] {
            for field in ["Instance", "Price", "vCPUs", "Memory"] {
                let column = format!("{name} {kind} {field}");
                assert!(output[0].contains_key(&column), "missing column {column}");
            }
        }
        assert!(output[0].contains_key(&format!("{name} Monthly Cost (USD)")));
    }
    assert_eq!(
        context.output_columns().len(),
        3 * (4 + 4 + 1),
        "column order list covers every emitted column"
    );
}

#[tokio::test]
async fn test_csv_round_trip_through_orchestrator() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("workloads.csv");
    let output_path = dir.path().join("recommendations.csv");
    std::fs::write(
        &input,
        "Name,CPU Count,Memory (GB),AWS Region\nweb-1,2,8,us-east-1\ndb-1,4,16,us-east-1\n",
    )
    .unwrap();

    let table = csvio::read_workloads(&input).unwrap();
    let options = RecommendOptions::default();
    let context = RunContext::initialize(&table.rows, &[Provider::Aws], &options, &SampleOnlySource)
        .await
        .unwrap();
    let augmented = context.process(&table.rows);

    let mut columns = table.columns.clone();
    columns.extend(context.output_columns());
    csvio::write_workloads(&output_path, &columns, &augmented).unwrap();

    let written = csvio::read_workloads(&output_path).unwrap();
    assert_eq!(written.rows.len(), 2);
    assert_eq!(written.columns[0], "Name");
    assert_eq!(written.rows[0]["Name"], "web-1");
    assert_eq!(written.rows[0]["AWS Like-to-Like Instance"], "m6g.large");
    // 4x16 in the sample set only fits p3.2xlarge.
    assert_eq!(written.rows[1]["AWS Like-to-Like Instance"], "p3.2xlarge");
}
