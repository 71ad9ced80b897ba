//! Recommendation orchestrator
//!
//! Batch-processes workload rows across the selected providers. Each run
//! builds an explicit `RunContext` holding the provider catalogs for
//! exactly the regions the rows reference; catalogs load concurrently and
//! the barrier completes before any row is processed, so row processing
//! only reads immutable state. Nothing survives a run: calling `run`
//! twice with the same inputs produces identical output.
//!
//! Failure isolation follows the error taxonomy: setup problems
//! (unsupported provider, invalid options) abort before any row work,
//! while per-(row, provider) problems become placeholder cells and the
//! batch continues. Every input row appears in the output exactly once,
//! and every requested provider/kind column is always present.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::{CloudmatchError, Result};
use crate::filter::FilterOptions;
use crate::options::RecommendOptions;
use crate::provider::{spec_for, Provider};
use crate::selection::{like_to_like, optimized, Recommendation, ResizePolicy, Selection};
use crate::source::RegionSource;

/// One workload record: column name → string value, as handed over by
/// the external CSV collaborator.
pub type WorkloadRow = BTreeMap<String, String>;

pub const CPU_COLUMN: &str = "CPU Count";
pub const MEMORY_COLUMN: &str = "Memory (GB)";
pub const CPU_UTIL_COLUMN: &str = "CPU Utilization";
pub const MEMORY_UTIL_COLUMN: &str = "Memory Utilization";

pub const MISSING_DATA: &str = "Missing data";
pub const ERROR_CELL: &str = "Error";
pub const NO_UTILIZATION_DATA: &str = "No utilization data";
pub const NO_SUITABLE_INSTANCE: &str = "No suitable instance found";
pub const NOT_AVAILABLE: &str = "N/A";

/// Per-run state: the provider → catalog cache plus the engine-facing
/// views of the options. Constructed per invocation and passed
/// explicitly; there is no ambient state.
pub struct RunContext {
    providers: Vec<Provider>,
    catalogs: HashMap<Provider, Catalog>,
    options: RecommendOptions,
    filter: FilterOptions,
    policy: ResizePolicy,
}

impl RunContext {
    /// Validate options and load every needed (provider, region) catalog
    /// concurrently. Errors here are fatal and occur before any row is
    /// touched.
    pub async fn initialize(
        rows: &[WorkloadRow],
        providers: &[Provider],
        options: &RecommendOptions,
        source: &dyn RegionSource,
    ) -> Result<RunContext> {
        options.validate()?;

        // First occurrence wins; a provider listed twice loads once.
        let mut ordered: Vec<Provider> = Vec::new();
        for &provider in providers {
            if !ordered.contains(&provider) {
                ordered.push(provider);
            }
        }

        let loads = ordered.iter().map(|&provider| {
            let regions = required_regions(rows, provider);
            info!(
                "Loading {} catalog for {} region(s)",
                provider,
                regions.len()
            );
            async move {
                let catalog = Catalog::load(spec_for(provider), source, &regions).await;
                (provider, catalog)
            }
        });
        let catalogs: HashMap<Provider, Catalog> =
            futures::future::join_all(loads).await.into_iter().collect();

        Ok(RunContext {
            providers: ordered,
            catalogs,
            options: options.clone(),
            filter: options.filter_options(),
            policy: options.resize_policy(),
        })
    }

    pub fn catalog(&self, provider: Provider) -> Option<&Catalog> {
        self.catalogs.get(&provider)
    }

    /// Augment every row with the requested recommendation columns.
    /// Row-level failures become placeholder cells; the batch never
    /// aborts here.
    pub fn process(&self, rows: &[WorkloadRow]) -> Vec<WorkloadRow> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let mut augmented = row.clone();
                for &provider in &self.providers {
                    match self.provider_cells(row, provider) {
                        Ok(cells) => augmented.extend(cells),
                        Err(err) => {
                            warn!(
                                "Error processing {} for row {}: {}",
                                provider,
                                index + 1,
                                err
                            );
                            augmented.extend(self.uniform_cells(provider, ERROR_CELL, ERROR_CELL));
                        }
                    }
                }
                augmented
            })
            .collect()
    }

    /// Cells for one (row, provider) pair.
    fn provider_cells(
        &self,
        row: &WorkloadRow,
        provider: Provider,
    ) -> Result<Vec<(String, String)>> {
        let catalog = self
            .catalogs
            .get(&provider)
            .ok_or_else(|| CloudmatchError::Workload {
                field: "provider".to_string(),
                reason: format!("catalog for {provider} was not initialized"),
            })?;

        let cpu = numeric_cell(row, CPU_COLUMN) as u32;
        let memory = numeric_cell(row, MEMORY_COLUMN);
        let cpu_util = numeric_cell(row, CPU_UTIL_COLUMN);
        let memory_util = numeric_cell(row, MEMORY_UTIL_COLUMN);
        let region = row
            .get(provider.region_column())
            .map(|r| r.trim())
            .unwrap_or("");

        if region.is_empty() || cpu == 0 || memory <= 0.0 {
            return Ok(self.uniform_cells(provider, MISSING_DATA, NOT_AVAILABLE));
        }

        let mut cells = Vec::new();
        let mut monthly = NOT_AVAILABLE.to_string();

        if self.options.generate_like_to_like {
            let selection = like_to_like(catalog, region, cpu, memory, &self.filter);
            if let Some(rec) = selection.recommendation() {
                monthly = rec.monthly_cost_display();
            }
            cells.extend(kind_cells(provider, "Like-to-Like", &selection));
        }

        if self.options.generate_optimized {
            if cpu_util > 0.0 || memory_util > 0.0 {
                let selection = optimized(
                    catalog,
                    region,
                    cpu,
                    memory,
                    cpu_util,
                    memory_util,
                    &self.policy,
                    &self.filter,
                );
                if let Some(rec) = selection.recommendation() {
                    if monthly == NOT_AVAILABLE {
                        monthly = rec.monthly_cost_display();
                    } else {
                        monthly = format!("{} | {}", monthly, rec.monthly_cost_display());
                    }
                }
                cells.extend(kind_cells(provider, "Optimized", &selection));
            } else {
                cells.extend(placeholder_cells(
                    provider,
                    "Optimized",
                    NO_UTILIZATION_DATA,
                    NOT_AVAILABLE,
                ));
            }
        }

        cells.push((monthly_column(provider), monthly));
        Ok(cells)
    }

    /// The full requested column set with one placeholder value in the
    /// instance cells and another in the numeric cells.
    fn uniform_cells(
        &self,
        provider: Provider,
        instance_value: &str,
        numeric_value: &str,
    ) -> Vec<(String, String)> {
        let mut cells = Vec::new();
        if self.options.generate_like_to_like {
            cells.extend(placeholder_cells(
                provider,
                "Like-to-Like",
                instance_value,
                numeric_value,
            ));
        }
        if self.options.generate_optimized {
            cells.extend(placeholder_cells(
                provider,
                "Optimized",
                instance_value,
                numeric_value,
            ));
        }
        cells.push((monthly_column(provider), NOT_AVAILABLE.to_string()));
        cells
    }

    /// Output column names in render order, for CSV headers.
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for &provider in &self.providers {
            if self.options.generate_like_to_like {
                columns.extend(kind_columns(provider, "Like-to-Like"));
            }
            if self.options.generate_optimized {
                columns.extend(kind_columns(provider, "Optimized"));
            }
            columns.push(monthly_column(provider));
        }
        columns
    }
}

/// Whole-batch entry point: initialize catalogs, then process rows.
pub async fn run(
    rows: &[WorkloadRow],
    providers: &[Provider],
    options: &RecommendOptions,
    source: &dyn RegionSource,
) -> Result<Vec<WorkloadRow>> {
    let context = RunContext::initialize(rows, providers, options, source).await?;
    Ok(context.process(rows))
}

/// Distinct trimmed regions the rows reference for one provider, with
/// the provider default when the column is absent or empty throughout.
pub fn required_regions(rows: &[WorkloadRow], provider: Provider) -> BTreeSet<String> {
    let mut regions: BTreeSet<String> = rows
        .iter()
        .filter_map(|row| row.get(provider.region_column()))
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if regions.is_empty() {
        info!(
            "No regions found for {}, using default {}",
            provider,
            provider.default_region()
        );
        regions.insert(provider.default_region().to_string());
    }
    regions
}

fn numeric_cell(row: &WorkloadRow, column: &str) -> f64 {
    row.get(column)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn kind_columns(provider: Provider, kind: &str) -> Vec<String> {
    let name = provider.display_name();
    vec![
        format!("{name} {kind} Instance"),
        format!("{name} {kind} Price"),
        format!("{name} {kind} vCPUs"),
        format!("{name} {kind} Memory"),
    ]
}

fn monthly_column(provider: Provider) -> String {
    format!("{} Monthly Cost (USD)", provider.display_name())
}

fn kind_cells(provider: Provider, kind: &str, selection: &Selection) -> Vec<(String, String)> {
    let columns = kind_columns(provider, kind);
    let values = match selection {
        Selection::Match(rec) => recommendation_values(rec),
        Selection::NoMatch(_) => vec![
            NO_SUITABLE_INSTANCE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ],
    };
    columns.into_iter().zip(values).collect()
}

fn placeholder_cells(
    provider: Provider,
    kind: &str,
    instance_value: &str,
    numeric_value: &str,
) -> Vec<(String, String)> {
    let columns = kind_columns(provider, kind);
    let values = vec![
        instance_value.to_string(),
        numeric_value.to_string(),
        numeric_value.to_string(),
        numeric_value.to_string(),
    ];
    columns.into_iter().zip(values).collect()
}

fn recommendation_values(rec: &Recommendation) -> Vec<String> {
    vec![
        rec.instance_type.clone(),
        rec.hourly_price_display(),
        rec.vcpus.to_string(),
        format!("{}", rec.memory_gib),
    ]
}
