//! Selection strategies
//!
//! Stateless pure functions over a catalog, a sizing requirement, and
//! filter options. Like-to-Like picks the cheapest qualifying record via
//! a stable min-scan (strictly-lower price replaces, so the first-seen
//! record wins price ties — with the catalog's price-ascending load order
//! that makes ties deterministic). Optimized first resizes the target per
//! dimension with the N/2, N, N+1 utilization policy, then delegates to
//! Like-to-Like.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, Generation, InstanceRecord};
use crate::filter::{apply_filters, FilterOptions};

/// Hours per month used for the derived monthly cost.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Why a selection produced no instance. Both are normal outcomes; the
/// batch continues either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoMatchReason {
    /// The requested region was not part of this run's catalog load set.
    RegionNotLoaded,
    /// The catalog was loaded but the filters left nothing.
    NoQualifyingInstance,
}

impl NoMatchReason {
    pub fn message(&self) -> &'static str {
        match self {
            NoMatchReason::RegionNotLoaded => "region data not loaded",
            NoMatchReason::NoQualifyingInstance => "no instances meet filtering requirements",
        }
    }
}

/// A winning instance plus user-facing provenance.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub instance_type: String,
    pub vcpus: u32,
    pub memory_gib: f64,
    pub hourly_price: f64,
    pub processor: String,
    pub family_name: String,
    pub generation: Generation,
    pub is_arm: bool,
    /// Why this instance was picked: sizing floor for Like-to-Like,
    /// original vs. target sizing and utilizations for Optimized.
    pub reason: String,
}

impl Recommendation {
    /// Hourly price rendered at 4 decimal places.
    pub fn hourly_price_display(&self) -> String {
        format!("{:.4}", self.hourly_price)
    }

    pub fn monthly_cost(&self) -> f64 {
        self.hourly_price * HOURS_PER_MONTH
    }

    /// Monthly cost rendered at 2 decimal places.
    pub fn monthly_cost_display(&self) -> String {
        format!("{:.2}", self.monthly_cost())
    }
}

/// Outcome of one selection.
#[derive(Debug, Clone, Serialize)]
pub enum Selection {
    Match(Recommendation),
    NoMatch(NoMatchReason),
}

impl Selection {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Selection::Match(rec) => Some(rec),
            Selection::NoMatch(_) => None,
        }
    }
}

/// Utilization-driven resize policy: thresholds are percentages in
/// [0, 100], validated by the options layer.
#[derive(Debug, Clone, Copy)]
pub struct ResizePolicy {
    pub cpu_based: bool,
    pub memory_based: bool,
    pub cpu_downsize_max: u8,
    pub cpu_upsize_min: u8,
    pub memory_downsize_max: u8,
    pub memory_upsize_min: u8,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            cpu_based: false,
            memory_based: false,
            cpu_downsize_max: 50,
            cpu_upsize_min: 80,
            memory_downsize_max: 50,
            memory_upsize_min: 80,
        }
    }
}

/// Cheapest instance meeting-or-exceeding the sizing floor after
/// filtering.
pub fn like_to_like(
    catalog: &Catalog,
    region: &str,
    required_cpu: u32,
    required_memory: f64,
    options: &FilterOptions,
) -> Selection {
    let records = match catalog.region(region) {
        Some(records) if !records.is_empty() => records,
        _ => {
            debug!(
                "No catalog data for {} {}",
                catalog.provider(),
                region
            );
            return Selection::NoMatch(NoMatchReason::RegionNotLoaded);
        }
    };

    let qualifying = apply_filters(
        catalog.spec(),
        records,
        required_cpu,
        required_memory,
        options,
    );
    let Some(cheapest) = min_by_price(&qualifying) else {
        debug!(
            "No instances meet filtering criteria for {} {}",
            catalog.provider(),
            region
        );
        return Selection::NoMatch(NoMatchReason::NoQualifyingInstance);
    };

    let reason = format!(
        "Selected based on >={required_cpu}vCPU and >={required_memory}GB - cheapest match"
    );
    Selection::Match(build_recommendation(catalog, cheapest, reason))
}

/// N/2, N, N+1 resize, then Like-to-Like at the target sizing.
///
/// Boundary inclusivity is exact: utilization at `downsize_max` still
/// downsizes; utilization at `upsize_min` keeps (upsizing needs strictly
/// greater). Zero or missing utilization disables that dimension.
#[allow(clippy::too_many_arguments)]
pub fn optimized(
    catalog: &Catalog,
    region: &str,
    current_cpu: u32,
    current_memory: f64,
    cpu_util_pct: f64,
    memory_util_pct: f64,
    policy: &ResizePolicy,
    options: &FilterOptions,
) -> Selection {
    let target_cpu = cpu_target(current_cpu, cpu_util_pct, policy);
    let target_memory = memory_target(current_memory, memory_util_pct, policy);

    if target_cpu != current_cpu {
        debug!(
            "CPU resize: {} -> {} vCPUs ({}% utilization)",
            current_cpu, target_cpu, cpu_util_pct
        );
    }
    if target_memory != current_memory {
        debug!(
            "Memory resize: {} -> {} GB ({}% utilization)",
            current_memory, target_memory, memory_util_pct
        );
    }

    let mut selection = like_to_like(catalog, region, target_cpu, target_memory, options);
    if let Selection::Match(rec) = &mut selection {
        rec.reason = format!(
            "N/2, N, N+1 Strategy optimization from {current_cpu}vCPU/{current_memory}GB \
             to {target_cpu}vCPU/{target_memory}GB based on utilization \
             (CPU:{cpu_util_pct}%, Mem:{memory_util_pct}%)"
        );
    }
    selection
}

/// CPU dimension of the resize policy.
pub fn cpu_target(current: u32, util_pct: f64, policy: &ResizePolicy) -> u32 {
    if !policy.cpu_based || util_pct <= 0.0 {
        return current;
    }
    if util_pct <= policy.cpu_downsize_max as f64 {
        current.div_ceil(2).max(1)
    } else if util_pct > policy.cpu_upsize_min as f64 {
        current + 1
    } else {
        current
    }
}

/// Memory dimension of the resize policy.
pub fn memory_target(current: f64, util_pct: f64, policy: &ResizePolicy) -> f64 {
    if !policy.memory_based || util_pct <= 0.0 {
        return current;
    }
    if util_pct <= policy.memory_downsize_max as f64 {
        (current / 2.0).ceil().max(1.0)
    } else if util_pct > policy.memory_upsize_min as f64 {
        current + 1.0
    } else {
        current
    }
}

/// Stable min-scan: replaces only on strictly lower price, so the first
/// record among equal prices wins.
fn min_by_price<'a>(records: &[&'a InstanceRecord]) -> Option<&'a InstanceRecord> {
    let mut cheapest: Option<&InstanceRecord> = None;
    for record in records.iter().copied() {
        match cheapest {
            Some(best) if record.hourly_price < best.hourly_price => cheapest = Some(record),
            None => cheapest = Some(record),
            _ => {}
        }
    }
    cheapest
}

fn build_recommendation(
    catalog: &Catalog,
    record: &InstanceRecord,
    reason: String,
) -> Recommendation {
    let spec = catalog.spec();
    Recommendation {
        instance_type: record.instance_type.clone(),
        vcpus: record.vcpus,
        memory_gib: record.memory_gib,
        hourly_price: record.hourly_price,
        processor: spec.display_processor(record),
        family_name: record.family_name.clone(),
        generation: record.generation,
        is_arm: spec.is_arm(record),
        reason,
    }
}
