//! Catalog entry model and per-provider catalog loading
//!
//! A `Catalog` holds, for one cloud provider, the validated instance-type
//! records for each region touched by a recommendation run. Loading is
//! two-tier: the primary `RegionSource` is tried first, and on any failure
//! the provider's built-in sample dataset is used instead, so a missing or
//! malformed region file degrades the run rather than aborting it.
//!
//! Invariants maintained here:
//! - every stored record passes `InstanceRecord::is_valid` (strictly
//!   positive vCPUs, memory, and price);
//! - `instance_type` is unique within a region (first occurrence wins);
//! - each region's records are sorted ascending by hourly price. Selection
//!   does its own min-scan and does not rely on this ordering.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::provider::{Provider, ProviderSpec};
use crate::source::RegionSource;

/// Capability tag for ARM-based instance families (Graviton, Ampere, Tau).
pub const ARM_FLAG: &str = "arm";

/// Capability tag for AWS Nitro Enclaves support.
pub const NITRO_FLAG: &str = "nitro-enclave-support";

/// Instance-family generation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    Current,
    Previous,
}

/// Normalized instance-type record shared across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_type: String,
    pub vcpus: u32,
    pub memory_gib: f64,
    pub hourly_price: f64,
    /// Short family code, e.g. "m5" or "Dsv3".
    pub family: String,
    /// Human category, e.g. "General purpose".
    pub family_name: String,
    /// Processor vendor name.
    pub processor: String,
    pub generation: Generation,
    /// Provider-specific capability tags, e.g. "arm",
    /// "nitro-enclave-support".
    pub architecture_flags: BTreeSet<String>,
    pub region: String,
}

impl InstanceRecord {
    /// Records failing this are dropped at load time, never surfaced.
    pub fn is_valid(&self) -> bool {
        !self.instance_type.is_empty()
            && self.vcpus > 0
            && self.memory_gib > 0.0
            && self.hourly_price > 0.0
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.architecture_flags.contains(flag)
    }
}

/// Maps a provider's raw field names onto the canonical record shape.
///
/// `extra_flags` pairs a capability tag with the raw field whose truthy
/// value sets it (e.g. `("nitro-enclave-support", "nitroEnclavesSupport")`
/// for AWS).
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub vcpus: &'static str,
    pub memory: &'static str,
    pub price: &'static str,
    pub family: &'static str,
    pub family_name: &'static str,
    pub processor: &'static str,
    pub generation: &'static str,
    pub arm: &'static str,
    pub extra_flags: &'static [(&'static str, &'static str)],
}

/// Numeric coercion matching the source data, which mixes JSON numbers
/// and numeric strings (`1.0` and `"1.0"`). Anything else counts as 0.
fn number_field(details: &Value, field: &str) -> f64 {
    match details.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn text_field(details: &Value, field: &str, default: &str) -> String {
    match details.get(field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => default.to_string(),
    }
}

fn is_set(value: f64) -> bool {
    value == 1.0
}

/// Build one canonical record from a raw provider entry.
pub fn record_from_raw(
    spec: &dyn ProviderSpec,
    instance_type: &str,
    details: &Value,
    region: &str,
) -> InstanceRecord {
    let mapping = spec.field_mapping();

    let mut flags = BTreeSet::new();
    if is_set(number_field(details, mapping.arm)) {
        flags.insert(ARM_FLAG.to_string());
    }
    for (tag, field) in mapping.extra_flags {
        if is_set(number_field(details, field)) {
            flags.insert((*tag).to_string());
        }
    }

    let generation = if is_set(number_field(details, mapping.generation)) {
        Generation::Current
    } else {
        Generation::Previous
    };

    InstanceRecord {
        instance_type: instance_type.to_string(),
        vcpus: number_field(details, mapping.vcpus) as u32,
        memory_gib: number_field(details, mapping.memory),
        hourly_price: number_field(details, mapping.price),
        family: text_field(details, mapping.family, ""),
        family_name: text_field(details, mapping.family_name, ""),
        processor: text_field(details, mapping.processor, "Intel"),
        generation,
        architecture_flags: flags,
        region: region.to_string(),
    }
}

/// Per-catalog summary, logged after load and shown by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_instances: usize,
    pub current_generation: usize,
    pub arm_instances: usize,
    pub family_names: usize,
}

/// Per-provider, per-region instance catalog.
///
/// Created once per provider per recommendation run; populated for the
/// run's regions before any read; immutable afterwards (selection and
/// filtering only read).
pub struct Catalog {
    spec: Box<dyn ProviderSpec>,
    regions: HashMap<String, Vec<InstanceRecord>>,
}

impl Catalog {
    /// Load catalogs for `regions`, fetching each region concurrently.
    ///
    /// A region whose source fetch fails falls back to the provider's
    /// sample dataset with a warning; this never returns an error.
    pub async fn load(
        spec: Box<dyn ProviderSpec>,
        source: &dyn RegionSource,
        regions: &BTreeSet<String>,
    ) -> Catalog {
        let provider = spec.provider();

        let fetches = regions.iter().map(|region| {
            let key = spec.normalize_region_key(region);
            async move {
                let raw = source.fetch(provider, &key).await;
                (region.clone(), key, raw)
            }
        });
        let fetched = futures::future::join_all(fetches).await;

        let mut loaded = HashMap::new();
        for (region, key, raw) in fetched {
            let records = match raw {
                Ok(payload) => parse_region(spec.as_ref(), &payload, &region),
                Err(err) => {
                    warn!(
                        "No source data for {} {} (key {}), using sample fallback: {}",
                        provider, region, key, err
                    );
                    finalize(spec.as_ref(), spec.sample_records(&region), &region)
                }
            };
            log_region_stats(spec.as_ref(), &records, &region);
            loaded.insert(region, records);
        }

        Catalog {
            spec,
            regions: loaded,
        }
    }

    /// Catalog over explicit records, no source involved. Test seam and
    /// building block for callers that already hold normalized data.
    pub fn from_records(
        spec: Box<dyn ProviderSpec>,
        regions: HashMap<String, Vec<InstanceRecord>>,
    ) -> Catalog {
        let regions = regions
            .into_iter()
            .map(|(region, records)| {
                let finalized = finalize(spec.as_ref(), records, &region);
                (region, finalized)
            })
            .collect();
        Catalog { spec, regions }
    }

    pub fn provider(&self) -> Provider {
        self.spec.provider()
    }

    pub fn spec(&self) -> &dyn ProviderSpec {
        self.spec.as_ref()
    }

    /// Records for one region, price-ascending. `None` when the region
    /// was not part of this run's load set.
    pub fn region(&self, region: &str) -> Option<&[InstanceRecord]> {
        self.regions.get(region).map(|r| r.as_slice())
    }

    pub fn loaded_regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(|r| r.as_str())
    }

    /// Sorted distinct family codes across loaded regions, falling back
    /// to the sample dataset when nothing is loaded.
    pub fn available_families(&self) -> Vec<String> {
        let mut families: BTreeSet<String> = self
            .regions
            .values()
            .flatten()
            .filter(|r| !r.family.is_empty())
            .map(|r| r.family.clone())
            .collect();

        if families.is_empty() {
            families = self
                .spec
                .sample_records(self.spec.provider().default_region())
                .into_iter()
                .filter(|r| !r.family.is_empty())
                .map(|r| r.family)
                .collect();
        }

        families.into_iter().collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let records: Vec<&InstanceRecord> = self.regions.values().flatten().collect();
        let family_names: BTreeSet<&str> =
            records.iter().map(|r| r.family_name.as_str()).collect();
        CatalogStats {
            total_instances: records.len(),
            current_generation: records
                .iter()
                .filter(|r| r.generation == Generation::Current)
                .count(),
            arm_instances: records.iter().filter(|r| self.spec.is_arm(r)).count(),
            family_names: family_names.len(),
        }
    }
}

/// Map a raw region payload (instance type → field object) onto validated,
/// deduplicated, price-sorted records.
fn parse_region(
    spec: &dyn ProviderSpec,
    payload: &serde_json::Map<String, Value>,
    region: &str,
) -> Vec<InstanceRecord> {
    let mut records = Vec::with_capacity(payload.len());
    for (instance_type, details) in payload {
        if !details.is_object() {
            warn!(
                "Skipping malformed entry {} for {} {}",
                instance_type,
                spec.provider(),
                region
            );
            continue;
        }
        records.push(record_from_raw(spec, instance_type, details, region));
    }
    finalize(spec, records, region)
}

/// Enforce the catalog invariants on a batch of records: validity,
/// per-region type-name uniqueness (first wins), price-ascending order.
fn finalize(
    spec: &dyn ProviderSpec,
    records: Vec<InstanceRecord>,
    region: &str,
) -> Vec<InstanceRecord> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut valid = Vec::with_capacity(records.len());
    for record in records {
        if !record.is_valid() {
            warn!(
                "Dropping invalid instance {} for {} {}",
                record.instance_type,
                spec.provider(),
                region
            );
            continue;
        }
        if !seen.insert(record.instance_type.clone()) {
            warn!(
                "Dropping duplicate instance {} for {} {}",
                record.instance_type,
                spec.provider(),
                region
            );
            continue;
        }
        valid.push(record);
    }
    // Stable sort keeps source order among equal prices.
    valid.sort_by(|a, b| a.hourly_price.total_cmp(&b.hourly_price));
    valid
}

fn log_region_stats(spec: &dyn ProviderSpec, records: &[InstanceRecord], region: &str) {
    let current = records
        .iter()
        .filter(|r| r.generation == Generation::Current)
        .count();
    let arm = records.iter().filter(|r| spec.is_arm(r)).count();
    let families: BTreeSet<&str> = records.iter().map(|r| r.family_name.as_str()).collect();

    info!(
        "Loaded {} instances for {} {}",
        records.len(),
        spec.provider(),
        region
    );
    debug!(
        "  current generation: {}, ARM: {}, family types: {}",
        current,
        arm,
        families.len()
    );
}
