//! Provider abstraction for the supported clouds
//!
//! Each cloud implements `ProviderSpec`: the metadata the shared catalog,
//! filter, and selection code needs (raw field mapping, sample fallback
//! data, region-key normalization) plus the provider-owned classification
//! hooks (ARM detection, family and coarse-family extraction). Shared
//! logic lives in free functions and `Catalog` methods that call these
//! hooks; there is no inheritance and no overridable base behavior.

mod aws;
mod azure;
mod gcp;

pub use aws::AwsSpec;
pub use azure::AzureSpec;
pub use gcp::GcpSpec;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldMapping, InstanceRecord, ARM_FLAG};
use crate::error::{CloudmatchError, Result};

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

pub const SUPPORTED_PROVIDERS: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

impl Provider {
    /// Parse a user-supplied provider name. Unknown names are a fatal
    /// setup error, raised before any row is processed.
    pub fn parse(name: &str) -> Result<Provider> {
        match name.trim().to_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            other => Err(CloudmatchError::UnsupportedProvider(other.to_string())),
        }
    }

    /// Lowercase identifier used in paths and option keys.
    pub fn key(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    /// Display name used in output column headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Azure => "Azure",
            Provider::Gcp => "GCP",
        }
    }

    /// Workload column that carries this provider's region value.
    pub fn region_column(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS Region",
            Provider::Azure => "Azure Region",
            Provider::Gcp => "GCP Region",
        }
    }

    /// Region used when the workload names none for this provider.
    pub fn default_region(&self) -> &'static str {
        match self {
            Provider::Aws => "us-east-1",
            Provider::Azure => "East US",
            Provider::Gcp => "us-central1-a",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Per-provider capability surface consumed by the shared catalog, filter,
/// and selection code.
pub trait ProviderSpec: Send + Sync {
    fn provider(&self) -> Provider;

    /// Raw-field mapping for this provider's region payloads.
    fn field_mapping(&self) -> &'static FieldMapping;

    /// Built-in minimal dataset used when a region's source is missing or
    /// malformed.
    fn sample_records(&self, region: &str) -> Vec<InstanceRecord>;

    /// Map a user-facing region value to the source key. Total: unknown
    /// regions get a deterministic lowercase/collapsed default.
    fn normalize_region_key(&self, region: &str) -> String;

    /// Whether the record belongs to the provider's ARM family
    /// (Graviton / Ampere / Tau).
    fn is_arm(&self, record: &InstanceRecord) -> bool {
        record.has_flag(ARM_FLAG)
    }

    /// Fine-grained family code extracted from the instance-type name.
    fn family_of(&self, instance_type: &str) -> String;

    /// Coarse family used by the main-family filter. Provider-owned
    /// grouping: AWS letter prefix, Azure VM series, GCP machine series.
    /// Not comparable across providers.
    fn main_family_of(&self, instance_type: &str) -> String;

    /// Processor label for user-facing output.
    fn display_processor(&self, record: &InstanceRecord) -> String {
        record.processor.clone()
    }
}

/// Shared builder for the providers' sample fallback datasets.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sample_record(
    instance_type: &str,
    vcpus: u32,
    memory_gib: f64,
    hourly_price: f64,
    family: &str,
    family_name: &str,
    processor: &str,
    current: bool,
    arm: bool,
    region: &str,
) -> InstanceRecord {
    use crate::catalog::Generation;
    use std::collections::BTreeSet;

    let mut flags = BTreeSet::new();
    if arm {
        flags.insert(ARM_FLAG.to_string());
    }
    InstanceRecord {
        instance_type: instance_type.to_string(),
        vcpus,
        memory_gib,
        hourly_price,
        family: family.to_string(),
        family_name: family_name.to_string(),
        processor: processor.to_string(),
        generation: if current {
            Generation::Current
        } else {
            Generation::Previous
        },
        architecture_flags: flags,
        region: region.to_string(),
    }
}

/// Factory keyed by provider name; the only place implementations are
/// constructed.
pub fn spec_for(provider: Provider) -> Box<dyn ProviderSpec> {
    match provider {
        Provider::Aws => Box::new(AwsSpec),
        Provider::Azure => Box::new(AzureSpec),
        Provider::Gcp => Box::new(GcpSpec),
    }
}
