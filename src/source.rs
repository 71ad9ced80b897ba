//! Raw region data sources
//!
//! A `RegionSource` hands the catalog loader the raw per-region payload:
//! a JSON object mapping instance-type name to that provider's field
//! object. Fetch failures are ordinary `Err` values; the loader responds
//! with the provider's sample dataset, so a source is free to be strict.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{CloudmatchError, Result};
use crate::provider::Provider;

/// Raw payload for one region: instance type → provider-specific fields.
pub type RegionPayload = serde_json::Map<String, Value>;

/// Source of raw instance data, keyed by provider and normalized region
/// key.
///
/// Implementations must not block indefinitely; a network-backed source
/// should time out and return `Err` so the fallback policy applies.
#[async_trait]
pub trait RegionSource: Send + Sync {
    async fn fetch(&self, provider: Provider, region_key: &str) -> Result<RegionPayload>;
}

/// Directory-backed source reading `<root>/<provider>/<region_key>.json`.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RegionSource for DirSource {
    async fn fetch(&self, provider: Provider, region_key: &str) -> Result<RegionPayload> {
        let path = self
            .root
            .join(provider.key())
            .join(format!("{region_key}.json"));
        debug!("Fetching region data from {}", path.display());

        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            CloudmatchError::DataSource {
                provider: provider.to_string(),
                region_key: region_key.to_string(),
                message: format!("cannot read {}", path.display()),
                source: Some(Box::new(err)),
            }
        })?;

        let value: Value = serde_json::from_slice(&bytes)?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(CloudmatchError::DataSource {
                provider: provider.to_string(),
                region_key: region_key.to_string(),
                message: format!(
                    "expected a JSON object of instance types, got {}",
                    type_name(&other)
                ),
                source: None,
            }),
        }
    }
}

/// Source that never has data, so every region resolves to the provider's
/// built-in sample dataset.
pub struct SampleOnlySource;

#[async_trait]
impl RegionSource for SampleOnlySource {
    async fn fetch(&self, provider: Provider, region_key: &str) -> Result<RegionPayload> {
        Err(CloudmatchError::DataSource {
            provider: provider.to_string(),
            region_key: region_key.to_string(),
            message: "sample-only source has no region data".to_string(),
            source: None,
        })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
