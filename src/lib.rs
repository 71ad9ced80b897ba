//! cloudmatch library
//!
//! Core functionality for the cloudmatch recommendation engine: provider
//! catalogs, the filter/selection pipeline, and the batch orchestrator.

pub mod catalog;
pub mod csvio;
pub mod error;
pub mod filter;
pub mod options;
pub mod orchestrator;
pub mod provider;
pub mod selection;
pub mod source;

// Re-export commonly used types
pub use catalog::{Catalog, InstanceRecord};
pub use error::{CloudmatchError, Result};
pub use options::RecommendOptions;
pub use orchestrator::{run, RunContext, WorkloadRow};
pub use provider::Provider;
pub use selection::{Recommendation, Selection};
