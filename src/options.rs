//! Recommendation options
//!
//! `RecommendOptions` is the single configuration surface passed into the
//! orchestrator: which recommendation kinds to generate, the filter
//! restrictions, and the resize thresholds. It deserializes from a TOML
//! file for the CLI and converts into the engine-facing `FilterOptions`
//! and `ResizePolicy` value objects per run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OptionsError, Result};
use crate::filter::{ExcludePattern, FilterOptions};
use crate::selection::ResizePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendOptions {
    /// Generate Like-to-Like recommendations. Independent of
    /// `generate_optimized`; both may be true.
    pub generate_like_to_like: bool,
    /// Generate utilization-driven Optimized recommendations.
    pub generate_optimized: bool,

    pub current_generation_only: bool,
    pub restrict_instance_family_names: bool,
    pub selected_instance_family_names: BTreeSet<String>,
    pub restrict_processor_manufacturers: bool,
    pub selected_processor_manufacturers: BTreeSet<String>,
    pub restrict_main_families: bool,
    pub selected_main_families: BTreeSet<String>,
    /// Per-provider instance-type exclusions. "Graviton"/"ARM" tokens
    /// additionally switch on architecture exclusion.
    pub exclude_types: Vec<ExcludePattern>,
    /// Exclude ARM-based families (Graviton / Ampere / Tau) outright.
    pub exclude_architecture: bool,

    pub cpu_based: bool,
    pub memory_based: bool,
    pub cpu_downsize_max: u8,
    pub cpu_upsize_min: u8,
    pub memory_downsize_max: u8,
    pub memory_upsize_min: u8,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            generate_like_to_like: true,
            generate_optimized: false,
            current_generation_only: false,
            restrict_instance_family_names: false,
            selected_instance_family_names: BTreeSet::new(),
            restrict_processor_manufacturers: false,
            selected_processor_manufacturers: BTreeSet::new(),
            restrict_main_families: false,
            selected_main_families: BTreeSet::new(),
            exclude_types: Vec::new(),
            exclude_architecture: false,
            cpu_based: false,
            memory_based: false,
            cpu_downsize_max: 50,
            cpu_upsize_min: 80,
            memory_downsize_max: 50,
            memory_upsize_min: 80,
        }
    }
}

impl RecommendOptions {
    /// Thresholds must be percentages. Checked before any row work so a
    /// bad options file fails the whole run up front.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("cpu_downsize_max", self.cpu_downsize_max),
            ("cpu_upsize_min", self.cpu_upsize_min),
            ("memory_downsize_max", self.memory_downsize_max),
            ("memory_upsize_min", self.memory_upsize_min),
        ] {
            if value > 100 {
                return Err(OptionsError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be a percentage in 0-100, got {value}"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Engine-facing filter inputs. A restrict flag without a selection
    /// leaves that allowlist inert, matching the option surface's
    /// checkbox-plus-list shape.
    pub fn filter_options(&self) -> FilterOptions {
        let allow = |restrict: bool, set: &BTreeSet<String>| {
            if restrict && !set.is_empty() {
                Some(set.clone())
            } else {
                None
            }
        };

        // "Graviton" / "ARM" exclude tokens mean the architecture, not a
        // type-name substring.
        let architecture_token = self
            .exclude_types
            .iter()
            .any(|p| matches!(p.token.to_lowercase().as_str(), "graviton" | "arm"));

        FilterOptions {
            current_generation_only: self.current_generation_only,
            allowed_family_names: allow(
                self.restrict_instance_family_names,
                &self.selected_instance_family_names,
            ),
            allowed_processors: allow(
                self.restrict_processor_manufacturers,
                &self.selected_processor_manufacturers,
            ),
            allowed_main_families: allow(
                self.restrict_main_families,
                &self.selected_main_families,
            ),
            exclude_patterns: self.exclude_types.clone(),
            exclude_architecture: self.exclude_architecture || architecture_token,
        }
    }

    pub fn resize_policy(&self) -> ResizePolicy {
        ResizePolicy {
            cpu_based: self.cpu_based,
            memory_based: self.memory_based,
            cpu_downsize_max: self.cpu_downsize_max,
            cpu_upsize_min: self.cpu_upsize_min,
            memory_downsize_max: self.memory_downsize_max,
            memory_upsize_min: self.memory_upsize_min,
        }
    }

    /// Load options from `path`, or from `./cloudmatch.toml` /
    /// `~/.config/cloudmatch/options.toml`, falling back to defaults
    /// when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let options_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            let local = PathBuf::from("cloudmatch.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("cloudmatch").join("options.toml"))
                    .unwrap_or(local)
            }
        };

        if !options_path.exists() {
            if path.is_some() {
                return Err(OptionsError::NotFound(options_path.display().to_string()).into());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&options_path)?;
        let options: RecommendOptions = toml::from_str(&content).map_err(|err| {
            OptionsError::ParseError(format!("{}: {}", options_path.display(), err))
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|err| OptionsError::ParseError(err.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Write a default options file for the user to edit.
pub fn init_options(output: &Path) -> Result<()> {
    RecommendOptions::default().save(output)?;
    println!("Created options file: {}", output.display());
    Ok(())
}
