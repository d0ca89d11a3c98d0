//! Configuration schema for termy
//!
//! Spec-Up-T projects carry a `specs.json` at the repository root describing
//! where term definitions live and which external specifications to pull
//! terms from. This crate models that file and nothing else; retrieving it
//! is the embedding application's job (in the `termy` crate it arrives
//! through the `RepoFiles` capability).
//!
//! A missing or malformed `specs.json` degrades to [`SpecsConfig::default`]
//! rather than failing an index build.

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

fn default_spec_directory() -> String {
    "./spec".to_string()
}

fn default_terms_directory() -> String {
    "terms-definitions".to_string()
}

/// Root of `specs.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecsConfig {
    /// Spec entries; the first one is authoritative for this repository.
    #[serde(default)]
    pub specs: Vec<SpecEntry>,
}

/// One spec entry from `specs.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    /// Directory holding the spec's markdown sources, e.g. `./spec`.
    #[serde(default = "default_spec_directory")]
    pub spec_directory: String,
    /// Subdirectory of `spec_directory` holding term-definition files.
    #[serde(default = "default_terms_directory")]
    pub spec_terms_directory: String,
    /// Cross-repository term sources.
    #[serde(default)]
    pub external_specs: Vec<ExternalSpecDescriptor>,
}

/// Configuration entry describing one cross-repository term source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSpecDescriptor {
    /// Short identifier used in `tref`/`xref` markup to select this source.
    pub external_spec: String,
    /// URL of the published HTML page to fetch and parse for terms.
    #[serde(default)]
    pub gh_page: String,
    /// Source repository URL. Informational; not used when fetching.
    #[serde(default)]
    pub url: String,
    /// Terms directory within the source repository. Informational; the
    /// fetch path reads the rendered page, not raw source files.
    #[serde(default)]
    pub terms_dir: String,
}

impl Default for SpecEntry {
    fn default() -> Self {
        Self {
            spec_directory: default_spec_directory(),
            spec_terms_directory: default_terms_directory(),
            external_specs: Vec::new(),
        }
    }
}

impl Default for SpecsConfig {
    fn default() -> Self {
        Self {
            specs: vec![SpecEntry::default()],
        }
    }
}

impl SpecsConfig {
    /// Parse a `specs.json` document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse specs.json")
    }

    /// The authoritative spec entry (the first one), falling back to the
    /// built-in defaults when the list is empty.
    pub fn primary(&self) -> SpecEntry {
        self.specs.first().cloned().unwrap_or_default()
    }

    /// Resolved terms-directory path, `<spec_directory>/<spec_terms_directory>`
    /// with the leading `./` and surrounding slashes normalized away.
    pub fn terms_path(&self) -> String {
        self.primary().terms_path()
    }

    /// External spec descriptors of the primary entry.
    pub fn external_specs(&self) -> Vec<ExternalSpecDescriptor> {
        self.primary().external_specs
    }
}

impl SpecEntry {
    /// Resolved terms-directory path for this entry.
    pub fn terms_path(&self) -> String {
        let spec_dir = self
            .spec_directory
            .trim_start_matches("./")
            .trim_matches('/');
        let terms_dir = self.spec_terms_directory.trim_matches('/');
        if spec_dir.is_empty() {
            terms_dir.to_string()
        } else if terms_dir.is_empty() {
            spec_dir.to_string()
        } else {
            format!("{spec_dir}/{terms_dir}")
        }
    }
}
