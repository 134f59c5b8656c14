use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::FilterConfig;
use crate::ingest::{DuplicateKeyPolicy, IngestOptions};
use crate::schema::DatasetSchema;
use crate::tracker::{CustomField, DEFAULT_PAGE_SIZE, default_custom_fields};

pub const PROJECT_CONFIG_FILE: &str = "tickscope.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub schema: DatasetSchema,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    /// Default output mode (`pretty`, `text`, `json`) when neither a flag
    /// nor `TICKSCOPE_FORMAT` picks one.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub duplicate_keys: DuplicateKeyPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default = "default_jql")]
    pub jql: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_custom_fields")]
    pub custom_fields: Vec<CustomField>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server: None,
            jql: default_jql(),
            page_size: default_page_size(),
            custom_fields: default_custom_fields(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// JSON filter declaration, relative to the project root.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ProjectConfig {
    #[must_use]
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            schema: self.schema.clone(),
            duplicate_keys: self.ingest.duplicate_keys,
        }
    }

    /// The configured filter declaration, or the built-in default when no
    /// path is set.
    pub fn load_filter_config(&self, project_root: &Path) -> Result<FilterConfig> {
        let Some(path) = &self.filters.path else {
            return Ok(FilterConfig::default());
        };
        let path = project_root.join(path);
        FilterConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
    }
}

/// Load `tickscope.toml` from `project_root`, or defaults when absent.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded project config");
    Ok(config)
}

fn default_jql() -> String {
    "ORDER BY created DESC".to_string()
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
