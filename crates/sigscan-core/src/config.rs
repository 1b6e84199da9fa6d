//! Project-level settings: an optional `sigscan.json` at the project root,
//! overridden by `SIGSCAN_*` environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::{SigscanError, SigscanResult};
use crate::export::ExportOptions;
use crate::indexer::filesystem::parse_env_flag;

pub const CONFIG_FILE_NAME: &str = "sigscan.json";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SigscanConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<String>,
    pub exclude_internal: bool,
    pub exclude_private: bool,
    pub include_events: bool,
    pub include_errors: bool,
    pub separate_by_category: bool,
    pub deduplicate: bool,
    pub update_existing: bool,
    /// Directory names skipped during discovery, on top of `.git` and
    /// `node_modules`.
    pub extra_ignored_dirs: Vec<String>,
}

impl Default for SigscanConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("signatures"),
            formats: vec!["txt".to_string(), "json".to_string()],
            exclude_internal: true,
            exclude_private: true,
            include_events: true,
            include_errors: true,
            separate_by_category: true,
            deduplicate: true,
            update_existing: true,
            extra_ignored_dirs: Vec::new(),
        }
    }
}

impl SigscanConfig {
    /// Parse a config file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> SigscanResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SigscanError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| SigscanError::Config(format!("{}: {e}", path.display())))
    }

    /// `sigscan.json` under `root` if present, then environment overrides.
    pub fn load(root: &Path) -> SigscanResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let mut config = if path.is_file() {
            debug!(path = %path.display(), "loading config file");
            Self::from_json_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `SIGSCAN_*` overrides read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SIGSCAN_OUTPUT_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Some(formats) = lookup("SIGSCAN_FORMATS") {
            let formats: Vec<String> = formats
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            if !formats.is_empty() {
                self.formats = formats;
            }
        }
        if let Some(value) = lookup("SIGSCAN_EXCLUDE_INTERNAL") {
            self.exclude_internal = parse_env_flag(&value);
        }
        if let Some(value) = lookup("SIGSCAN_EXCLUDE_PRIVATE") {
            self.exclude_private = parse_env_flag(&value);
        }
    }

    /// Export options for a project at `root`; a relative output directory is
    /// resolved against it.
    pub fn export_options(&self, root: &Path) -> ExportOptions {
        let output_dir = if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            root.join(&self.output_dir)
        };
        ExportOptions {
            formats: self.formats.clone(),
            output_dir,
            include_internal: !self.exclude_internal,
            include_private: !self.exclude_private,
            include_events: self.include_events,
            include_errors: self.include_errors,
            separate_by_category: self.separate_by_category,
            deduplicate: self.deduplicate,
            update_existing: self.update_existing,
        }
    }
}
