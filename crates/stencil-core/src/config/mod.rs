//! Persisted settings and template root resolution

use crate::error::{Result, ScaffoldError};
use crate::product::ProductConfig;
use crate::runtime::ValidationLevel;
use crate::templates::value::Variables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name of the bundled template root
pub const TEMPLATES_DIR_NAME: &str = "templates";

/// Global settings file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Template root used when neither flag nor env var names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    pub validation: ValidationLevel,

    /// Variable values applied under anything given on the command line
    #[serde(skip_serializing_if = "Variables::is_empty")]
    pub defaults: Variables,
}

impl Settings {
    /// Load settings for a product
    ///
    /// Looks at the product's config env var, then `./<name>.yaml`. A named
    /// file that does not exist is an error; no file at all gives defaults.
    pub fn load<C: ProductConfig>(config: &C) -> Result<Self> {
        if let Some(path) = std::env::var_os(config.config_env()) {
            return Self::from_path(Path::new(&path));
        }
        let local = PathBuf::from(config.config_file_name());
        if local.is_file() {
            return Self::from_path(&local);
        }
        debug!("no settings file, using defaults");
        Ok(Self::default())
    }

    /// Parse a settings file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))?;
        let mut settings: Settings =
            serde_yaml::from_str(&content).map_err(|e| ScaffoldError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        // Relative template roots are relative to the settings file
        if let Some(dir) = settings.templates_dir.take() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            settings.templates_dir = Some(if dir.is_relative() { base.join(dir) } else { dir });
        }
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Pick the template root
    ///
    /// Order: explicit flag, env var, settings, `templates` beside the
    /// executable's directory, then `./templates`.
    pub fn resolve_templates_dir<C: ProductConfig>(
        &self,
        config: &C,
        flag: Option<&Path>,
    ) -> PathBuf {
        if let Some(dir) = flag {
            return dir.to_path_buf();
        }
        if let Some(dir) = std::env::var_os(config.templates_dir_env()) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        if let Some(dir) = &self.templates_dir {
            return dir.clone();
        }
        if let Some(dir) = bundled_templates_dir() {
            return dir;
        }
        PathBuf::from(TEMPLATES_DIR_NAME)
    }
}

/// `<exe dir>/../templates`, when it exists
fn bundled_templates_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.parent()?.join(TEMPLATES_DIR_NAME);
    dir.is_dir().then_some(dir)
}
