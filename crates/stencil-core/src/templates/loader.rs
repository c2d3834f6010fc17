//! Template bundle discovery and loading from a local template root

use super::descriptor::TemplateDescriptor;
use crate::error::{Result, ScaffoldError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Metadata file at the root of every template bundle
pub const METADATA_FILE: &str = "template.yaml";

/// Subdirectory of a bundle holding its payload files
pub const FILES_DIR: &str = "files";

/// Loads template bundles laid out as `<root>/<language>/<framework>/template.yaml`
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    templates_dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Load and validate a bundle by its `<language>/<framework>` name
    pub fn load(&self, name: &str) -> Result<TemplateDescriptor> {
        let template_path = self.templates_dir.join(name);
        if !template_path.is_dir() {
            return Err(ScaffoldError::NotFound(name.to_string()));
        }

        let metadata_path = template_path.join(METADATA_FILE);
        debug!("Loading template metadata from {}", metadata_path.display());

        let content =
            fs::read_to_string(&metadata_path).map_err(|e| ScaffoldError::MalformedMetadata {
                path: metadata_path.clone(),
                message: e.to_string(),
            })?;

        let mut descriptor: TemplateDescriptor =
            serde_yaml::from_str(&content).map_err(|e| ScaffoldError::MalformedMetadata {
                path: metadata_path.clone(),
                message: e.to_string(),
            })?;
        descriptor.path = template_path;

        self.validate(name, &descriptor)?;
        Ok(descriptor)
    }

    /// Identifiers of every bundle under the root, in lexicographic order
    ///
    /// A directory is a bundle iff it directly contains the metadata file.
    /// Payload directories of bundles are not searched.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.templates_dir.is_dir() {
            return Err(ScaffoldError::NotFound(format!(
                "template directory {}",
                self.templates_dir.display()
            )));
        }

        let mut templates = Vec::new();
        let walker = WalkDir::new(&self.templates_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_payload_dir(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry while listing templates: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != METADATA_FILE {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let Ok(relative) = dir.strip_prefix(&self.templates_dir) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }

            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            templates.push(id);
        }

        templates.sort();
        Ok(templates)
    }

    /// Directory holding a loaded bundle's payload files
    pub fn files_dir(&self, descriptor: &TemplateDescriptor) -> PathBuf {
        descriptor.path.join(FILES_DIR)
    }

    fn validate(&self, name: &str, descriptor: &TemplateDescriptor) -> Result<()> {
        let invalid = |message: String| ScaffoldError::InvalidTemplate {
            template: name.to_string(),
            message,
        };

        if descriptor.version.trim().is_empty() {
            return Err(invalid("version is required".to_string()));
        }
        if descriptor.name.trim().is_empty() {
            return Err(invalid("name is required".to_string()));
        }
        if descriptor.language.trim().is_empty() {
            return Err(invalid("language is required".to_string()));
        }

        let files_dir = self.files_dir(descriptor);
        for file in &descriptor.files {
            if !files_dir.join(&file.source).is_file() {
                return Err(invalid(format!("file not found: {}", file.source)));
            }
            file.mode().map_err(|e| invalid(format!("{}: {}", file.source, e)))?;
        }

        Ok(())
    }
}

/// `files/` directory sitting next to a bundle's metadata file
fn is_payload_dir(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == FILES_DIR)
        && path
            .parent()
            .is_some_and(|parent| parent.join(METADATA_FILE).is_file())
}
