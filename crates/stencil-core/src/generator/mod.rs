//! Project generation from template bundles
//!
//! The engine loads a descriptor, merges variables, decides which files to
//! generate, renders or copies each one in declaration order and finally
//! records what was generated in a metadata file at the output root.
//! The first failing file aborts the run; files already written stay.

pub mod condition;
pub mod project_name;

pub use project_name::{validate_new_project, validate_project_name};

use crate::error::{Result, ScaffoldError};
use crate::templates::context::{RenderingContext, TemplateInfo};
use crate::templates::descriptor::{FileSpec, TemplateDescriptor};
use crate::templates::loader::TemplateLoader;
use crate::templates::renderer::Renderer;
use crate::templates::value::Variables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default name of the generation metadata file
pub const METADATA_FILE_NAME: &str = ".stencil.yaml";

/// Schema version written into generation metadata
pub const METADATA_SCHEMA_VERSION: &str = "1.0";

/// Inputs to a generation run, already resolved by the caller
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub project_name: String,
    pub language: String,
    pub framework: String,
    /// Output root; the project name when unset
    pub output_dir: Option<PathBuf>,
    /// Caller-supplied values; these win over descriptor defaults
    pub variables: Variables,
    pub dry_run: bool,
}

impl GenerateOptions {
    pub fn template_name(&self) -> String {
        format!("{}/{}", self.language, self.framework)
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.project_name))
    }
}

/// What happened (or would happen) to one file spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileActionKind {
    /// Conditions not met
    Skipped,
    WouldRender,
    WouldCopy,
    Rendered,
    Copied,
}

/// Per-file outcome of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAction {
    pub kind: FileActionKind,
    /// Source path relative to the bundle's files directory
    pub source: String,
    /// Final path under the output root
    pub destination: PathBuf,
}

impl FileAction {
    /// True for files that are (or would be) written
    pub fn is_included(&self) -> bool {
        self.kind != FileActionKind::Skipped
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dest = self.destination.display();
        match self.kind {
            FileActionKind::Skipped => write!(f, "Skipped: {} (conditions not met)", dest),
            FileActionKind::WouldRender => write!(f, "Would render: {} -> {}", self.source, dest),
            FileActionKind::WouldCopy => write!(f, "Would copy: {} -> {}", self.source, dest),
            FileActionKind::Rendered | FileActionKind::Copied => write!(f, "Created: {}", dest),
        }
    }
}

/// Result of a successful generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// `<language>/<framework>` identifier
    pub template: String,
    pub template_version: String,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub actions: Vec<FileAction>,
    /// Merged variables the run used
    pub variables: Variables,
    /// Metadata file written, absent in dry runs
    pub metadata_file: Option<PathBuf>,
}

impl GenerationReport {
    /// Destinations of every included file, in generation order
    pub fn included(&self) -> impl Iterator<Item = &Path> {
        self.actions
            .iter()
            .filter(|a| a.is_included())
            .map(|a| a.destination.as_path())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.actions
            .iter()
            .filter(|a| !a.is_included())
            .map(|a| a.destination.as_path())
    }
}

/// Contents of the generation metadata file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub schema_version: String,
    pub template: TemplateRef,
    /// Every merged variable, rendered as its natural string form
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    pub version: String,
}

/// Generates projects from the bundles under one template root
pub struct GenerationEngine {
    loader: TemplateLoader,
    renderer: Renderer,
    metadata_file_name: String,
}

impl GenerationEngine {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader: TemplateLoader::new(templates_dir),
            renderer: Renderer::new(),
            metadata_file_name: METADATA_FILE_NAME.to_string(),
        }
    }

    /// Use a different metadata file name (e.g. per product)
    pub fn with_metadata_file_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_file_name = name.into();
        self
    }

    pub fn loader(&self) -> &TemplateLoader {
        &self.loader
    }

    pub fn metadata_file_name(&self) -> &str {
        &self.metadata_file_name
    }

    pub fn list_templates(&self) -> Result<Vec<String>> {
        self.loader.list()
    }

    pub fn get_template(&self, name: &str) -> Result<TemplateDescriptor> {
        self.loader.load(name)
    }

    /// Descriptor defaults overlaid with caller values
    ///
    /// Declarations without a default contribute nothing. Caller keys always
    /// win, including keys the descriptor never declares.
    pub fn merge_variables(descriptor: &TemplateDescriptor, overrides: &Variables) -> Variables {
        let mut merged: Variables = descriptor
            .variables
            .iter()
            .filter_map(|(key, decl)| decl.default.clone().map(|d| (key.clone(), d)))
            .collect();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Problems with merged variables relative to their declarations
    ///
    /// Advisory only: generation never enforces these.
    pub fn check_variables(descriptor: &TemplateDescriptor, merged: &Variables) -> Vec<String> {
        let mut problems = Vec::new();
        for (key, decl) in &descriptor.variables {
            match merged.get(key) {
                Some(value) => {
                    if let Err(e) = decl.check(value) {
                        problems.push(format!("{}: {}", key, e));
                    }
                }
                None if decl.required => {
                    problems.push(format!("{}: required variable has no value", key));
                }
                None => {}
            }
        }
        problems
    }

    /// Generate a project
    pub async fn generate(&self, opts: &GenerateOptions) -> Result<GenerationReport> {
        let template_name = opts.template_name();
        let descriptor =
            self.loader
                .load(&template_name)
                .map_err(|e| ScaffoldError::TemplateLoad {
                    name: template_name.clone(),
                    source: Box::new(e),
                })?;

        let variables = Self::merge_variables(&descriptor, &opts.variables);
        let output_dir = opts.resolved_output_dir();
        let ctx = RenderingContext::new(
            &opts.project_name,
            &output_dir,
            variables,
            TemplateInfo::from(&descriptor),
        );

        info!(
            "Generating {} from {} into {}{}",
            opts.project_name,
            template_name,
            output_dir.display(),
            if opts.dry_run { " (dry run)" } else { "" }
        );

        if !opts.dry_run {
            fs::create_dir_all(&output_dir)
                .await
                .map_err(|e| ScaffoldError::io(&output_dir, e))?;
        }

        let files_dir = self.loader.files_dir(&descriptor);
        let mut actions = Vec::with_capacity(descriptor.files.len());

        for spec in &descriptor.files {
            let action = if condition::all_hold(&spec.conditions, &ctx) {
                let planned = self.plan(spec, &ctx);
                if !opts.dry_run {
                    self.write(&files_dir, spec, &planned, &ctx)
                        .await
                        .map_err(|e| ScaffoldError::Generation {
                            path: planned.destination.clone(),
                            source: Box::new(e),
                        })?;
                }
                planned.finish(opts.dry_run)
            } else {
                FileAction {
                    kind: FileActionKind::Skipped,
                    ..self.plan(spec, &ctx).finish(opts.dry_run)
                }
            };

            debug!("{}", action);
            actions.push(action);
        }

        let metadata_file = if opts.dry_run {
            None
        } else {
            Some(self.write_metadata(&ctx, &descriptor).await?)
        };

        Ok(GenerationReport {
            template: template_name,
            template_version: descriptor.version.clone(),
            output_dir,
            dry_run: opts.dry_run,
            actions,
            variables: ctx.variables().clone(),
            metadata_file,
        })
    }

    /// Decide render vs copy and the final destination of an included file
    fn plan(&self, spec: &FileSpec, ctx: &RenderingContext) -> PlannedFile {
        if Renderer::should_render(&spec.source) {
            PlannedFile {
                render: true,
                source: spec.source.clone(),
                destination: ctx
                    .output_dir()
                    .join(Renderer::output_filename(&spec.destination)),
            }
        } else {
            PlannedFile {
                render: false,
                source: spec.source.clone(),
                destination: ctx.output_dir().join(&spec.destination),
            }
        }
    }

    async fn write(
        &self,
        files_dir: &Path,
        spec: &FileSpec,
        planned: &PlannedFile,
        ctx: &RenderingContext,
    ) -> Result<()> {
        let source = files_dir.join(&spec.source);
        let mode = spec.mode().map_err(|message| ScaffoldError::InvalidTemplate {
            template: ctx.template().name.clone(),
            message,
        })?;

        if planned.render {
            self.renderer
                .render_to_file(&source, &planned.destination, ctx, mode)
                .await
        } else {
            self.renderer
                .copy_file(&source, &planned.destination, mode)
                .await
        }
    }

    async fn write_metadata(
        &self,
        ctx: &RenderingContext,
        descriptor: &TemplateDescriptor,
    ) -> Result<PathBuf> {
        let metadata = GenerationMetadata {
            schema_version: METADATA_SCHEMA_VERSION.to_string(),
            template: TemplateRef {
                name: descriptor.identifier(),
                version: descriptor.version.clone(),
            },
            variables: ctx
                .variables()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        };

        let yaml = serde_yaml::to_string(&metadata).map_err(ScaffoldError::Metadata)?;
        let path = ctx.output_dir().join(&self.metadata_file_name);
        fs::write(&path, yaml)
            .await
            .map_err(|e| ScaffoldError::io(&path, e))?;

        info!("Wrote generation metadata to {}", path.display());
        Ok(path)
    }
}

struct PlannedFile {
    render: bool,
    source: String,
    destination: PathBuf,
}

impl PlannedFile {
    fn finish(self, dry_run: bool) -> FileAction {
        let kind = match (self.render, dry_run) {
            (true, true) => FileActionKind::WouldRender,
            (true, false) => FileActionKind::Rendered,
            (false, true) => FileActionKind::WouldCopy,
            (false, false) => FileActionKind::Copied,
        };
        FileAction {
            kind,
            source: self.source,
            destination: self.destination,
        }
    }
}
