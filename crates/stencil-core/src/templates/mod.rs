//! Template bundles: descriptor model, loading, rendering
//!
//! This module provides:
//! - Template descriptor types (`template.yaml`)
//! - Loading and listing bundles from a local template root
//! - The per-run rendering context and name casing helpers
//! - File rendering and copying
//! - CLI/template version compatibility checking

pub mod casing;
pub mod context;
pub mod descriptor;
pub mod loader;
pub mod renderer;
pub mod value;
pub mod version;

pub use context::{RenderingContext, TemplateInfo};
pub use descriptor::{
    Dependency, EnvironmentRequirement, ErrorLevel, FileSpec, Healthcheck, Hook, Hooks,
    Requirements, SystemRequirement, TemplateDescriptor, VariableDeclaration, VariableType,
    DEFAULT_FILE_MODE,
};
pub use loader::{TemplateLoader, FILES_DIR, METADATA_FILE};
pub use renderer::{Renderer, TEMPLATE_SUFFIX};
pub use value::{Value, Variables};
pub use version::check_compatibility;
