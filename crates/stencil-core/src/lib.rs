//! Stencil Core - Project generation from language/framework template bundles
//!
//! This library loads template bundles from a local template root, renders
//! them into new projects and checks that the tools a generated project
//! needs are installed. It is driven by the `stencil` binary but has no
//! dependency on it: product identity comes in through [`ProductConfig`].
//!
//! # Architecture
//!
//! - **Templates** - descriptor model, loading, rendering context, rendering
//! - **Generator** - the generation run itself, conditions, name validation
//! - **Runtime** - version constraints and requirement checks
//! - **TUI** - cliclack-based command runners (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based command runners
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use stencil_core::{GenerateOptions, GenerationEngine};
//!
//! let engine = GenerationEngine::new("templates");
//! let report = engine
//!     .generate(&GenerateOptions {
//!         project_name: "my-api".into(),
//!         language: "python".into(),
//!         framework: "fastapi".into(),
//!         dry_run: true,
//!         ..Default::default()
//!     })
//!     .await?;
//! for action in &report.actions {
//!     println!("{action}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod product;
pub mod runtime;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::Settings;
pub use error::{Result, ScaffoldError};
pub use generator::{
    validate_new_project, validate_project_name, FileAction, FileActionKind, GenerateOptions,
    GenerationEngine, GenerationMetadata, GenerationReport,
};
pub use product::ProductConfig;
pub use runtime::{RequirementChecker, ValidationLevel, ValidationReport};
pub use templates::{RenderingContext, Renderer, TemplateDescriptor, TemplateLoader, Value, Variables};

/// CLI version - used for template compatibility checking
/// Each binary should define its own version, but this provides a fallback
pub const DEFAULT_CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
