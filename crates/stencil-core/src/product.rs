//! Product configuration trait for CLI binaries
//!
//! The binary implements this trait to name itself and the environment
//! variables and files it reads, so the library never hardcodes them.

use crate::templates::value::Variables;
use std::path::Path;

/// Configuration trait for a scaffolding CLI product
///
/// Implementors define:
/// - Product identity (name, display name)
/// - Where templates and settings are looked up
/// - Post-generation instructions
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Environment variable overriding the template root
    fn templates_dir_env(&self) -> &'static str;

    /// Environment variable pointing at the settings file
    fn config_env(&self) -> &'static str;

    /// Settings file looked up in the working directory
    fn config_file_name(&self) -> String {
        format!("{}.yaml", self.name())
    }

    /// Generation metadata file written into each new project
    fn metadata_file_name(&self) -> String {
        format!(".{}.yaml", self.name())
    }

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// Generate the "next steps" instructions after project creation
    fn next_steps(&self, dir: &Path, language: &str, variables: &Variables) -> Vec<String>;
}
