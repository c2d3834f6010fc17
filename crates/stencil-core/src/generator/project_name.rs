//! Project name validation
//!
//! Names double as directory names, so they are kept to a portable subset
//! and must never escape the working directory.

use crate::error::{Result, ScaffoldError};
use std::path::Path;

/// Check a project name's format
///
/// Rules, checked in order: non-empty, not `.` or `..`, no path separators,
/// lowercase letter followed by lowercase letters, digits or hyphens.
pub fn validate_project_name(name: &str) -> Result<()> {
    let reject = |message: &str| Err(ScaffoldError::InvalidProjectName(message.to_string()));

    if name.is_empty() {
        return reject("project name cannot be empty");
    }
    if name == "." || name == ".." {
        return reject("'.' and '..' are not allowed");
    }
    if name.contains(['/', '\\']) {
        return reject("path separators are not allowed");
    }
    if !is_portable(name) {
        return reject(
            "must start with a lowercase letter and contain only lowercase letters, numbers, and hyphens",
        );
    }
    Ok(())
}

/// Lowercase ASCII letter, then lowercase letters, digits or hyphens
fn is_portable(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Check a project name's format and that `base_dir/<name>` does not exist yet
pub fn validate_new_project(name: &str, base_dir: &Path) -> Result<()> {
    validate_project_name(name)?;
    let target = base_dir.join(name);
    if target.symlink_metadata().is_ok() {
        return Err(ScaffoldError::InvalidProjectName(format!(
            "'{}' already exists",
            target.display()
        )));
    }
    Ok(())
}
