//! Compatibility between the running CLI and a template's `min_cli_version`

use crate::error::{Result, ScaffoldError};
use semver::Version;

/// Warning text when the CLI is older than the template's `min_cli_version`
///
/// Returns `None` when the template declares no minimum, when either version
/// cannot be parsed, or when the CLI is new enough.
pub fn check_compatibility(
    cli_version: &str,
    min_cli_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    if min_cli_version.trim().is_empty() {
        return None;
    }
    let cli_ver = parse_version(cli_version).ok()?;
    let min_ver = parse_version(min_cli_version).ok()?;

    if cli_ver < min_ver {
        Some(format!(
            "This template requires CLI version {} or newer.\n\
             You are running version {}.\n\
             Consider updating: {}",
            min_cli_version, cli_version, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse a semver string, tolerating a leading `v`
pub fn parse_version(version_str: &str) -> Result<Version> {
    let trimmed = version_str.trim();
    let cleaned = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(cleaned).map_err(|e| ScaffoldError::invalid_version(version_str, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_older_than_template() {
        let warning = check_compatibility("0.1.0", "0.2.0", "cargo install stencil-cli --force");
        assert!(warning.is_some());
        assert!(warning.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_cli_same_as_template() {
        assert!(check_compatibility("0.1.0", "0.1.0", "upgrade").is_none());
    }

    #[test]
    fn test_cli_newer_than_template() {
        assert!(check_compatibility("0.2.0", "v0.1.0", "upgrade").is_none());
    }

    #[test]
    fn test_no_minimum_declared() {
        assert!(check_compatibility("0.1.0", "", "upgrade").is_none());
    }

    #[test]
    fn test_invalid_versions() {
        assert!(check_compatibility("invalid", "0.1.0", "upgrade").is_none());
        assert!(check_compatibility("0.1.0", "1.0", "upgrade").is_none());
    }
}
