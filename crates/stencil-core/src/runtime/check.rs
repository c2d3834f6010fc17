//! External command probing and requirement validation

use super::version::{self as tool_version, Constraint};
use crate::generator::condition;
use crate::templates::descriptor::{EnvironmentRequirement, Requirements, SystemRequirement};
use crate::templates::value::Variables;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Version-query invocations, tried in order until one yields a version
pub const VERSION_FLAGS: [&str; 4] = ["--version", "-version", "-v", "version"];

static VERSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"v?(\d+\.\d+\.\d+)",
        r"v?(\d+\.\d+)",
        r"version\s+v?(\d+\.\d+\.\d+)",
        r"(\d+\.\d+\.\d+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// How strictly requirements are enforced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Skip all checks
    None,
    #[default]
    Basic,
    /// Version mismatches are errors
    Strict,
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationLevel::None => "none",
            ValidationLevel::Basic => "basic",
            ValidationLevel::Strict => "strict",
        };
        f.write_str(name)
    }
}

/// Probe result for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub name: String,
    /// First version found in the command's output, if any
    pub version: Option<String>,
    pub available: bool,
}

/// One problem found during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Command or environment variable the finding is about
    pub subject: String,
    pub message: String,
    pub install_hint: Option<String>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Errors block generation, warnings are advisory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    /// Every command probed, in declaration order; disabled requirements are absent
    pub probed: Vec<RuntimeInfo>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }

    fn push(&mut self, error: bool, finding: Finding) {
        if error {
            self.errors.push(finding);
        } else {
            self.warnings.push(finding);
        }
    }

    fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.probed.extend(other.probed);
    }
}

/// Pull the first version-looking substring out of command output
pub fn extract_version(output: &str) -> Option<String> {
    VERSION_PATTERNS
        .iter()
        .find_map(|re| re.captures(output))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Probes installed commands and validates declared requirements
#[derive(Debug, Clone, Default)]
pub struct RequirementChecker {
    level: ValidationLevel,
    scope: Option<Variables>,
    probe_timeout: Option<Duration>,
}

impl RequirementChecker {
    pub fn new(level: ValidationLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Evaluate `when` conditions against these variables
    ///
    /// Without a scope every requirement is checked.
    pub fn with_scope(mut self, variables: Variables) -> Self {
        self.scope = Some(variables);
        self
    }

    /// Abandon a single version query after `timeout`
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    pub fn level(&self) -> ValidationLevel {
        self.level
    }

    /// Whether `command` resolves on the search path, and its version
    ///
    /// Absence and an unreadable version are normal outcomes, not errors.
    pub async fn check_command(&self, command: &str) -> RuntimeInfo {
        let Ok(path) = which::which(command) else {
            debug!(command, "not found on PATH");
            return RuntimeInfo {
                name: command.to_string(),
                version: None,
                available: false,
            };
        };

        let mut version = None;
        for flag in VERSION_FLAGS {
            if let Some(output) = self.query(&path, flag).await {
                if let Some(found) = extract_version(&output) {
                    debug!(command, flag, version = %found, "detected version");
                    version = Some(found);
                    break;
                }
            }
        }

        RuntimeInfo {
            name: command.to_string(),
            version,
            available: true,
        }
    }

    /// Run one version query, returning combined stdout and stderr on success
    async fn query(&self, program: &std::path::Path, flag: &str) -> Option<String> {
        let output = Command::new(program)
            .arg(flag)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match self.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, output).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(program = %program.display(), flag, "version query timed out");
                    return None;
                }
            },
            None => output.await,
        };

        match output {
            Ok(out) if out.status.success() => {
                let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&out.stderr));
                Some(combined)
            }
            _ => None,
        }
    }

    fn enabled(&self, when: Option<&str>) -> bool {
        match (&self.scope, when.map(str::trim)) {
            (Some(scope), Some(cond)) if !cond.is_empty() => condition::evaluate_in(cond, scope),
            _ => true,
        }
    }

    /// Check system requirements in declaration order
    pub async fn validate(&self, requirements: &[SystemRequirement]) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.level == ValidationLevel::None {
            return report;
        }

        for req in requirements {
            if !self.enabled(req.when.as_deref()) {
                debug!(command = %req.command, "requirement disabled by condition");
                continue;
            }

            let info = self.check_command(&req.command).await;
            let available = info.available;
            let detected = info.version.clone();
            report.probed.push(info);

            if !available {
                report.push(
                    req.required,
                    Finding {
                        subject: req.command.clone(),
                        message: "not installed".to_string(),
                        install_hint: req.install_hint.clone(),
                    },
                );
                continue;
            }

            let (Some(wanted), Some(found)) = (req.version.as_deref(), detected.as_deref())
            else {
                continue;
            };
            let strict = self.level == ValidationLevel::Strict;

            match wanted.parse::<Constraint>() {
                Ok(constraint) => match tool_version::parse(found) {
                    Ok(current) if constraint.matches(&current) => {
                        debug!(command = %req.command, %current, %constraint, "version ok");
                    }
                    Ok(current) => report.push(
                        strict,
                        Finding {
                            subject: req.command.clone(),
                            message: format!("version {} does not satisfy {}", current, wanted),
                            install_hint: req.install_hint.clone(),
                        },
                    ),
                    Err(e) => debug!(command = %req.command, error = %e, "unreadable version"),
                },
                Err(e) => report.push(
                    strict,
                    Finding {
                        subject: req.command.clone(),
                        message: format!("invalid version constraint: {}", e),
                        install_hint: None,
                    },
                ),
            }
        }

        report
    }

    /// Check that expected environment variables are set and non-empty
    pub fn validate_environment(&self, requirements: &[EnvironmentRequirement]) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.level == ValidationLevel::None {
            return report;
        }

        for req in requirements {
            if !self.enabled(req.when.as_deref()) {
                continue;
            }
            let set = std::env::var_os(&req.variable).is_some_and(|v| !v.is_empty());
            if !set {
                report.push(
                    req.required,
                    Finding {
                        subject: req.variable.clone(),
                        message: "environment variable is not set".to_string(),
                        install_hint: None,
                    },
                );
            }
        }

        report
    }

    /// Check every system and environment requirement of a template
    pub async fn validate_requirements(&self, requirements: &Requirements) -> ValidationReport {
        let mut report = self.validate(&requirements.system).await;
        report.extend(self.validate_environment(&requirements.environment));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::value::Value;

    const MISSING: &str = "stencil-definitely-missing-command-4242";

    fn missing(required: bool) -> SystemRequirement {
        SystemRequirement {
            command: MISSING.to_string(),
            required,
            install_hint: Some("install it".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("Python 3.11.5").as_deref(), Some("3.11.5"));
        assert_eq!(extract_version("v20.10.0\n").as_deref(), Some("20.10.0"));
        assert_eq!(
            extract_version("git version 2.43.0").as_deref(),
            Some("2.43.0")
        );
        assert_eq!(
            extract_version("Docker version 24.0.7, build afdd53b").as_deref(),
            Some("24.0.7")
        );
        assert_eq!(extract_version("go1.22").as_deref(), Some("1.22"));
        assert_eq!(extract_version("no digits here"), None);
    }

    #[tokio::test]
    async fn test_absent_command_is_not_installed() {
        let info = RequirementChecker::default().check_command(MISSING).await;
        assert!(!info.available);
        assert!(info.version.is_none());
    }

    #[tokio::test]
    async fn test_required_absent_command_is_one_error() {
        let report = RequirementChecker::default()
            .validate(&[missing(true)])
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 0);
        assert_eq!(report.errors[0].subject, MISSING);
        assert_eq!(report.errors[0].install_hint.as_deref(), Some("install it"));
    }

    #[tokio::test]
    async fn test_optional_absent_command_is_one_warning() {
        let report = RequirementChecker::default()
            .validate(&[missing(false)])
            .await;
        assert_eq!(report.errors.len(), 0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_level_none_skips_everything() {
        let checker = RequirementChecker::new(ValidationLevel::None);
        assert!(checker.validate(&[missing(true)]).await.is_clean());
    }

    #[tokio::test]
    async fn test_when_is_ignored_without_scope() {
        let mut req = missing(true);
        req.when = Some("{{ .IncludeDocker }}".to_string());
        let report = RequirementChecker::default().validate(&[req]).await;
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_when_honoured_with_scope() {
        let mut req = missing(true);
        req.when = Some("{{ .IncludeDocker }}".to_string());

        let off = Variables::from([("IncludeDocker".to_string(), Value::Bool(false))]);
        let report = RequirementChecker::default()
            .with_scope(off)
            .validate(std::slice::from_ref(&req))
            .await;
        assert!(report.is_clean());
        assert!(report.probed.is_empty());

        let on = Variables::from([("IncludeDocker".to_string(), Value::Bool(true))]);
        let report = RequirementChecker::default()
            .with_scope(on)
            .validate(&[req])
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.probed.len(), 1);
        assert!(!report.probed[0].available);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_each_requirement_is_probed_once() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls");
        let tool = dir.path().join("counted-tool");
        std::fs::write(
            &tool,
            format!(
                "#!/bin/sh\necho \"$1\" >> '{}'\necho \"counted-tool 4.5.6\"\n",
                calls.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let requirements = Requirements {
            system: vec![SystemRequirement {
                command: tool.display().to_string(),
                version: Some(">=4".to_string()),
                required: true,
                ..Default::default()
            }],
            environment: Vec::new(),
        };
        let report = RequirementChecker::default()
            .validate_requirements(&requirements)
            .await;

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.probed.len(), 1);
        assert_eq!(report.probed[0].version.as_deref(), Some("4.5.6"));
        // One version query, answered by the first flag
        assert_eq!(std::fs::read_to_string(&calls).unwrap(), "--version\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_mismatch_tier_follows_level() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-tool");
        std::fs::write(&tool, "#!/bin/sh\necho \"fake-tool version 1.2.3\"\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let req = SystemRequirement {
            command: tool.display().to_string(),
            version: Some(">=2.0".to_string()),
            required: false,
            ..Default::default()
        };

        let basic = RequirementChecker::new(ValidationLevel::Basic)
            .with_probe_timeout(Duration::from_secs(10))
            .validate(std::slice::from_ref(&req))
            .await;
        assert_eq!((basic.errors.len(), basic.warnings.len()), (0, 1));

        let strict = RequirementChecker::new(ValidationLevel::Strict)
            .validate(std::slice::from_ref(&req))
            .await;
        assert_eq!((strict.errors.len(), strict.warnings.len()), (1, 0));

        let ok = SystemRequirement {
            version: Some("^1.2".to_string()),
            ..req.clone()
        };
        let report = RequirementChecker::new(ValidationLevel::Strict)
            .validate(&[ok])
            .await;
        assert!(report.is_clean());

        let malformed = SystemRequirement {
            version: Some(">=latest".to_string()),
            ..req
        };
        let report = RequirementChecker::new(ValidationLevel::Basic)
            .validate(&[malformed])
            .await;
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("invalid version constraint"));
    }

    #[test]
    fn test_environment_requirements() {
        std::env::set_var("STENCIL_TEST_ENV_PRESENT", "1");
        let reqs = [
            EnvironmentRequirement {
                variable: "STENCIL_TEST_ENV_PRESENT".to_string(),
                required: true,
                when: None,
            },
            EnvironmentRequirement {
                variable: "STENCIL_TEST_ENV_ABSENT_REQUIRED".to_string(),
                required: true,
                when: None,
            },
            EnvironmentRequirement {
                variable: "STENCIL_TEST_ENV_ABSENT_OPTIONAL".to_string(),
                required: false,
                when: None,
            },
        ];
        let report = RequirementChecker::default().validate_environment(&reqs);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].subject, "STENCIL_TEST_ENV_ABSENT_REQUIRED");
        assert_eq!(report.warnings.len(), 1);
    }
}
