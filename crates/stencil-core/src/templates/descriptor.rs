//! Template descriptor types (templates/<language>/<framework>/template.yaml)

use super::value::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// File mode applied when a file spec declares no permissions
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// In-memory form of a template bundle's metadata file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Template version, written into generation metadata
    #[serde(default)]
    pub version: String,

    /// Display name of the template
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub framework: String,

    /// Oldest CLI version this template was written for
    #[serde(default)]
    pub min_cli_version: String,

    #[serde(default)]
    pub requirements: Requirements,

    #[serde(default)]
    pub variables: BTreeMap<String, VariableDeclaration>,

    /// Files to materialize, in generation order
    #[serde(default)]
    pub files: Vec<FileSpec>,

    /// Other templates this one builds on (declared only, never generated)
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Lifecycle hooks (declared only, never executed)
    #[serde(default)]
    pub hooks: Hooks,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<Healthcheck>,

    /// Directory the descriptor was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl TemplateDescriptor {
    /// `<language>/<framework>` identifier of this template
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.language, self.framework)
    }
}

/// External tools and environment the generated project depends on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<SystemRequirement>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentRequirement>,
}

/// A command that must (or should) be installed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemRequirement {
    pub command: String,

    /// Version constraint such as `>=3.11` or `^1.2.3`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Condition enabling this requirement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
}

/// An environment variable the generated project expects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentRequirement {
    #[serde(rename = "var")]
    pub variable: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

/// Declared type of a template variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    #[serde(alias = "bool")]
    Boolean,
    Choice,
    Int,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableType::String => "string",
            VariableType::Boolean => "boolean",
            VariableType::Choice => "choice",
            VariableType::Int => "int",
        };
        f.write_str(name)
    }
}

/// Declaration of a template variable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableDeclaration {
    #[serde(rename = "type", default)]
    pub kind: VariableType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    /// Regular expression string values must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default)]
    pub description: String,
}

impl VariableDeclaration {
    /// Check a value against the declared type, choices and pattern
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match (self.kind, value) {
            (VariableType::String, Value::String(_))
            | (VariableType::Boolean, Value::Bool(_))
            | (VariableType::Int, Value::Int(_)) => {}
            (VariableType::Choice, Value::String(s)) => {
                if !self.choices.is_empty() && !self.choices.iter().any(|c| c == s) {
                    return Err(format!(
                        "'{}' is not one of: {}",
                        s,
                        self.choices.join(", ")
                    ));
                }
            }
            (kind, other) => {
                return Err(format!(
                    "expected {} but got {} '{}'",
                    kind,
                    other.type_name(),
                    other
                ));
            }
        }

        if let (Some(pattern), Value::String(s)) = (&self.pattern, value) {
            let re = Regex::new(pattern)
                .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))?;
            if !re.is_match(s) {
                return Err(format!("'{}' does not match pattern {}", s, pattern));
            }
        }

        Ok(())
    }
}

/// A file to generate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSpec {
    /// Path relative to the bundle's `files/` directory
    #[serde(rename = "src")]
    pub source: String,

    /// Path relative to the output root
    #[serde(rename = "dest")]
    pub destination: String,

    /// Every condition must hold for the file to be generated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,

    /// Octal file mode such as `755` or `0644`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
}

impl FileSpec {
    /// Effective file mode for the generated file
    pub fn mode(&self) -> Result<u32, String> {
        match self.permissions.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_FILE_MODE),
            Some(raw) => parse_mode(raw),
        }
    }
}

fn parse_mode(raw: &str) -> Result<u32, String> {
    let digits = raw.strip_prefix("0o").unwrap_or(raw);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| format!("invalid permissions '{}': expected an octal mode", raw))?;
    if mode > 0o7777 {
        return Err(format!("invalid permissions '{}': mode out of range", raw));
    }
    Ok(mode)
}

/// Reference to another template bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependency {
    pub template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hooks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_generate: Vec<Hook>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_generate: Vec<Hook>,
}

impl Hooks {
    pub fn is_empty(&self) -> bool {
        self.pre_generate.is_empty() && self.post_generate.is_empty()
    }
}

/// How a failing hook would be treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    #[default]
    Error,
    Warn,
    Ignore,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorLevel::Error => "error",
            ErrorLevel::Warn => "warn",
            ErrorLevel::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// A lifecycle hook command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    #[serde(default)]
    pub error_level: ErrorLevel,

    /// Custom message shown when the hook fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Hook {
    /// The command this hook would run, or its validation command
    pub fn command(&self) -> &str {
        self.run
            .as_deref()
            .or(self.validate.as_deref())
            .unwrap_or_default()
    }
}

/// Health check advertised for the generated project (informational)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Healthcheck {
    pub command: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
version: "1.0.0"
name: FastAPI
language: python
framework: fastapi
unknown_key: ignored
requirements:
  system:
    - command: python3
      version: ">=3.11"
      required: true
      install_hint: "https://python.org"
  environment:
    - var: DATABASE_URL
      when: "{{ .UseDatabase }}"
variables:
  IncludeDocker:
    type: boolean
    default: true
  Database:
    type: choice
    choices: [none, postgres, sqlite]
    default: none
files:
  - src: main.py.tmpl
    dest: src/main.py
  - src: run.sh
    dest: run.sh
    permissions: "755"
    conditions: ["IncludeDocker"]
hooks:
  post_generate:
    - run: git init
      error_level: warn
"#;

    #[test]
    fn test_parse_descriptor() {
        let desc: TemplateDescriptor = serde_yaml::from_str(DESCRIPTOR).unwrap();
        assert_eq!(desc.identifier(), "python/fastapi");
        assert_eq!(desc.requirements.system.len(), 1);
        assert_eq!(desc.requirements.system[0].version.as_deref(), Some(">=3.11"));
        assert!(desc.requirements.system[0].required);
        assert_eq!(desc.requirements.environment[0].variable, "DATABASE_URL");
        assert!(!desc.requirements.environment[0].required);
        assert_eq!(desc.variables["IncludeDocker"].kind, VariableType::Boolean);
        assert_eq!(desc.variables["IncludeDocker"].default, Some(Value::Bool(true)));
        assert_eq!(desc.files[1].conditions, vec!["IncludeDocker".to_string()]);
        assert_eq!(desc.hooks.post_generate[0].error_level, ErrorLevel::Warn);
        assert!(desc.healthcheck.is_none());
        assert!(desc.min_cli_version.is_empty());
    }

    #[test]
    fn test_structured_defaults_parse() {
        let desc: TemplateDescriptor = serde_yaml::from_str(
            "name: lists\nvariables:\n  Services:\n    default: [api, worker]\n",
        )
        .unwrap();
        let default = desc.variables["Services"].default.clone().unwrap();
        assert_eq!(default.to_string(), "[api, worker]");
        // Declared as a string, so the check flags it without rejecting the descriptor
        assert!(desc.variables["Services"].check(&default).is_err());
    }

    #[test]
    fn test_missing_optional_keys_take_defaults() {
        let desc: TemplateDescriptor = serde_yaml::from_str("name: bare\n").unwrap();
        assert!(desc.version.is_empty());
        assert!(desc.files.is_empty());
        assert!(desc.variables.is_empty());
        assert!(desc.hooks.is_empty());
    }

    #[test]
    fn test_file_mode_parsing() {
        let mut spec = FileSpec::default();
        assert_eq!(spec.mode(), Ok(0o644));

        spec.permissions = Some("755".to_string());
        assert_eq!(spec.mode(), Ok(0o755));

        spec.permissions = Some("0600".to_string());
        assert_eq!(spec.mode(), Ok(0o600));

        spec.permissions = Some("0o700".to_string());
        assert_eq!(spec.mode(), Ok(0o700));

        spec.permissions = Some("rwxr-xr-x".to_string());
        assert!(spec.mode().is_err());

        spec.permissions = Some("99".to_string());
        assert!(spec.mode().is_err());
    }

    #[test]
    fn test_variable_checks() {
        let choice = VariableDeclaration {
            kind: VariableType::Choice,
            choices: vec!["none".into(), "postgres".into()],
            ..Default::default()
        };
        assert!(choice.check(&Value::from("postgres")).is_ok());
        assert!(choice.check(&Value::from("mysql")).is_err());
        assert!(choice.check(&Value::Bool(true)).is_err());

        let version = VariableDeclaration {
            pattern: Some(r"^\d+\.\d+$".to_string()),
            ..Default::default()
        };
        assert!(version.check(&Value::from("3.11")).is_ok());
        assert!(version.check(&Value::from("latest")).is_err());

        let flag = VariableDeclaration {
            kind: VariableType::Boolean,
            ..Default::default()
        };
        assert!(flag.check(&Value::Bool(false)).is_ok());
        assert!(flag.check(&Value::from("false")).is_err());
    }
}
