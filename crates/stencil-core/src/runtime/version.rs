//! Tool version parsing and constraint matching
//!
//! Versions are `MAJOR[.MINOR[.PATCH]]` with an optional leading `v`;
//! missing components are zero and components past the third are ignored.
//! Constraints are a version with an optional operator: `=`, `>`, `>=`,
//! `<`, `<=`, `^` (same major, not older) or `~` (same major and minor,
//! not older). No operator means `=`.

use crate::error::{Result, ScaffoldError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ToolVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for ToolVersion {
    type Err = ScaffoldError;

    fn from_str(input: &str) -> Result<Self> {
        let cleaned = input.strip_prefix('v').unwrap_or(input);
        let mut parts = [0u64; 3];
        for (slot, component) in parts.iter_mut().zip(cleaned.split('.')) {
            *slot = component.parse().map_err(|_| {
                ScaffoldError::invalid_version(
                    input,
                    format!("invalid version component '{}'", component),
                )
            })?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Constraint operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    Caret,
    Tilde,
}

impl Operator {
    /// Longest operators first so `>=` is not read as `>`
    const PREFIXES: [(&'static str, Operator); 7] = [
        (">=", Operator::Ge),
        ("<=", Operator::Le),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
        ("^", Operator::Caret),
        ("~", Operator::Tilde),
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Caret => "^",
            Operator::Tilde => "~",
        }
    }
}

/// A parsed version constraint such as `>=3.11` or `^1.2.3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub op: Operator,
    pub version: ToolVersion,
}

impl Constraint {
    pub fn matches(&self, current: &ToolVersion) -> bool {
        let ord = current.cmp(&self.version);
        let req = &self.version;
        match self.op {
            Operator::Eq => ord == Ordering::Equal,
            Operator::Gt => ord == Ordering::Greater,
            Operator::Ge => ord != Ordering::Less,
            Operator::Lt => ord == Ordering::Less,
            Operator::Le => ord != Ordering::Greater,
            Operator::Caret => ord != Ordering::Less && current.major == req.major,
            Operator::Tilde => {
                ord != Ordering::Less && current.major == req.major && current.minor == req.minor
            }
        }
    }
}

impl FromStr for Constraint {
    type Err = ScaffoldError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (op, rest) = Operator::PREFIXES
            .iter()
            .find_map(|(prefix, op)| trimmed.strip_prefix(prefix).map(|rest| (*op, rest)))
            .unwrap_or((Operator::Eq, trimmed));
        let version = rest.trim().parse()?;
        Ok(Self { op, version })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.version)
    }
}

/// Parse a version string
pub fn parse(version: &str) -> Result<ToolVersion> {
    version.parse()
}

/// Three-way comparison of two version strings
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse(a)?.cmp(&parse(b)?))
}

/// Whether `current` satisfies `constraint`
pub fn satisfies(current: &str, constraint: &str) -> Result<bool> {
    let constraint: Constraint = constraint.parse()?;
    let current = parse(current.trim())?;
    Ok(constraint.matches(&current))
}
