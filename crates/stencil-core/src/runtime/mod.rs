//! Tool detection and requirement validation
//!
//! This module provides:
//! - Version parsing and constraint matching for external tools
//! - Command probing and requirement checking at a chosen validation level

pub mod check;
pub mod version;

pub use check::{
    extract_version, Finding, RequirementChecker, RuntimeInfo, ValidationLevel, ValidationReport,
};
pub use version::{compare, satisfies, Constraint, Operator, ToolVersion};
