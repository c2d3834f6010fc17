//! CLI command runners using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

#[cfg(feature = "tui")]
mod commands;
#[cfg(feature = "tui")]
mod prompts;

#[cfg(feature = "tui")]
pub use commands::{doctor, templates_list, templates_show, templates_validate, DoctorArgs};
#[cfg(feature = "tui")]
pub use prompts::{run_new, NewArgs};
