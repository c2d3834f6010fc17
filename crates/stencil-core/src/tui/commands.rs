//! Non-generating commands: `doctor` and `templates`

use crate::config::Settings;
use crate::generator::GenerationEngine;
use crate::runtime::{RequirementChecker, ValidationLevel, ValidationReport};
use crate::templates::{
    Requirements, SystemRequirement, TemplateDescriptor, TemplateLoader, DEFAULT_FILE_MODE,
};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// Arguments for the `doctor` command
#[derive(Debug, Clone, Default)]
pub struct DoctorArgs {
    /// `<language>/<framework>` to check; the baseline tools when unset
    pub template: Option<String>,

    pub strict: bool,
}

/// Tools every generated project is assumed to need
fn baseline_requirements() -> Requirements {
    Requirements {
        system: vec![SystemRequirement {
            command: "git".to_string(),
            required: true,
            install_hint: Some("https://git-scm.com/downloads".to_string()),
            ..Default::default()
        }],
        environment: Vec::new(),
    }
}

/// Print findings with their install hints
pub(super) fn print_report(report: &ValidationReport) -> Result<()> {
    for finding in &report.errors {
        cliclack::log::error(with_hint(finding))?;
    }
    for finding in &report.warnings {
        cliclack::log::warning(with_hint(finding))?;
    }
    Ok(())
}

fn with_hint(finding: &crate::runtime::Finding) -> String {
    match &finding.install_hint {
        Some(hint) => format!("{}\n  install: {}", finding, hint),
        None => finding.to_string(),
    }
}

/// Check the tools a template (or every project) needs
pub async fn doctor(settings: &Settings, templates_dir: &Path, args: DoctorArgs) -> Result<()> {
    cliclack::intro("doctor")?;

    let level = if args.strict {
        ValidationLevel::Strict
    } else {
        settings.validation
    };

    let (requirements, checker) = match &args.template {
        Some(id) => {
            let descriptor = TemplateLoader::new(templates_dir)
                .load(id)
                .with_context(|| format!("Failed to load template '{}'", id))?;
            cliclack::log::info(format!("Checking requirements of {}", id))?;
            let scope = GenerationEngine::merge_variables(&descriptor, &settings.defaults);
            (
                descriptor.requirements,
                RequirementChecker::new(level).with_scope(scope),
            )
        }
        None => (baseline_requirements(), RequirementChecker::new(level)),
    };

    let report = checker.validate_requirements(&requirements).await;
    for info in &report.probed {
        let line = match (info.available, &info.version) {
            (true, Some(version)) => format!("{} {}", info.name, version),
            (true, None) => format!("{} (version unknown)", info.name),
            (false, _) => format!("{} (not installed)", info.name),
        };
        if info.available {
            cliclack::log::success(line)?;
        } else {
            cliclack::log::remark(line)?;
        }
    }
    print_report(&report)?;

    if report.has_errors() {
        cliclack::outro_cancel(format!("{} problem(s) found", report.errors.len()))?;
        anyhow::bail!("Requirements not met");
    }
    if report.has_warnings() {
        cliclack::outro(format!(
            "Usable, with {} warning(s) ({} level)",
            report.warnings.len(),
            level
        ))?;
    } else {
        cliclack::outro(format!("All requirements satisfied ({} level)", level))?;
    }
    Ok(())
}

/// Print every template under the root
pub fn templates_list(templates_dir: &Path) -> Result<()> {
    let loader = TemplateLoader::new(templates_dir);
    let ids = loader
        .list()
        .with_context(|| format!("Failed to list templates in {}", templates_dir.display()))?;

    if ids.is_empty() {
        println!("No templates found in {}", templates_dir.display());
        return Ok(());
    }

    println!("{}", format!("Templates in {}", templates_dir.display()).bold());
    for id in &ids {
        match loader.load(id) {
            Ok(desc) => println!(
                "  {:<24} {} {}",
                id.cyan(),
                desc.version.dimmed(),
                desc.description
            ),
            Err(e) => println!("  {:<24} {} {}", id.cyan(), "invalid".red(), e),
        }
    }
    Ok(())
}

/// Print one template's descriptor
pub fn templates_show(templates_dir: &Path, id: &str) -> Result<()> {
    let desc = TemplateLoader::new(templates_dir)
        .load(id)
        .with_context(|| format!("Failed to load template '{}'", id))?;
    print_descriptor(&desc);
    Ok(())
}

fn print_descriptor(desc: &TemplateDescriptor) {
    println!("{} {}", desc.name.bold(), desc.version.dimmed());
    if !desc.description.is_empty() {
        println!("{}", desc.description);
    }
    println!("  {} {}", "id:".dimmed(), desc.identifier());
    if !desc.min_cli_version.is_empty() {
        println!("  {} {}", "min cli version:".dimmed(), desc.min_cli_version);
    }

    if !desc.variables.is_empty() {
        println!();
        println!("{}", "Variables".bold());
        for (key, decl) in &desc.variables {
            let mut line = format!("  {} ({})", key.cyan(), decl.kind);
            if let Some(default) = &decl.default {
                line.push_str(&format!(" default={}", default));
            }
            if !decl.choices.is_empty() {
                line.push_str(&format!(" choices=[{}]", decl.choices.join(", ")));
            }
            if decl.required {
                line.push_str(&format!(" {}", "required".yellow()));
            }
            println!("{}", line);
            if !decl.description.is_empty() {
                println!("      {}", decl.description.dimmed());
            }
        }
    }

    let reqs = &desc.requirements;
    if !reqs.system.is_empty() || !reqs.environment.is_empty() {
        println!();
        println!("{}", "Requirements".bold());
        for req in &reqs.system {
            let severity = if req.required { "required" } else { "optional" };
            let version = req.version.as_deref().unwrap_or("any version");
            let mut line = format!("  {} {} ({})", req.command.cyan(), version, severity);
            if let Some(when) = &req.when {
                line.push_str(&format!(" when {}", when));
            }
            println!("{}", line);
        }
        for env in &reqs.environment {
            let severity = if env.required { "required" } else { "optional" };
            println!("  ${} ({})", env.variable.cyan(), severity);
        }
    }

    println!();
    println!("{}", "Files".bold());
    for spec in &desc.files {
        let mut line = format!("  {} -> {}", spec.source, spec.destination);
        if let Ok(mode) = spec.mode() {
            if mode != DEFAULT_FILE_MODE {
                line.push_str(&format!(" ({:o})", mode));
            }
        }
        if !spec.conditions.is_empty() {
            line.push_str(&format!(" if {}", spec.conditions.join(" and ")).dimmed().to_string());
        }
        println!("{}", line);
    }

    if !desc.dependencies.is_empty() {
        println!();
        println!("{}", "Dependencies (not generated)".bold());
        for dep in &desc.dependencies {
            match &dep.when {
                Some(when) => println!("  {} when {}", dep.template, when),
                None => println!("  {}", dep.template),
            }
        }
    }

    if !desc.hooks.is_empty() {
        println!();
        println!("{}", "Hooks (not executed)".bold());
        for hook in &desc.hooks.pre_generate {
            println!("  pre:  {} [{}]", hook.command(), hook.error_level);
        }
        for hook in &desc.hooks.post_generate {
            println!("  post: {} [{}]", hook.command(), hook.error_level);
        }
    }

    if let Some(check) = &desc.healthcheck {
        println!();
        println!("{}", "Healthcheck".bold());
        let timeout = check.timeout.as_deref().unwrap_or("none");
        println!("  {} (port {}, timeout {})", check.command, check.port, timeout);
    }
}

/// Load every template and report which fail validation
pub fn templates_validate(templates_dir: &Path) -> Result<()> {
    let loader = TemplateLoader::new(templates_dir);
    let ids = loader
        .list()
        .with_context(|| format!("Failed to list templates in {}", templates_dir.display()))?;

    let mut failures = 0;
    for id in &ids {
        match loader.load(id) {
            Ok(_) => println!("  {} {}", "✓".green(), id),
            Err(e) => {
                failures += 1;
                println!("  {} {}: {}", "✗".red(), id, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} templates failed validation", failures, ids.len());
    }
    println!("{}", format!("All {} templates valid", ids.len()).green());
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_doctor_probes_enabled_requirements_once() {
        let dir = tempdir().unwrap();
        let calls = dir.path().join("calls");
        let tool = dir.path().join("counted-tool");
        std::fs::write(
            &tool,
            format!(
                "#!/bin/sh\necho \"$1\" >> '{}'\necho \"counted-tool 2.0.1\"\n",
                calls.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let bundle = dir.path().join("templates/demo/basic");
        std::fs::create_dir_all(bundle.join("files")).unwrap();
        std::fs::write(bundle.join("files/README.md"), "demo\n").unwrap();
        std::fs::write(
            bundle.join("template.yaml"),
            format!(
                r#"
version: "1.0.0"
name: Demo
language: demo
framework: basic
requirements:
  system:
    - command: "{}"
      version: ">=2.0"
      required: true
    - command: stencil-missing-when-disabled-4242
      required: true
      when: "{{{{ .IncludeDocker }}}}"
variables:
  IncludeDocker:
    type: boolean
    default: false
files:
  - src: README.md
    dest: README.md
"#,
                tool.display()
            ),
        )
        .unwrap();

        doctor(
            &Settings::default(),
            &dir.path().join("templates"),
            DoctorArgs {
                template: Some("demo/basic".to_string()),
                strict: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read_to_string(&calls).unwrap(), "--version\n");
    }
}
