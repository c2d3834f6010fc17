//! Interactive `new` flow using cliclack

use super::commands::print_report;
use crate::config::Settings;
use crate::generator::{
    validate_new_project, validate_project_name, GenerateOptions, GenerationEngine,
    GenerationReport,
};
use crate::product::ProductConfig;
use crate::runtime::{RequirementChecker, ValidationLevel};
use crate::templates::{version, TemplateDescriptor, Variables};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Arguments for the `new` command, already parsed by the binary
#[derive(Debug, Clone, Default)]
pub struct NewArgs {
    /// Project name; prompted for when missing
    pub name: Option<String>,

    pub language: Option<String>,

    pub framework: Option<String>,

    /// Output directory (defaults to `./<name>`)
    pub output: Option<PathBuf>,

    /// Values from flags and `--var`; these win over settings defaults
    pub variables: Variables,

    pub dry_run: bool,

    /// Treat version mismatches as errors
    pub strict: bool,

    /// Skip requirement checks
    pub no_validate: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

impl NewArgs {
    fn interactive(&self) -> bool {
        !self.yes && console::Term::stdout().is_term()
    }
}

/// Run the `new` command
pub async fn run_new<C: ProductConfig>(
    config: &C,
    settings: &Settings,
    templates_dir: &Path,
    args: NewArgs,
    cli_version: &str,
) -> Result<()> {
    cliclack::intro(config.display_name())?;

    let engine =
        GenerationEngine::new(templates_dir).with_metadata_file_name(config.metadata_file_name());

    // Step 1: Project name and output directory
    let name = select_name(&args)?;
    let output_dir = args.output.clone().unwrap_or_else(|| PathBuf::from(&name));
    if !args.dry_run {
        check_target(&name, args.output.as_deref())?;
    }

    // Step 2: Template
    let descriptor = select_template(&engine, &args)?;

    if let Some(warning) = version::check_compatibility(
        cli_version,
        &descriptor.min_cli_version,
        config.upgrade_command(),
    ) {
        cliclack::log::warning(format!(
            "Version warning: {}",
            warning.lines().next().unwrap_or(&warning)
        ))?;
    }

    // Step 3: Variables (settings defaults under command-line values)
    let mut variables = settings.defaults.clone();
    variables.extend(args.variables.clone());
    let merged = GenerationEngine::merge_variables(&descriptor, &variables);
    for problem in GenerationEngine::check_variables(&descriptor, &merged) {
        cliclack::log::warning(problem)?;
    }

    // Step 4: Requirements
    if args.no_validate {
        cliclack::log::info("Skipping requirement checks")?;
    } else {
        let level = if args.strict {
            ValidationLevel::Strict
        } else {
            settings.validation
        };
        check_requirements(&descriptor, level, merged).await?;
    }

    // Step 5: Generate
    let spinner = cliclack::spinner();
    spinner.start(if args.dry_run {
        "Planning project..."
    } else {
        "Creating project..."
    });

    let opts = GenerateOptions {
        project_name: name,
        language: descriptor.language.clone(),
        framework: descriptor.framework.clone(),
        output_dir: Some(output_dir.clone()),
        variables,
        dry_run: args.dry_run,
    };
    let report = match engine.generate(&opts).await {
        Ok(report) => report,
        Err(e) => {
            spinner.error("Generation failed");
            return Err(e).context("Failed to generate project");
        }
    };

    let included = report.included().count();
    spinner.stop(if report.dry_run {
        format!("Dry run: {} files would be generated", included)
    } else {
        format!("Created {} files in {}", included, output_dir.display())
    });

    for line in action_lines(&report) {
        match line {
            ActionLine::Step(text) => cliclack::log::step(text)?,
            ActionLine::Remark(text) => cliclack::log::remark(text)?,
        }
    }

    if report.dry_run {
        cliclack::outro("Dry run complete, nothing was written")?;
        return Ok(());
    }

    // Step 6: Next steps
    print_next_steps(config, &output_dir, &descriptor.language, &report.variables)?;

    Ok(())
}

enum ActionLine {
    Step(String),
    Remark(String),
}

/// Lines to print for a finished run; skipped files are only shown when planning
fn action_lines(report: &GenerationReport) -> Vec<ActionLine> {
    report
        .actions
        .iter()
        .filter_map(|action| {
            if action.is_included() {
                Some(ActionLine::Step(action.to_string()))
            } else if report.dry_run {
                Some(ActionLine::Remark(action.to_string()))
            } else {
                None
            }
        })
        .collect()
}

fn select_name(args: &NewArgs) -> Result<String> {
    if let Some(name) = &args.name {
        validate_project_name(name)?;
        return Ok(name.clone());
    }
    if !args.interactive() {
        anyhow::bail!("A project name is required in non-interactive mode");
    }

    let name: String = cliclack::input("Project name")
        .placeholder("my-project")
        .validate(|input: &String| validate_project_name(input).map_err(|e| e.to_string()))
        .interact()?;
    Ok(name)
}

/// Refuse to generate over an existing filesystem entry
fn check_target(name: &str, output: Option<&Path>) -> Result<()> {
    match output {
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            validate_new_project(name, &cwd)?;
        }
        Some(dir) => {
            if dir.symlink_metadata().is_ok() {
                anyhow::bail!("Output directory already exists: {}", dir.display());
            }
        }
    }
    Ok(())
}

fn select_template(engine: &GenerationEngine, args: &NewArgs) -> Result<TemplateDescriptor> {
    let id = match (&args.language, &args.framework) {
        (Some(language), Some(framework)) => format!("{}/{}", language, framework),
        _ => {
            let spinner = cliclack::spinner();
            spinner.start("Loading templates...");
            let available = match engine.list_templates() {
                Ok(ids) => ids,
                Err(e) => {
                    spinner.error("Failed to load templates");
                    return Err(e.into());
                }
            };
            spinner.stop(format!("{} templates available", available.len()));

            // Keep only templates matching whichever half was given
            let candidates: Vec<String> = available
                .into_iter()
                .filter(|id| {
                    let (lang, fw) = id.split_once('/').unwrap_or((id.as_str(), ""));
                    args.language.as_deref().map_or(true, |l| l == lang)
                        && args.framework.as_deref().map_or(true, |f| f == fw)
                })
                .collect();

            match candidates.len() {
                0 => anyhow::bail!(
                    "No template matches language {:?} and framework {:?} in {}",
                    args.language,
                    args.framework,
                    engine.loader().templates_dir().display()
                ),
                1 => {
                    cliclack::log::info(format!("Using template: {}", candidates[0]))?;
                    candidates[0].clone()
                }
                _ if !args.interactive() => {
                    anyhow::bail!("Both --lang and --framework are required in non-interactive mode")
                }
                _ => {
                    let mut select = cliclack::select("Select a template");
                    for id in &candidates {
                        select = select.item(id.clone(), id, "");
                    }
                    select.interact()?
                }
            }
        }
    };

    let descriptor = engine
        .get_template(&id)
        .with_context(|| format!("Failed to load template '{}'", id))?;
    cliclack::log::success(format!(
        "Template: {} {} - {}",
        descriptor.name, descriptor.version, descriptor.description
    ))?;
    Ok(descriptor)
}

async fn check_requirements(
    descriptor: &TemplateDescriptor,
    level: ValidationLevel,
    scope: Variables,
) -> Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Checking requirements...");

    let report = RequirementChecker::new(level)
        .with_scope(scope)
        .validate_requirements(&descriptor.requirements)
        .await;

    if report.has_errors() {
        spinner.error("Missing requirements");
        print_report(&report)?;
        anyhow::bail!("Please install the missing requirements or re-run with --no-validate.");
    }

    spinner.stop(format!("Requirements checked ({} level)", level));
    print_report(&report)?;
    Ok(())
}

fn print_next_steps<C: ProductConfig>(
    config: &C,
    project_dir: &Path,
    language: &str,
    variables: &Variables,
) -> Result<()> {
    let steps = config.next_steps(project_dir, language, variables);

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{FileAction, FileActionKind};

    fn report(dry_run: bool) -> GenerationReport {
        let included = if dry_run {
            FileActionKind::WouldRender
        } else {
            FileActionKind::Rendered
        };
        GenerationReport {
            template: "demo/basic".to_string(),
            template_version: "1.0.0".to_string(),
            output_dir: PathBuf::from("demo"),
            dry_run,
            actions: vec![
                FileAction {
                    kind: included,
                    source: "README.md.tmpl".to_string(),
                    destination: PathBuf::from("demo/README.md"),
                },
                FileAction {
                    kind: FileActionKind::Skipped,
                    source: "Dockerfile".to_string(),
                    destination: PathBuf::from("demo/Dockerfile"),
                },
            ],
            variables: Variables::new(),
            metadata_file: None,
        }
    }

    #[test]
    fn test_skipped_files_listed_only_in_dry_run() {
        let planned = action_lines(&report(true));
        assert_eq!(planned.len(), 2);
        assert!(matches!(planned[0], ActionLine::Step(_)));
        assert!(matches!(planned[1], ActionLine::Remark(_)));

        let done = action_lines(&report(false));
        assert_eq!(done.len(), 1);
        assert!(matches!(&done[0], ActionLine::Step(line) if line.contains("README.md")));
    }
}
