//! stencil CLI - Project scaffolding from language/framework templates

use anyhow::Result;
use clap::{Args as ClapArgs, CommandFactory, FromArgMatches, Parser, Subcommand};
use stencil_core::templates::context::keys;
use stencil_core::tui::{DoctorArgs, NewArgs};
use stencil_core::{ProductConfig, Settings, Value, Variables};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// stencil product configuration
#[derive(Clone)]
pub struct StencilConfig;

impl ProductConfig for StencilConfig {
    fn name(&self) -> &'static str {
        "stencil"
    }

    fn display_name(&self) -> &'static str {
        "stencil"
    }

    fn templates_dir_env(&self) -> &'static str {
        "STENCIL_TEMPLATES_DIR"
    }

    fn config_env(&self) -> &'static str {
        "STENCIL_CONFIG"
    }

    fn cli_description(&self) -> &'static str {
        "CLI for scaffolding projects from language/framework templates"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install stencil-cli --force"
    }

    fn next_steps(&self, dir: &Path, language: &str, variables: &Variables) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        // Step 1: cd to directory if not current
        if current.as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        // Step 2: Install dependencies
        match language {
            "python" => steps.push("poetry install".to_string()),
            "go" => steps.push("go mod tidy".to_string()),
            "node" | "typescript" | "javascript" => steps.push("npm install".to_string()),
            "rust" => steps.push("cargo build".to_string()),
            _ => {}
        }

        // Step 3: Containers, when generated
        if variables.get(keys::INCLUDE_DOCKER).and_then(Value::as_bool) == Some(true) {
            steps.push("docker compose up --build".to_string());
        }

        steps.push("Open README.md to get started".to_string());

        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(version)]
pub struct Args {
    /// Template root to use instead of the configured one
    #[arg(long = "template-dir", global = true)]
    pub template_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project from a template
    New(CliNewArgs),
    /// Check that the tools a template needs are installed
    Doctor(CliDoctorArgs),
    /// Inspect the available templates
    #[command(subcommand)]
    Templates(TemplatesCommand),
}

#[derive(ClapArgs, Debug)]
pub struct CliNewArgs {
    /// Project name (lowercase letters, digits and hyphens)
    pub name: Option<String>,

    /// Template language (e.g. python)
    #[arg(short, long = "lang")]
    pub language: Option<String>,

    /// Template framework (e.g. fastapi)
    #[arg(short, long)]
    pub framework: Option<String>,

    /// Include Docker files
    #[arg(long, overrides_with = "no_docker")]
    pub docker: bool,

    /// Leave out Docker files
    #[arg(long, overrides_with = "docker")]
    pub no_docker: bool,

    /// Database to configure
    #[arg(long)]
    pub database: Option<String>,

    /// CI provider to configure
    #[arg(long)]
    pub ci: Option<String>,

    /// Python version for Python templates
    #[arg(long = "python-version")]
    pub python_version: Option<String>,

    /// Include a test suite
    #[arg(long, overrides_with = "no_tests")]
    pub tests: bool,

    /// Leave out the test suite
    #[arg(long, overrides_with = "tests")]
    pub no_tests: bool,

    /// Extra template variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, Value)>,

    /// Output directory (defaults to ./<name>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show what would be generated without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Treat version mismatches as errors
    #[arg(long)]
    pub strict: bool,

    /// Skip requirement checks
    #[arg(long)]
    pub no_validate: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

/// `--flag`/`--no-flag` pair; `None` when neither was given
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn parse_var(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", raw));
    }
    Ok((key.to_string(), Value::parse_cli(value)))
}

impl From<CliNewArgs> for NewArgs {
    fn from(args: CliNewArgs) -> Self {
        let mut variables = Variables::new();

        // Well-known variables only when given, so template defaults apply otherwise
        if let Some(docker) = flag_pair(args.docker, args.no_docker) {
            variables.insert(keys::INCLUDE_DOCKER.to_string(), Value::Bool(docker));
        }
        if let Some(tests) = flag_pair(args.tests, args.no_tests) {
            variables.insert(keys::INCLUDE_TESTS.to_string(), Value::Bool(tests));
        }
        if let Some(database) = args.database {
            variables.insert(keys::DATABASE.to_string(), Value::String(database));
        }
        if let Some(ci) = args.ci {
            variables.insert(keys::CI_PROVIDER.to_string(), Value::String(ci));
        }
        if let Some(version) = args.python_version {
            variables.insert(keys::PYTHON_VERSION.to_string(), Value::String(version));
        }
        variables.extend(args.vars);

        NewArgs {
            name: args.name,
            language: args.language,
            framework: args.framework,
            output: args.output,
            variables,
            dry_run: args.dry_run,
            strict: args.strict,
            no_validate: args.no_validate,
            yes: args.yes,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct CliDoctorArgs {
    /// Template to check, as <language>/<framework>
    #[arg(short, long)]
    pub template: Option<String>,

    /// Treat version mismatches as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum TemplatesCommand {
    /// List available templates
    List,
    /// Show a template's variables, requirements and files
    Show {
        /// Template id, as <language>/<framework>
        id: String,
    },
    /// Load every template and report invalid ones
    Validate,
}

/// Command definition, described by the product config
fn cli<C: ProductConfig>(config: &C) -> clap::Command {
    Args::command().about(config.cli_description())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("stencil=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Logging already initialized is not an error
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let config = StencilConfig;
    let args = Args::from_arg_matches(&cli(&config).get_matches()).unwrap_or_else(|e| e.exit());
    init_logging(args.verbose);

    let settings = Settings::load(&config)?;
    let templates_dir = settings.resolve_templates_dir(&config, args.template_dir.as_deref());
    tracing::debug!(templates_dir = %templates_dir.display(), "resolved template root");

    let result = match args.command {
        Some(Command::New(new_args)) => {
            stencil_core::tui::run_new(
                &config,
                &settings,
                &templates_dir,
                new_args.into(),
                CLI_VERSION,
            )
            .await
        }
        Some(Command::Doctor(doctor_args)) => {
            let doctor_args = DoctorArgs {
                template: doctor_args.template,
                strict: doctor_args.strict,
            };
            stencil_core::tui::doctor(&settings, &templates_dir, doctor_args).await
        }
        Some(Command::Templates(TemplatesCommand::List)) => {
            stencil_core::tui::templates_list(&templates_dir)
        }
        Some(Command::Templates(TemplatesCommand::Show { id })) => {
            stencil_core::tui::templates_show(&templates_dir, &id)
        }
        Some(Command::Templates(TemplatesCommand::Validate)) => {
            stencil_core::tui::templates_validate(&templates_dir)
        }
        None => {
            // No subcommand provided, default to new (interactive mode)
            stencil_core::tui::run_new(
                &config,
                &settings,
                &templates_dir,
                NewArgs::default(),
                CLI_VERSION,
            )
            .await
        }
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}
