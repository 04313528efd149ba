// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use switchboard_cfg::export::{export_config_to_json, export_diagnostics_to_json};
use switchboard_cfg::utils::resolve_path;
use switchboard_cfg::{ConfigError, Diagnostics, Pipeline};

/// Version checked against `switchboard { version = ... }`.
const VERSION: &str = match option_env!("SWITCHBOARD_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Switchboard workflow configuration tool.
#[derive(Parser)]
#[command(name = "switchboard", version = VERSION, about = "Validate and prepare Switchboard configuration")]
struct Cli {
    /// Directory holding the configuration files
    #[arg(long, global = true, default_value = ".")]
    dir: String,

    /// JSON file with variable overrides
    #[arg(long, global = true, default_value = "./variables.json")]
    var_file: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the configuration and report every problem found
    ///
    /// Providers are resolved against the ones built into this binary. Downloaded
    /// plugin executables are not launched, so every `required_provider` without a
    /// built-in counterpart reports "Could not load plugin", even after `init`.
    Validate {
        /// Print the resolved configuration (or the diagnostics) as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download the providers required by the configuration
    Init,
    /// Parse the configuration and report what was loaded
    ///
    /// The workflow runtime is not part of this tool: `run` stops once the
    /// configuration is resolved. Like `validate`, it only resolves providers
    /// built into this binary and does not launch downloaded plugin executables.
    Run,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pipeline = match build_pipeline(&cli.dir, &cli.var_file) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(
        dir = %pipeline.working_dir().display(),
        var_file = %pipeline.var_file().display(),
        version = pipeline.version(),
        "pipeline configured"
    );

    match cli.command {
        Commands::Validate { json } => cmd_validate(&pipeline, json),
        Commands::Init => cmd_init(&pipeline),
        Commands::Run => cmd_run(&pipeline),
    }
}

fn build_pipeline(dir: &str, var_file: &str) -> Result<Pipeline, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::FileError {
        message: format!("Could not determine working directory: {}", e),
        path: ".".into(),
        hint: None,
        code: Some(303),
    })?;
    let working_dir: PathBuf = resolve_path(dir, &cwd)?;
    let var_file = resolve_path(var_file, &cwd)?;
    Ok(Pipeline::new(working_dir, var_file, VERSION))
}

fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags {
        eprintln!("{}", diag);
    }
}

fn cmd_validate(pipeline: &Pipeline, json: bool) -> ExitCode {
    let result = pipeline.parse();
    let exported = match (&result, json) {
        (Ok(config), true) => Some(export_config_to_json(config)),
        (Err(diags), true) => Some(export_diagnostics_to_json(diags)),
        (_, false) => None,
    };

    match exported {
        Some(Ok(out)) => println!("{}", out),
        Some(Err(e)) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
        None => {}
    }

    match result {
        Ok(_) => {
            if !json {
                println!("Configuration in {} is valid.", display(pipeline.working_dir()));
            }
            ExitCode::SUCCESS
        }
        Err(diags) => {
            if !json {
                print_diagnostics(&diags);
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_init(pipeline: &Pipeline) -> ExitCode {
    match pipeline.init() {
        Ok(switchboard) => {
            info!(providers = switchboard.required_providers.len(), "switchboard initialized");
            ExitCode::SUCCESS
        }
        Err(diags) => {
            print_diagnostics(&diags);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(pipeline: &Pipeline) -> ExitCode {
    match pipeline.parse() {
        Ok(config) => {
            info!(
                variables = config.variables.len(),
                providers = config.providers.len(),
                schemas = config.schemas.len(),
                "configuration loaded"
            );
            println!("Loaded configuration from {}.", display(pipeline.working_dir()));
            ExitCode::SUCCESS
        }
        Err(diags) => {
            print_diagnostics(&diags);
            ExitCode::FAILURE
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
