//! Command-line interface definition for s3backup.
//!
//! This module defines the CLI commands, their arguments, and the handlers
//! for running plans, listing them, and locating the configuration file.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use tokio::runtime::Builder;

use crate::config::{self, Config};
use crate::notify::SesNotifier;
use crate::orchestrator::Orchestrator;
use crate::plan::Plan;
use crate::store::S3Store;
use crate::sysexits;

/// Command-line interface definition for s3backup.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    pub commands: Option<Commands>,
}

/// Supported s3backup commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured backup plans.
    Run {
        /// Run only the named plan(s).
        #[arg(short, long, value_delimiter = ',')]
        name: Option<Vec<String>>,
    },
    /// List the configured backup plans.
    List,
    /// Display the absolute path of the configuration file.
    Config,
}

/// Runs backup plans, optionally restricted to the named subset.
///
/// A configuration that fails to load is fatal; once plans are running,
/// individual failures are reported per plan and never abort the batch or
/// change the exit status.
pub fn run(config_path: Option<PathBuf>, names: Option<Vec<String>>) -> Result<()> {
    let config = load_config(config_path)?;
    let plans = select_plans(&config, names);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the AWS client runtime")?;
    let store = S3Store::new(runtime.handle().clone(), &config.aws);
    let notifier = config
        .email
        .as_ref()
        .map(|_| SesNotifier::new(runtime.handle().clone(), &config.aws));

    let mut orchestrator = Orchestrator::new(&store);
    if let (Some(notifier), Some(email)) = (&notifier, &config.email) {
        orchestrator = orchestrator.with_notifier(notifier, email);
    }

    let summary = orchestrator.run_plans(&plans);
    info!("{} of {} plans succeeded", summary.succeeded, summary.total());
    Ok(())
}

/// Lists the configured plans.
pub fn list(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    print!("{}", display_plans(&config.plans));
    Ok(())
}

/// Prints the absolute path to the configuration file.
pub fn config(config_path: Option<PathBuf>) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    println!("config file: {}", path.display());
    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = resolve_config_path(config_path)?;
    match Config::load(&path) {
        Ok(config) => {
            info!("loaded configuration from {}", path.display());
            Ok(config)
        }
        Err(e) => {
            error!("failed to load configuration: {e}");
            process::exit(sysexits::EX_CONFIG);
        }
    }
}

fn resolve_config_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => config::default_config_file()
            .context("could not determine the user configuration directory"),
    }
}

fn select_plans(config: &Config, names: Option<Vec<String>>) -> Vec<Plan> {
    let Some(names) = names else {
        return config.plans.clone();
    };
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match config.plans.iter().find(|p| p.name() == name) {
            Some(plan) => selected.push(plan.clone()),
            None => {
                eprintln!("Plan \"{name}\" is not configured.");
                process::exit(sysexits::EX_DATAERR);
            }
        }
    }
    selected
}

fn display_plans(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return String::from("No plans configured.\n");
    }
    let mut s = String::new();
    for plan in plans {
        s.push_str(&format!(
            "{}\n    source: \"{}\"\n    output: \"{}\"\n",
            plan.name(),
            plan.source(),
            plan.output().display()
        ));
        if let Some(command) = plan.command() {
            s.push_str(&format!("    command: \"{command}\"\n"));
        }
    }
    s
}
