// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf - Paperflow CLI

mod commands;
mod completions;
mod config;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{init, pipeline, stage, App};
use completions::CompletionsArgs;
use config::{find_project_root, Config};
use error::PfError;
use output::OutputFormat;
use pf_core::{ErrorKind, PipelineId, StageId};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "pf",
    version,
    about = "Paperflow - staged research paper pipelines"
)]
struct Cli {
    /// Project root directory (default: nearest ancestor with .paperflow/)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a pipeline
    Init(init::InitArgs),
    /// Show a pipeline's stages
    Status {
        /// Pipeline id
        id: PipelineId,
    },
    /// List pipelines
    List,
    /// Submit output for the current stage
    Advance(stage::AdvanceArgs),
    /// Dispatch the current stage and print its collaborator input
    Start {
        /// Pipeline id
        id: PipelineId,
    },
    /// Run the configured collaborator for the current stage
    Run(stage::RunArgs),
    /// Mark the current stage failed
    Fail {
        /// Pipeline id
        id: PipelineId,
        /// What went wrong
        message: String,
    },
    /// Start from a later stage, treating earlier ones as done
    Jump(stage::JumpArgs),
    /// Reset a stage and everything after it
    Rollback {
        /// Pipeline id
        id: PipelineId,
        /// Stage to return to
        stage: StageId,
    },
    /// Re-validate every stage's recorded output
    Validate {
        /// Pipeline id
        id: PipelineId,
    },
    /// List the workflow's stages
    Stages,
    /// Remove a pipeline record
    Delete {
        /// Pipeline id
        id: PipelineId,
    },
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Completions need no project
    if let Commands::Completions(args) = &cli.command {
        return match completions::handle::<Cli>(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report(
                PfError::new(format!("cannot write completions: {}", e)).with_kind(ErrorKind::Io),
            ),
        };
    }

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(PfError::from_anyhow(err)),
    }
}

fn report(err: PfError) -> ExitCode {
    eprint!("{}", err);
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}

async fn execute(cli: Cli) -> Result<()> {
    let root = cli.root.map_or_else(find_project_root, Ok)?;
    let config = Config::load(&root)?;
    let _log_guard = logging::setup_logging(config.log_path(&root).as_deref())?;
    let app = App::open(root, config, cli.format)?;

    match cli.command {
        Commands::Init(args) => init::handle(&app, args),
        Commands::Status { id } => pipeline::status(&app, id),
        Commands::List => pipeline::list(&app),
        Commands::Advance(args) => stage::advance(&app, args),
        Commands::Start { id } => stage::start(&app, id),
        Commands::Run(args) => stage::run(&app, args).await,
        Commands::Fail { id, message } => stage::fail(&app, id, message),
        Commands::Jump(args) => stage::jump(&app, args),
        Commands::Rollback { id, stage } => stage::rollback(&app, id, stage),
        Commands::Validate { id } => pipeline::validate(&app, id),
        Commands::Stages => pipeline::stages(&app),
        Commands::Delete { id } => pipeline::delete(&app, id),
        Commands::Completions(_) => Ok(()),
    }
}
