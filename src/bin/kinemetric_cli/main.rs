// ABOUTME: Kinemetric CLI - replays sensor recordings and inspects profiles and calibrations
// ABOUTME: Prints session metrics as JSON, streams rep events, and manages the calibration store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Replay recordings in parallel and print metrics as JSON
//! kinemetric-cli replay --exercise pendulum-swing session1.jsonl session2.jsonl
//!
//! # Stream rep events while replaying, using a stored calibration
//! kinemetric-cli replay --exercise forward-reach --user u1 --device d1 --follow reach.jsonl
//!
//! # Show the detection profile table
//! kinemetric-cli profiles
//!
//! # Inspect or drop a stored calibration
//! kinemetric-cli calibration show --user u1 --device d1
//! kinemetric-cli calibration invalidate --user u1 --device d1
//! ```

mod commands;
mod helpers;

use clap::{Parser, Subcommand, ValueEnum};
use kinemetric::config::AnalysisConfig;
use kinemetric::errors::{AppError, AppResult};
use kinemetric::logging::LoggingConfig;
use kinemetric::models::{ExerciseId, Side};
use std::path::PathBuf;

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "kinemetric-cli",
    about = "Kinemetric motion-analysis CLI",
    long_about = "Replay rehabilitation sensor recordings through the motion-analysis core and manage calibrations."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Calibration store file (defaults to the platform data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Replay JSON-lines recordings and print session metrics
    Replay {
        /// Exercise performed in the recordings
        #[arg(long)]
        exercise: ExerciseId,

        /// Body side for camera joint-angle exercises
        #[arg(long, value_enum)]
        side: Option<SideArg>,

        /// User whose stored calibration is used
        #[arg(long, requires = "device")]
        user: Option<String>,

        /// Device whose stored calibration is used
        #[arg(long, requires = "user")]
        device: Option<String>,

        /// Stream rep events while replaying
        #[arg(long)]
        follow: bool,

        /// Recording files
        #[arg(required = true)]
        recordings: Vec<PathBuf>,
    },

    /// Print the detection profile table
    Profiles,

    /// Calibration store commands
    Calibration {
        #[command(subcommand)]
        action: CalibrationCommand,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum CalibrationCommand {
    /// Show the stored calibration and whether it is usable
    Show {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Device identifier
        #[arg(long)]
        device: String,
    },

    /// Remove a stored calibration
    Invalidate {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Device identifier
        #[arg(long)]
        device: String,
    },

    /// Remove every calibration past the age limit
    Prune,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Self::Left,
            SideArg::Right => Self::Right,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env();
    let logging = if cli.verbose {
        logging.with_level("debug")
    } else {
        logging
    };
    logging
        .init()
        .map_err(|e| AppError::internal(format!("failed to initialize logging: {e}")))?;

    let config = AnalysisConfig::global().clone();
    let store_path = cli.store.unwrap_or_else(helpers::default_store_path);

    match cli.command {
        Command::Replay {
            exercise,
            side,
            user,
            device,
            follow,
            recordings,
        } => {
            let request = commands::replay::ReplayRequest {
                exercise,
                side: side.map(Side::from),
                user,
                device,
                follow,
                recordings,
            };
            commands::replay::run(request, &store_path, config).await?;
        }
        Command::Profiles => commands::profiles::print_table(),
        Command::Calibration { action } => match action {
            CalibrationCommand::Show { user, device } => {
                commands::calibration::show(&store_path, &config, user, device)?;
            }
            CalibrationCommand::Invalidate { user, device } => {
                commands::calibration::invalidate(&store_path, &config, user, device)?;
            }
            CalibrationCommand::Prune => {
                commands::calibration::prune(&store_path, &config)?;
            }
        },
    }

    Ok(())
}
