mod commands;
mod config;
mod consistency;
mod engine;
mod evaluator;
mod executor;
mod plugins;
mod report;
mod results;
mod validator;


use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use config::{ValidatorSettings, DEFAULT_CHALLENGE_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_STEP_TIMEOUT_SECS};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "challenge-validator")]
#[command(about = "Run a challenge's validation steps and score the submission", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ChallengeArgs {
    /// Challenge definition file
    #[arg(short, long, env = "VALIDATOR_CHALLENGE", default_value = DEFAULT_CHALLENGE_PATH)]
    challenge: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation pipeline and write the verdict
    Validate {
        #[command(flatten)]
        challenge: ChallengeArgs,

        /// Workspace root the step working directories are relative to
        #[arg(short, long, env = "VALIDATOR_WORKSPACE", default_value = ".")]
        workspace: PathBuf,

        /// Verdict output file
        #[arg(short, long, env = "VALIDATOR_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Default per-step timeout in seconds (0 disables)
        #[arg(long, env = "VALIDATOR_STEP_TIMEOUT_SECS", default_value_t = DEFAULT_STEP_TIMEOUT_SECS)]
        step_timeout: u64,

        /// Do not echo step output
        #[arg(short, long, default_value = "false")]
        quiet: bool,
    },

    /// Exercise the challenge's validator hooks and check consistency
    Test {
        #[command(flatten)]
        challenge: ChallengeArgs,

        /// Exit with an error when any consistency check fails
        #[arg(long, default_value = "false")]
        deny_findings: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    info!("Challenge validator starting");

    let result = match cli.command {
        Commands::Validate {
            challenge,
            workspace,
            output,
            step_timeout,
            quiet,
        } => {
            let settings = ValidatorSettings {
                challenge_path: challenge.challenge,
                workspace_root: workspace,
                output_path: output,
                step_timeout: config::timeout_from_secs(step_timeout),
                echo_output: !quiet,
            };
            commands::validate(&settings).await.map(|verdict| {
                info!(
                    score = verdict.total_points,
                    passed = verdict.passed,
                    "Validation finished"
                );
            })
        }
        Commands::Test {
            challenge,
            deny_findings,
        } => {
            let settings = ValidatorSettings {
                challenge_path: challenge.challenge,
                ..ValidatorSettings::default()
            };
            commands::test(&settings, deny_findings).await
        }
    };

    if let Err(e) = &result {
        error!(error = %format!("{:#}", e), "Challenge validator failed");
    }

    result
}
