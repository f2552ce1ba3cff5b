mod adapters;
mod api_client;
mod browser;
mod config;
mod errors;
mod executor;
mod runner;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::api_client::AuthToken;
use crate::config::AgentConfig;
use crate::runner::RunOutcome;

/// Local prefill agent: fills a job application form in your own browser and
/// stops before submitting it.
#[derive(Parser)]
#[command(name = "prefill-agent", version, about)]
struct Cli {
    /// Log debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prefill the form for an intent created in the dashboard
    Run {
        /// Intent ID shown when the intent was created
        intent_id: Uuid,
        /// One-time token shown when the intent was created
        token: String,
    },
}

fn print_summary(outcome: &RunOutcome, config: &AgentConfig) {
    let log = &outcome.log;
    println!();
    println!("Prefill run for intent {}", log.intent_id);
    println!(
        "  ATS:          {} (confidence {:.2})",
        log.detected_ats.as_deref().unwrap_or("unknown"),
        log.detection_confidence
    );
    println!(
        "  Fields:       {} filled, {} missing, {} errored",
        log.filled_count(),
        log.missing_fields.len(),
        log.error_count()
    );
    if !log.missing_fields.is_empty() {
        println!("  Missing:      {}", log.missing_fields.join(", "));
    }
    for failed in log.filled_fields.iter().filter(|f| !f.success) {
        println!(
            "  Error:        {}: {}",
            failed.field_name,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!(
        "  Resume:       {}",
        if log.resume_attached { "attached" } else { "not attached" }
    );
    for attachment_error in &log.attachment_errors {
        println!("  Attachment:   {attachment_error}");
    }
    println!(
        "  Screenshots:  {} saved to {}",
        log.screenshot_paths.len(),
        config.screenshot_dir.display()
    );
    match &outcome.ack {
        Ok(ack) => println!(
            "  Logged as:    {} (application now {})",
            ack.log_id,
            ack.application_status.as_deref().unwrap_or("unchanged")
        ),
        Err(e) => println!("  Not logged:   {e}"),
    }
    println!();
    println!("The form was NOT submitted. Review it in the browser and submit it yourself.");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.verbose { "debug" } else { config.rust_log.as_str() };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run { intent_id, token } => {
            match runner::run(&config, intent_id, AuthToken::new(token)).await {
                Ok(outcome) => {
                    print_summary(&outcome, &config);
                    if outcome.ack.is_ok() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    error!("Prefill run failed: {e}");
                    eprintln!("Prefill run failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
