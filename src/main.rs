//! ghtriage - GitHub issue and pull request triage
//!
//! Main entry point. Invoked by a workflow with the event name and the path
//! of the event payload.

use anyhow::Context;
use clap::Parser;
use ghtriage::batch::FlushReport;
use ghtriage::config::RulesConfiguration;
use ghtriage::engine::RuleEngine;
use ghtriage::github::{log_rate_limit, GitHubGateway};
use ghtriage::labeler::LabelServiceClient;
use ghtriage::payload::{EventKind, GitHubEvent};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

/// Exit status when at least one queued write failed
const EXIT_PARTIAL_FAILURE: i32 = 2;

/// Apply issue and pull request lifecycle rules to a GitHub event
#[derive(Parser, Debug)]
#[command(name = "ghtriage")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Rules configuration file (default: .github/event-processor.config,
    /// searched upwards from the working directory)
    #[arg(long, env = "GHTRIAGE_RULES_CONFIG")]
    rules_config: Option<PathBuf>,

    /// Evaluate rules and log the queued writes without applying them
    #[arg(long)]
    dry_run: bool,

    /// Event name (issues, issue_comment, pull_request_target,
    /// pull_request_review, schedule)
    event_name: String,

    /// Path to the event payload JSON
    payload: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(e) = ghtriage::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) if report.all_succeeded() => {}
        Ok(report) => {
            error!(
                attempted = report.attempted,
                failed = report.failed,
                "Some updates could not be applied"
            );
            process::exit(EXIT_PARTIAL_FAILURE);
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<FlushReport> {
    let gateway = GitHubGateway::from_env()?;
    let rules = RulesConfiguration::load(cli.rules_config.as_deref())
        .context("Failed to load rules configuration")?;

    let kind = EventKind::from_name(&cli.event_name);
    let event = GitHubEvent::from_file(&kind, &cli.payload)
        .with_context(|| format!("Failed to load {} event", kind))?;
    let Some(event) = event else {
        warn!(event = %kind, "Event is not handled; nothing to do");
        return Ok(FlushReport::default());
    };

    let labeler = LabelServiceClient::from_env();
    let mut engine = RuleEngine::new(&gateway, &rules);
    if let Some(labeler) = &labeler {
        engine = engine.with_labeler(labeler);
    }

    log_rate_limit(&gateway, "start").await;

    let report = if cli.dry_run {
        let batch = engine.evaluate(&event).await?;
        info!(
            update = ?batch.consolidated_update(),
            independent_updates = batch.independent_updates().len(),
            comments = batch.comments().len(),
            dismissals = batch.dismissals().len(),
            locks = batch.locks().len(),
            "Dry run; nothing applied"
        );
        FlushReport::default()
    } else {
        engine.run(&event).await?
    };

    log_rate_limit(&gateway, "end").await;
    Ok(report)
}
