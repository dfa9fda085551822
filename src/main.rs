//! Conductor - Declarative Teams of AI Agents
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Parser;
use conductor::cli::{default_target, print_report, spawn_interrupt_handler, Repl, Session, Target};
use conductor::core::logging::init_logging;
use conductor::{Config, Orchestrator};

/// Conductor - run declaratively defined teams of AI agents
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with agent and team definitions
    #[arg(long, short = 'f')]
    definitions: Option<PathBuf>,

    /// Team to run queries against
    #[arg(long, short = 't', conflicts_with = "agent")]
    team: Option<String>,

    /// Single agent to run queries against
    #[arg(long, short = 'a')]
    agent: Option<String>,

    /// Default model for agents without one
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Model used by selector teams
    #[arg(long)]
    selector_model: Option<String>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Print the full run report as JSON in single prompt mode
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref definitions) = args.definitions {
        config.engine.definitions = Some(definitions.clone());
    }

    if let Some(ref model) = args.model {
        config.models.default = model.clone();
    }

    if let Some(ref selector_model) = args.selector_model {
        config.models.selector = selector_model.clone();
    }

    if args.debug {
        config.logging.level = "debug".to_string();
    }

    if args.json_logs {
        config.logging.json = true;
    }

    init_logging(&config.logging)?;

    let orchestrator = Orchestrator::with_config(&config)?;

    let target = match (args.team, args.agent) {
        (Some(team), _) => Target::Team(team),
        (None, Some(agent)) => Target::Agent(agent),
        (None, None) => default_target(orchestrator.resolver().store().as_ref())
            .ok_or_else(|| anyhow!("The definitions file has no teams or agents"))?,
    };

    let mut session = Session::new(orchestrator, config, target);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        session.orchestrator().initialize().await?;
        let _handler = spawn_interrupt_handler(session.interrupt());

        let report = match session.ask(&prompt).await {
            Ok(report) => report,
            Err(err) if err.is_construction() => bail!("invalid definitions: {}", err),
            Err(err) => return Err(err.into()),
        };
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        if let Some(err) = report.error {
            bail!(err);
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::new(session);
    repl.run().await?;

    Ok(())
}
