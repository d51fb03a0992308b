//! CLI binary for lioengine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lioengine::{EngineConfig, MergeBySource, ProviderRegistry, Session};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// lio: find news and updates about a project across providers.
#[derive(Parser)]
#[command(name = "lio", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "LIO_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Find updates for a project.
    Find {
        /// Project name to search for.
        project: String,

        /// Provider to query, as NAME=TOKEN. Repeat for several providers.
        #[arg(short, long = "provider", value_parser = parse_provider, required = true)]
        providers: Vec<(String, String)>,

        /// Collapse updates that link to the same page.
        #[arg(long)]
        merge: bool,

        /// Print per-provider failures alongside the updates.
        #[arg(long)]
        report: bool,
    },

    /// List supported provider names.
    Providers,
}

fn parse_provider(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, token)) if !name.is_empty() && !token.is_empty() => {
            Ok((name.to_string(), token.to_string()))
        }
        _ => Err(format!("expected NAME=TOKEN, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lioengine=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            let path = EngineConfig::default_config_path();
            if path.exists() {
                EngineConfig::from_file(&path)?
            } else {
                EngineConfig::default()
            }
        }
    };
    let registry = Arc::new(ProviderRegistry::new(config)?);

    match cli.command {
        Command::Providers => {
            for name in registry.supported() {
                let note = if registry.has_setup(name) { "" } else { " (not implemented)" };
                println!("{name}{note}");
            }
            Ok(())
        }
        Command::Find {
            project,
            providers,
            merge,
            report,
        } => run_find(registry, &project, &providers, merge, report).await,
    }
}

async fn run_find(
    registry: Arc<ProviderRegistry>,
    project: &str,
    providers: &[(String, String)],
    merge: bool,
    report: bool,
) -> anyhow::Result<()> {
    let mut session = Session::new(registry);
    if merge {
        session = session.with_post_processor(MergeBySource);
    }
    for (name, token) in providers {
        session
            .add_provider(name, token)
            .with_context(|| format!("adding provider {name}"))?;
    }

    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, cancelling...");
            cancel.cancel();
        }
    });

    let outcome = session.find_updates_report(project).await?;
    let output = if report {
        let failures: Vec<_> = outcome
            .failures
            .iter()
            .map(|f| json!({ "provider": f.provider, "error": f.error.to_string() }))
            .collect();
        json!({
            "updates": outcome.updates,
            "failures": failures,
            "skipped": outcome.skipped,
            "tasks_launched": outcome.tasks_launched,
        })
    } else {
        for failure in &outcome.failures {
            eprintln!("warning: {}: {}", failure.provider, failure.error);
        }
        serde_json::to_value(&outcome.updates)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
