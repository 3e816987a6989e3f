use anyhow::Context;
use arf_system::{server, ArfConfig, ArfSystem};
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("arf")
        .version(arf_system::VERSION)
        .about("Autonomous Research Framework daemon")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .default_value("./config.yaml")
                .help("Path to config.yaml"),
        )
        .arg_required_else_help(false)
        .subcommand(Command::new("run").about("Run the daemon (default)"))
        .subcommand(Command::new("cycle").about("Run a single cycle and exit"))
        .subcommand(
            Command::new("status")
                .about("Print the current checkpoint")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("config-check").about("Validate the configuration and exit"));

    let matches = cli.get_matches();
    let config_path = matches
        .get_one::<String>("config")
        .expect("config has a default")
        .clone();

    match matches.subcommand() {
        Some(("cycle", _)) => {
            let system = bootstrap(&config_path)?;
            let summary = system.run_once().await?;
            println!(
                "cycle complete: {} exports, {} validations, {} comments, {} references{}",
                summary.exports_processed,
                summary.validations_run,
                summary.comments_answered,
                summary.references_ingested,
                if summary.synthesis_ran {
                    ", synthesis ran"
                } else {
                    ""
                }
            );
            Ok(())
        }
        Some(("status", args)) => {
            let config = ArfConfig::load(&config_path)
                .with_context(|| format!("loading {config_path}"))?;
            let store = arf_state::CheckpointStore::new(config.paths.checkpoint_file());
            let state = store.load_or_init();

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("Framework version: {}", state.current_framework_version);
                println!("Last checkpoint:   {}", state.last_checkpoint);
                println!("Last synthesis:    {}", state.last_synthesis);
                println!("Processed exports: {}", state.processed_exports.len());
                println!("Pending validations: {}", state.pending_validations.len());
                println!("Pending questions:   {}", state.pending_questions.len());
            }
            Ok(())
        }
        Some(("config-check", _)) => {
            let config = ArfConfig::load(&config_path)
                .with_context(|| format!("loading {config_path}"))?;
            println!(
                "config ok: {} models, philosophy weights sum to {:.3}",
                config.models.len(),
                config.philosophy.sum()
            );
            Ok(())
        }
        // `arf` and `arf run` both run the daemon
        _ => run_daemon(&config_path).await,
    }
}

fn bootstrap(config_path: &str) -> anyhow::Result<ArfSystem> {
    let config =
        ArfConfig::load(config_path).with_context(|| format!("loading {config_path}"))?;
    Ok(ArfSystem::bootstrap(config)?)
}

async fn run_daemon(config_path: &str) -> anyhow::Result<()> {
    let system = Arc::new(bootstrap(config_path)?);

    println!("Unified Autonomous Research Framework (ARF)");
    println!("  place chat exports in {}", system.config().paths.input.display());
    println!("  add comments with %% COMMENT: in the LaTeX document");
    if system.config().dashboard.enabled {
        println!(
            "  dashboard at http://{}",
            system.config().dashboard.bind_addr
        );
    }
    println!("  Ctrl+C for graceful shutdown");

    if system.config().dashboard.enabled {
        let app_state = server::AppState {
            state: system.state_handle(),
            documents: system.documents().clone(),
            started_at: system.started_at(),
        };
        let bind_addr = system.config().dashboard.bind_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(app_state, &bind_addr).await {
                tracing::error!("dashboard server failed: {}", e);
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    system.run(shutdown_rx).await?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::warn!("cannot install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
