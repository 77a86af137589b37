use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use notice_board::config::Configuration;
use notice_board::events::Command;
use notice_board::render::{FixedViewport, TracingSink};
use notice_board::tasks::documents::{DirectorySource, list_items_blocking};
use notice_board::tasks::presenter::{self, Presenter};

#[derive(Debug, Parser)]
#[command(name = "notice-board", version, about = "kiosk notice board")]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG", default_value = "config.yaml")]
    config: PathBuf,
    /// Override the rotation interval (e.g. "30s")
    #[arg(long = "cycle-interval", value_name = "DURATION", value_parser = humantime::parse_duration)]
    cycle_interval: Option<Duration>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn load_config(path: &Path) -> Configuration {
    match Configuration::from_yaml_file(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("{err:#}; using default configuration");
            Configuration::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        cycle_interval,
        verbose,
    } = Args::parse();

    // RUST_LOG wins; otherwise -v raises the default level
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let mut cfg = load_config(&config);
    if let Some(interval) = cycle_interval {
        cfg.cycle_interval = interval;
    }
    let cfg = cfg.sanitized();
    tracing::info!(
        "Loaded configuration from {}:\n{:#?}",
        config.display(),
        cfg
    );

    let source = Arc::new(DirectorySource::new(
        &cfg.library_path,
        cfg.carousel.thumbnail_height,
    ));
    let items = list_items_blocking(Arc::clone(&source))
        .await
        .with_context(|| format!("cannot list library {}", cfg.library_path.display()))?;
    let sink = TracingSink::new(cfg.idle_overlay_text.clone(), cfg.background_rgb());
    let viewport = FixedViewport(cfg.viewport_size());
    let engine = Presenter::new(&cfg, source, items, sink, viewport, Instant::now())
        .with_context(|| format!("cannot start with library {}", cfg.library_path.display()))?;

    let (command_tx, command_rx) = mpsc::channel::<Command>(16);
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    #[cfg(unix)]
    {
        let cancel = cancel.clone();
        let control = command_tx.clone();
        tokio::spawn(async move {
            match signal(SignalKind::user_defined1()) {
                Ok(mut sigusr1) => loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        received = sigusr1.recv() => {
                            if received.is_none() {
                                break;
                            }
                            tracing::info!("SIGUSR1 received; toggling rotation");
                            if let Err(err) = control.send(Command::TogglePause).await {
                                tracing::warn!("failed to forward pause toggle: {err}");
                                break;
                            }
                        }
                    }
                },
                Err(err) => tracing::warn!("failed to register SIGUSR1 handler: {err}"),
            }
        });
    }

    // Operator console: one command per line, EOF quits. Blocking reads stay
    // off the runtime so they cannot stall shutdown.
    if io::stdin().is_terminal() {
        let control = command_tx.clone();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!("stdin watcher failed: {err}");
                        return;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(cmd) => {
                        if control.blocking_send(cmd).is_err() {
                            return;
                        }
                    }
                    Err(err) => tracing::warn!("{err}"),
                }
            }
            tracing::info!("stdin closed; initiating shutdown");
            let _ = control.blocking_send(Command::Quit);
        });
    } else {
        tracing::debug!("stdin is not a terminal; console commands disabled");
    }
    drop(command_tx);

    let mut tasks = JoinSet::new();
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            let result = presenter::run(engine, command_rx, cancel.clone())
                .await
                .context("presenter task failed");
            // the presenter is the only long-lived task; take the rest down with it
            cancel.cancel();
            result
        }
    });

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!("{err:?}");
                cancel.cancel();
            }
            Err(err) => {
                tracing::error!("task panicked: {err}");
                cancel.cancel();
            }
        }
    }
    Ok(())
}
