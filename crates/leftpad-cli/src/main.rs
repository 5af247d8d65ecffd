//! leftpad: pads every line of stdin to a fixed width.
//!
//! Opens one padding session, pumps stdin into it and writes the padded
//! lines to stdout. Only complete lines are emitted, except an overlong
//! trailing line that was already streaming when input ended.

mod config;
mod pump;

use clap::Parser;
use leftpad_core::Device;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Exit status after Ctrl-C or SIGTERM.
const EXIT_INTERRUPTED: i32 = 130;

/// leftpad: left-pad lines to a fixed width
#[derive(Parser, Debug)]
#[command(name = "leftpad", version, about = "Left-pad every line of stdin to a fixed width")]
struct Cli {
    /// Target line width, excluding the newline (0-1023)
    #[arg(short, long)]
    width: Option<usize>,

    /// Fill character used for padding
    #[arg(short, long)]
    fill: Option<String>,

    /// Internal ring buffer size in bytes
    #[arg(short, long)]
    buffer_size: Option<usize>,

    /// Config file path
    #[arg(long, default_value = "~/.leftpad/config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only padded output.
    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let params = match config::resolve(
        &PathBuf::from(&cli.config),
        cli.width,
        cli.fill.as_deref(),
        cli.buffer_size,
    ) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to load config");
            std::process::exit(1);
        }
    };

    let device = match Device::new("leftpad", params) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let session = match device.open() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "failed to open session");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = pump::run(session.clone(), tokio::io::stdin(), tokio::io::stdout()) => {
            match result {
                Ok(summary) => info!(
                    bytes_in = summary.bytes_in,
                    bytes_out = summary.bytes_out,
                    discarded = summary.discarded,
                    unterminated = summary.unterminated,
                    "input padded"
                ),
                Err(e) => {
                    error!(error = %format!("{e:#}"), "pump failed");
                    std::process::exit(1);
                }
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }

    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(e) = device.release(session) {
                warn!(error = %e, "failed to release session");
            }
        }
        Err(_) => debug!("session still shared at exit"),
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
