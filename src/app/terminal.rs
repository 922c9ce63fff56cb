use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Args;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(
    no_color_flag: bool,
    no_color_env: bool,
    dumb_terminal: bool,
) -> bool {
    no_color_flag || no_color_env || dumb_terminal
}

pub(crate) fn is_no_color_requested(args: &Args) -> bool {
    should_disable_color(args.no_color, no_color_env_requested(), is_dumb_terminal())
}

pub(crate) fn should_show_progress(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// Installs the global subscriber: stderr always, plus `log_file` when given.
pub(crate) fn init_tracing(
    default_level: &str,
    force_cli_level: bool,
    no_color: bool,
    log_file: Option<&Path>,
) -> Result<()> {
    let filter = if force_cli_level {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color),
        )
        .with(file_layer)
        .try_init();
    Ok(())
}
