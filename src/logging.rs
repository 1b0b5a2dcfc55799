use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::errors::CliError;
use crate::output::OutputMode;

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// The TUI owns the terminal, so its logs go to a file.
    File(PathBuf),
}

pub fn tui_log_path() -> Option<PathBuf> {
    let base = dirs::state_dir().or_else(dirs::data_local_dir)?;
    Some(base.join("poemsmith").join("tui.log"))
}

pub fn default_filter(output: &OutputMode) -> &'static str {
    if output.debug {
        "poemsmith=debug"
    } else if output.verbose {
        "poemsmith=info"
    } else {
        "poemsmith=warn"
    }
}

pub fn init(output: &OutputMode, target: LogTarget) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(output)));

    let result = match target {
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .with(filter)
                .try_init()
        }
    };

    result.map_err(|e| CliError::Generic(format!("Failed to initialise logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(verbose: bool, debug: bool) -> OutputMode {
        OutputMode {
            json: false,
            quiet: false,
            verbose,
            debug,
        }
    }

    #[test]
    fn debug_outranks_verbose() {
        assert_eq!(default_filter(&mode(false, false)), "poemsmith=warn");
        assert_eq!(default_filter(&mode(true, false)), "poemsmith=info");
        assert_eq!(default_filter(&mode(true, true)), "poemsmith=debug");
    }
}
