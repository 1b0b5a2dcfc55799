mod api;
mod app;
mod commands;
mod config;
mod errors;
mod illustration;
mod logging;
mod output;
mod parse;
mod poem;
mod tui;

use clap::{Parser, Subcommand};

use crate::app::Runtime;
use crate::commands::archive::ArchiveCommand;
use crate::commands::config::ConfigCommand;
use crate::commands::generate::GenerateArgs;
use crate::commands::illustration::IllustrationArgs;
use crate::commands::tui::TuiArgs;
use crate::errors::CliError;
use crate::logging::LogTarget;
use crate::output::{OutputMode, print_error};

#[derive(Debug, Parser)]
#[command(
    name = "poemsmith",
    version,
    about = "Write poems from a prompt, browse the archive, and fetch illustrations."
)]
struct Cli {
    #[arg(long, global = true)]
    profile: Option<String>,
    /// Poem service base URL
    #[arg(long = "api-url", global = true, env = "POEMSMITH_API_URL")]
    api_url: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    quiet: bool,
    /// Request timeout in milliseconds
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout: u64,
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a poem from a prompt
    Generate(GenerateArgs),
    /// Browse previously generated poems
    Archive {
        #[command(subcommand)]
        command: ArchiveCommand,
    },
    /// Check (or wait for) a poem's illustration
    Illustration(IllustrationArgs),
    /// Interactive terminal UI
    Tui(TuiArgs),
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    Health,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    let target = match &cli.command {
        Commands::Tui(_) => logging::tui_log_path()
            .map(LogTarget::File)
            .unwrap_or(LogTarget::Stderr),
        _ => LogTarget::Stderr,
    };
    if let Err(err) = logging::init(&output, target) {
        output.print_stderr(&format!("warning: {err}"));
    }

    let result = run(cli, output.clone()).await;
    if let Err(err) = result {
        tracing::debug!(error = %err, code = err.exit_code(), "command failed");
        print_error(&err, &output);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli, output: OutputMode) -> Result<(), CliError> {
    let config = config::load_config()?;
    let config_path = config::config_path()?;

    let mut runtime = Runtime {
        output,
        config,
        config_path,
        profile_override: cli.profile,
        api_url_override: cli.api_url,
        timeout_ms: cli.timeout,
    };

    match cli.command {
        Commands::Generate(args) => commands::generate::handle(&runtime, args).await,
        Commands::Archive { command } => commands::archive::handle(&runtime, command).await,
        Commands::Illustration(args) => commands::illustration::handle(&runtime, args).await,
        Commands::Tui(args) => commands::tui::handle(&runtime, args).await,
        Commands::Config { command } => commands::config::handle(&mut runtime, command).await,
        Commands::Health => commands::health::handle(&runtime).await,
    }
}
