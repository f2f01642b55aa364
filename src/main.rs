use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use totwriter::cli::OutputFormat;
use totwriter::cli::commands::run::RunOptions;
use totwriter::search::SuccessBoundary;

#[derive(Parser)]
#[command(name = "totwriter")]
#[command(
    version,
    about = "Tree-of-thought document writer: stage-by-stage LLM search with backtracking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the plan and print the completed document
    Run {
        #[arg(long, help = "Initial lookahead budget (default: number of stages)")]
        max_depth: Option<usize>,
        #[arg(long, short = 'k', help = "Candidates generated per stage")]
        max_candidates: Option<usize>,
        #[arg(long, help = "Success boundary: plan, max-depth")]
        boundary: Option<SuccessBoundary>,
        #[arg(long, help = "LLM provider (claude-code, openai, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Deadline for the whole search in seconds")]
        timeout: Option<u64>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Show the effective stage plan
    Plan {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text (TOML), json"
        )]
        format: OutputFormat,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mtotwriter encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run {
            max_depth,
            max_candidates,
            boundary,
            provider,
            model,
            timeout,
            format,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(totwriter::cli::commands::run::run(RunOptions {
                max_depth,
                max_candidates,
                boundary,
                provider,
                model,
                timeout_secs: timeout,
                format,
            }))?;
        }
        Commands::Plan { format } => {
            totwriter::cli::commands::plan::run(format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                totwriter::cli::commands::config::show(format)?;
            }
            ConfigAction::Path => {
                totwriter::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                totwriter::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
