//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::app::Event;
use crate::pipeline::PipelineState;

/// Environment variable holding the password for non-interactive runs
pub const PASSWORD_ENV: &str = "BRANDVOICE_PASSWORD";

/// brandvoice - company post-style analysis
#[derive(Debug, Parser)]
#[command(
    name = "bv",
    about = "Fetch a company's profile and posts, analyze their style, and draft an example post",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/brandvoice/logs/brandvoice.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive session (default)
    Repl,

    /// Run the pipeline once for a company and print the results
    Run {
        /// Company page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Last stage to run
        #[arg(short, long, value_enum, default_value_t = Through::Example)]
        through: Through,

        /// Username to log in as (password is read from BRANDVOICE_PASSWORD)
        #[arg(short, long, default_value = "operator")]
        username: String,
    },

    /// Print the effective configuration with secrets redacted
    ShowConfig,
}

/// Last stage for `bv run`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Through {
    Fetch,
    Analyze,
    Example,
}

impl Through {
    /// Events to send after the initial URL submission
    pub fn follow_up_events(&self) -> Vec<Event> {
        debug!(?self, "Through::follow_up_events: called");
        match self {
            Through::Fetch => vec![],
            Through::Analyze => vec![Event::Analyze],
            Through::Example => vec![Event::Analyze, Event::GenerateExample],
        }
    }

    /// Pipeline state a successful run ends in
    pub fn target_state(&self) -> PipelineState {
        match self {
            Through::Fetch => PipelineState::PostsFetched,
            Through::Analyze => PipelineState::Analyzed,
            Through::Example => PipelineState::ExampleGenerated,
        }
    }

    /// True when `state` covers every stage this run asked for
    pub fn reached(&self, state: PipelineState) -> bool {
        state >= self.target_state()
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brandvoice")
        .join("logs")
        .join("brandvoice.log");
    debug!(?path, "get_log_path: returning path");
    path
}
