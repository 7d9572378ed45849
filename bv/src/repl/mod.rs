//! Interactive REPL for brandvoice
//!
//! Login prompt, then a command prompt where bare input is a company URL and
//! slash commands trigger the later stages.

mod session;
pub mod view;

pub use session::ReplSession;

use eyre::{Context, Result};
use tracing::info;

use crate::app::App;
use crate::config::{Config, Credentials};
use crate::pipeline::Pipeline;
use crate::session::Authenticator;

/// Run the interactive REPL
///
/// This is the main entry point for `bv repl`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    // Validate API keys early
    config.validate()?;
    let credentials = Credentials::from_config(config)?;

    let pipeline = Pipeline::from_config(config, &credentials).context("Failed to build pipeline")?;
    let auth = Authenticator::new(&config.auth);
    info!(model = %config.llm.model, "Starting REPL");

    let mut repl = ReplSession::new(App::new(pipeline), auth);
    repl.run().await
}
