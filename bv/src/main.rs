//! brandvoice - company post-style analysis
//!
//! CLI entry point for the interactive session and one-shot runs.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use brandvoice::app::{App, Event};
use brandvoice::cli::{Cli, Command, PASSWORD_ENV, Through, get_log_path};
use brandvoice::config::{Config, Credentials};
use brandvoice::pipeline::Pipeline;
use brandvoice::repl::{self, view};
use brandvoice::session::Authenticator;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "brandvoice loaded config: model={}, provider={}",
        config.llm.model, config.provider.base_url
    );

    // Dispatch command
    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Repl) | None => {
            debug!("main: matched Repl command");
            repl::run_interactive(&config).await
        }
        Some(Command::Run {
            url,
            through,
            username,
        }) => {
            debug!(%url, ?through, %username, "main: matched Run command");
            cmd_run(&config, &url, through, &username).await
        }
        Some(Command::ShowConfig) => {
            debug!("main: matched ShowConfig command");
            cmd_show_config(&config)
        }
    }
}

/// Run the pipeline once and print the results
async fn cmd_run(config: &Config, url: &str, through: Through, username: &str) -> Result<()> {
    debug!(%url, ?through, %username, "cmd_run: called");
    config.validate()?;
    let credentials = Credentials::from_config(config)?;

    let pipeline = Pipeline::from_config(config, &credentials).context("Failed to build pipeline")?;
    let app = App::new(pipeline);
    let password = std::env::var(PASSWORD_ENV).unwrap_or_default();
    let mut session = Authenticator::new(&config.auth)
        .login(username, &password)
        .context(format!("Login failed for {} (password is read from {})", username, PASSWORD_ENV))?;

    let events = std::iter::once(Event::SubmitUrl(url.to_string())).chain(through.follow_up_events());
    let mut model = app.render(&session, Vec::new());
    let mut notices = Vec::new();
    for event in events {
        let before = model.state;
        model = app.handle_event(&mut session, event).await;
        notices.extend(model.notices.iter().cloned());
        if model.has_errors() || model.state == before {
            debug!(state = %model.state, "cmd_run: stopping, stage made no progress");
            break;
        }
    }
    model.notices = notices;

    view::print_model(&model);
    let reached = through.reached(model.state);
    session.logout();

    if !reached {
        return Err(eyre::eyre!(
            "Pipeline stopped at '{}' before reaching {:?}",
            model.state,
            through
        ));
    }
    Ok(())
}

/// Print the effective configuration with passwords redacted
fn cmd_show_config(config: &Config) -> Result<()> {
    debug!("cmd_show_config: called");
    let mut shown = config.clone();
    for password in shown.auth.users.values_mut() {
        *password = "REDACTED".to_string();
    }

    let yaml = serde_yaml::to_string(&shown).context("Failed to serialize config")?;
    print!("{}", yaml);

    for env in [&config.provider.api_key_env, &config.llm.api_key_env] {
        let status = if std::env::var(env).is_ok() { "set" } else { "not set" };
        println!("# {}: {}", env, status);
    }
    Ok(())
}
