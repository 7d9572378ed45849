//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::view;
use crate::app::{Action, App, Event, RenderModel};
use crate::session::{Authenticator, Session};

/// Interactive REPL session
///
/// Loops between a login prompt and the command prompt. Each login starts a
/// fresh [`Session`]; `/logout` drops it and returns to the login prompt.
pub struct ReplSession {
    app: App,
    auth: Authenticator,
    session: Option<Session>,
}

impl ReplSession {
    pub fn new(app: App, auth: Authenticator) -> Self {
        Self {
            app,
            auth,
            session: None,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let Some(session) = self.session.as_mut() else {
                match Self::login(&self.auth, &mut rl)? {
                    LoginResult::LoggedIn(session) => {
                        println!("{} Logged in as {}", "✓".bright_green(), session.username().bold());
                        println!("Enter a company URL to fetch, {} for commands", "/help".yellow());
                        println!();
                        self.session = Some(session);
                    }
                    LoginResult::Retry => {}
                    LoginResult::Quit => break,
                }
                continue;
            };

            let prompt = format!("{}@bv {} ", session.username(), ">".bright_green());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    match parse_command(input) {
                        ReplCommand::Event(event) => self.dispatch(event).await,
                        ReplCommand::Show => {
                            if let Some(session) = self.session.as_ref() {
                                view::print_model(&self.app.render(session, Vec::new()));
                            }
                        }
                        ReplCommand::Logout => {
                            if let Some(session) = self.session.take() {
                                session.logout();
                            }
                            println!("{}", "Logged out.".dimmed());
                            println!();
                        }
                        ReplCommand::Help => self.print_help(),
                        ReplCommand::Quit => break,
                        ReplCommand::Unknown(cmd) => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                            println!("Type {} for available commands", "/help".yellow());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        if let Some(session) = self.session.take() {
            session.logout();
        }
        println!("Goodbye!");
        Ok(())
    }

    /// Prompt for credentials and try to start a session
    fn login(auth: &Authenticator, rl: &mut DefaultEditor) -> Result<LoginResult> {
        debug!("ReplSession::login: called");
        let username = match rl.readline("Username: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(LoginResult::Quit),
            Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
        };

        let password = if auth.is_open() {
            String::new()
        } else {
            match rl.readline("Password: ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(LoginResult::Quit),
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            }
        };

        match auth.login(&username, password.trim_end_matches(['\r', '\n'])) {
            Ok(session) => Ok(LoginResult::LoggedIn(session)),
            Err(e) => {
                println!("{} {}", "✗".red(), e.to_string().red());
                Ok(LoginResult::Retry)
            }
        }
    }

    /// Send one event to the app and print what changed
    async fn dispatch(&mut self, event: Event) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        debug!(?event, "ReplSession::dispatch: called");

        let shows = event.clone();
        if matches!(shows, Event::Analyze | Event::GenerateExample | Event::SubmitUrl(_)) {
            println!("{}", "Working...".dimmed());
        }
        let model = self.app.handle_event(session, event).await;

        view::print_notices(&model);
        if !model.has_errors() {
            match shows {
                Event::SubmitUrl(_) => view::print_digest(&model),
                Event::Analyze => view::print_analysis(&model),
                Event::GenerateExample => view::print_example(&model),
                Event::Refresh => view::print_model(&model),
            }
        }
        print_next_steps(&model);
    }

    /// Print welcome message
    fn print_welcome(&self) {
        println!();
        println!("{}", "brandvoice".bright_cyan().bold());
        if self.auth.is_open() {
            println!("{}", "No users configured: any username is accepted".dimmed());
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Print help message
    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Fetch a company's profile and posts", "<url>".yellow());
        println!("  {:14} Analyze the fetched posts", "/analyze".yellow());
        println!("  {:14} Generate an example post from the analysis", "/example".yellow());
        println!("  {:14} Show everything fetched and generated so far", "/show".yellow());
        println!("  {:14} End the session and clear its data", "/logout".yellow());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the REPL", "/quit".yellow());
        println!();
    }
}

fn print_next_steps(model: &RenderModel) {
    let mut hints = Vec::new();
    if model.can(Action::Analyze) && model.analysis.is_none() {
        hints.push("/analyze");
    }
    if model.can(Action::GenerateExample) && model.example.is_none() {
        hints.push("/example");
    }
    if !hints.is_empty() {
        println!();
        println!("{} {}", "Next:".dimmed(), hints.join(", ").yellow());
    }
    println!();
}

/// Result of a login attempt
enum LoginResult {
    LoggedIn(Session),
    Retry,
    Quit,
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Event(Event),
    Show,
    Logout,
    Help,
    Quit,
    Unknown(String),
}

/// Parse an input line; anything not starting with `/` is a company URL
fn parse_command(input: &str) -> ReplCommand {
    if !input.starts_with('/') {
        return ReplCommand::Event(Event::SubmitUrl(input.to_string()));
    }

    let cmd = input.split_whitespace().next().unwrap_or("");
    match cmd {
        "/analyze" | "/a" => ReplCommand::Event(Event::Analyze),
        "/example" | "/e" => ReplCommand::Event(Event::GenerateExample),
        "/show" | "/s" => ReplCommand::Show,
        "/logout" => ReplCommand::Logout,
        "/help" | "/h" => ReplCommand::Help,
        "/quit" | "/q" | "/exit" => ReplCommand::Quit,
        _ => ReplCommand::Unknown(cmd.to_string()),
    }
}
