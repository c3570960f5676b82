//! Interactive terminal client for the Aurum gold investment assistant.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the hosted backend
//! aurum-chat
//!
//! # Point at a local backend and keep the session somewhere else
//! aurum-chat --api-url http://localhost:8000/api/v1/ --data-dir /tmp/aurum
//!
//! # Disable colors (useful for piping output)
//! aurum-chat --no-color
//! ```
//!
//! Anything that is not a slash command is sent to the assistant. Type
//! `/help` for the list of commands. Set `RUST_LOG=aurum=debug` to see what
//! the client is doing.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use dialoguer::Password;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use aurum::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use aurum::{
    AurumClient, DashboardSummary, FileStorage, LoginParams, Notice, NoticeKind, Portfolio,
    SessionStore, SignupParams, Storage,
};

/// Main entry point for the aurum-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("aurum-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let storage = FileStorage::open_dir(&config.data_dir)?;
    let mut session = SessionStore::open(storage);
    let client = AurumClient::with_options(config.api_url.clone(), config.timeout)?;
    let mut controller = ChatController::with_greeting(&config.greeting);
    let mut portfolio = Portfolio::new();
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    // Requests are never abandoned. A first Ctrl+C while waiting says so; a
    // second one quits.
    let waiting = Arc::new(AtomicBool::new(false));
    let warned = Arc::new(AtomicBool::new(false));
    {
        let waiting = waiting.clone();
        let warned = warned.clone();
        ctrlc::set_handler(move || {
            if !waiting.load(Ordering::Relaxed) {
                return;
            }
            if warned.swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
            eprintln!("\nStill waiting for the server. Press Ctrl+C again to quit.");
        })?;
    }

    tracing::info!(base_url = %client.base_url(), data_dir = %config.data_dir.display(), "starting");
    println!("Aurum AI (server: {})", client.base_url());
    match session.user() {
        Some(user) => println!("Logged in as {}", user.display_name()),
        None => println!("Not logged in. Use /login or /signup to manage your gold."),
    }
    println!("Type /help for commands, /quit to exit\n");
    for message in controller.state().messages() {
        renderer.print_message(message);
    }

    loop {
        warned.store(false, Ordering::Relaxed);

        let line = match rl.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                renderer.print_info("(Use /quit to exit)");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Readline error: {err}"));
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.trim());

        let Some(cmd) = parse_command(&line) else {
            controller.set_input(line);
            let before = controller.state().messages().len();
            renderer.print_loading();
            waiting.store(true, Ordering::Relaxed);
            controller.send_input(&client).await;
            waiting.store(false, Ordering::Relaxed);
            render_turn(&controller, before, &mut renderer);
            continue;
        };

        match cmd {
            ChatCommand::Quit => {
                println!("Goodbye!");
                break;
            }
            ChatCommand::Help => {
                for line in help_text().lines() {
                    println!("    {}", line);
                }
            }
            ChatCommand::History => {
                for message in controller.state().messages() {
                    renderer.print_message(message);
                }
            }
            ChatCommand::Suggest(index) => {
                let Some(text) = controller.state().suggestions().get(index).cloned() else {
                    renderer.print_error("No such suggestion");
                    continue;
                };
                let before = controller.state().messages().len();
                renderer.print_info(&format!("You: {text}"));
                renderer.print_loading();
                waiting.store(true, Ordering::Relaxed);
                controller.select_suggestion_at(&client, index).await;
                waiting.store(false, Ordering::Relaxed);
                render_turn(&controller, before, &mut renderer);
            }
            ChatCommand::WhoAmI => match session.user() {
                Some(user) => renderer.print_info(&format!("Logged in as {}", user.display_name())),
                None => renderer.print_info("Not logged in."),
            },
            ChatCommand::Login(user_name) => {
                let user_name = match user_name {
                    Some(name) => name,
                    None => match prompt(&mut rl, "Username: ")? {
                        Some(name) => name,
                        None => continue,
                    },
                };
                let Some(password) = prompt_password()? else {
                    continue;
                };
                let params = LoginParams::new(user_name, password);
                waiting.store(true, Ordering::Relaxed);
                let result = session.login(&client, &params).await.map(DashboardSummary::from_profile);
                waiting.store(false, Ordering::Relaxed);
                match result {
                    Ok(summary) => renderer.print_dashboard(&summary),
                    Err(err) => renderer.print_error(&err.to_string()),
                }
            }
            ChatCommand::Signup => {
                let Some(params) = prompt_signup(&mut rl, &mut renderer)? else {
                    continue;
                };
                waiting.store(true, Ordering::Relaxed);
                let result = session.signup(&client, &params).await.map(DashboardSummary::from_profile);
                waiting.store(false, Ordering::Relaxed);
                match result {
                    Ok(summary) => renderer.print_dashboard(&summary),
                    Err(err) => renderer.print_error(&err.to_string()),
                }
            }
            ChatCommand::Logout => match session.logout() {
                Ok(()) => renderer.print_info("Logged out."),
                Err(err) => renderer.print_error(&err.to_string()),
            },
            ChatCommand::Dashboard => {
                if let Some(summary) = dashboard(&session, &mut renderer) {
                    renderer.print_dashboard(&summary);
                    if let Some(notice) = portfolio.notices().current() {
                        renderer.print_notice(notice);
                    }
                }
            }
            ChatCommand::Buy(amount) | ChatCommand::Sell(amount) | ChatCommand::AddMoney(amount)
                if dashboard(&session, &mut renderer).is_none() =>
            {
                tracing::debug!(%amount, "ledger command without a session");
            }
            ChatCommand::Buy(amount) => {
                waiting.store(true, Ordering::Relaxed);
                let notice = portfolio.buy_gold(&client, &mut session, &amount).await;
                waiting.store(false, Ordering::Relaxed);
                render_ledger(&session, &notice, &mut renderer);
            }
            ChatCommand::Sell(amount) => {
                waiting.store(true, Ordering::Relaxed);
                let notice = portfolio.sell_gold(&client, &mut session, &amount).await;
                waiting.store(false, Ordering::Relaxed);
                render_ledger(&session, &notice, &mut renderer);
            }
            ChatCommand::AddMoney(amount) => {
                waiting.store(true, Ordering::Relaxed);
                let notice = portfolio.add_money(&client, &mut session, &amount).await;
                waiting.store(false, Ordering::Relaxed);
                render_ledger(&session, &notice, &mut renderer);
            }
            ChatCommand::Invalid(msg) => {
                renderer.print_error(&msg);
            }
        }
    }

    Ok(())
}

/// Prints what a chat turn added after the first `before` messages.
fn render_turn(controller: &ChatController, before: usize, renderer: &mut dyn Renderer) {
    let state = controller.state();
    for message in state.messages().iter().skip(before) {
        if message.role == aurum::Role::Assistant {
            renderer.print_message(message);
        }
    }
    renderer.print_suggestions(state.suggestions());
    renderer.print_affordances(state.show_buy(), state.show_dashboard());
}

/// The dashboard for the logged-in user, or a login hint when there is none.
fn dashboard<S: Storage>(
    session: &SessionStore<S>,
    renderer: &mut dyn Renderer,
) -> Option<DashboardSummary> {
    match session.user() {
        Some(user) => Some(DashboardSummary::from_profile(user)),
        None => {
            renderer.print_info("Please log in to view your dashboard (/login or /signup).");
            None
        }
    }
}

fn render_ledger<S: Storage>(
    session: &SessionStore<S>,
    notice: &Notice,
    renderer: &mut dyn Renderer,
) {
    renderer.print_notice(notice);
    if notice.kind != NoticeKind::Success {
        return;
    }
    if let Some(user) = session.user() {
        renderer.print_dashboard(&DashboardSummary::from_profile(user));
    }
}

/// Reads one line; `None` when the user backs out with Ctrl+C or Ctrl+D.
fn prompt(rl: &mut DefaultEditor, label: &str) -> Result<Option<String>, ReadlineError> {
    match rl.readline(label) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Reads a password without echoing it; `None` when the user backs out.
fn prompt_password() -> Result<Option<String>, dialoguer::Error> {
    match Password::new().with_prompt("Password").interact() {
        Ok(password) => Ok(Some(password)),
        Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(err),
    }
}

fn prompt_signup(
    rl: &mut DefaultEditor,
    renderer: &mut dyn Renderer,
) -> Result<Option<SignupParams>, Box<dyn std::error::Error>> {
    let Some(email) = prompt(rl, "Email: ")? else {
        return Ok(None);
    };
    let Some(password) = prompt_password()? else {
        return Ok(None);
    };
    let Some(user_name) = prompt(rl, "Username: ")? else {
        return Ok(None);
    };
    let Some(full_name) = prompt(rl, "Full name: ")? else {
        return Ok(None);
    };
    let Some(gold) = prompt(rl, "Initial gold in grams (blank for 0): ")? else {
        return Ok(None);
    };
    let user_gold = if gold.is_empty() {
        0.0
    } else {
        match gold.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value,
            _ => {
                renderer.print_error("Initial gold must be a non-negative number");
                return Ok(None);
            }
        }
    };
    Ok(Some(SignupParams {
        email,
        password,
        user_name,
        full_name,
        user_gold,
    }))
}
