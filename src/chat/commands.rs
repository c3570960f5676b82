//! Slash command parsing for the chat application.
//!
//! Input that starts with `/` controls the session and the portfolio instead
//! of being sent to the assistant.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Log in; the username is prompted for when absent.
    Login(Option<String>),

    /// Register a new account.
    Signup,

    /// End the session.
    Logout,

    /// Show the dashboard.
    Dashboard,

    /// Buy the given grams of gold. The amount is validated by the portfolio.
    Buy(String),

    /// Sell the given grams of gold.
    Sell(String),

    /// Add the given rupee amount to the wallet.
    AddMoney(String),

    /// Send the suggestion at this zero-based index.
    Suggest(usize),

    /// Reprint the conversation.
    History,

    /// Show who is logged in.
    WhoAmI,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent to the assistant.
///
/// # Examples
///
/// ```
/// # use aurum::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/buy 0.5").is_some());
/// assert!(parse_command("What is an SGB?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "login" => ChatCommand::Login(argument.map(|s| s.to_string())),
        "signup" | "register" => ChatCommand::Signup,
        "logout" => ChatCommand::Logout,
        "dashboard" | "dash" => ChatCommand::Dashboard,
        "buy" => ChatCommand::Buy(argument.unwrap_or_default().to_string()),
        "sell" => ChatCommand::Sell(argument.unwrap_or_default().to_string()),
        "addmoney" | "add" => ChatCommand::AddMoney(argument.unwrap_or_default().to_string()),
        "suggest" | "s" => parse_suggest(argument),
        "history" => ChatCommand::History,
        "whoami" => ChatCommand::WhoAmI,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_suggest(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/suggest requires a suggestion number".to_string());
    };
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => ChatCommand::Suggest(n - 1),
        _ => ChatCommand::Invalid("/suggest expects a number starting at 1".to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /login [username]      Log in to your account
  /signup                Create a new account
  /logout                Log out
  /dashboard             Show your wallet and gold balance
  /buy <grams>           Buy gold
  /sell <grams>          Sell gold
  /addmoney <amount>     Add money to your wallet
  /suggest <n>           Ask suggested question number n
  /history               Show the conversation so far
  /whoami                Show the logged-in user
  /help                  Show this help message
  /quit                  Exit the chat"#
}
