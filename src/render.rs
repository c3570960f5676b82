//! Terminal output for the conversation, the dashboard and notices.
//!
//! Every line the chat binary prints goes through a [`Renderer`]. The
//! formatting itself lives in free functions so it can be checked without a
//! terminal.

use std::io::{self, Stdout, Write};

use crate::portfolio::{DashboardSummary, Notice, NoticeKind};
use crate::types::{Message, Role};

/// ANSI escape code for bold text (used for `**emphasis**` in answers).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the loading indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for suggestions and affordances).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for success notices).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for failure notices).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed before assistant messages.
pub const ASSISTANT_LABEL: &str = "Aurum AI";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print one message of the conversation.
    fn print_message(&mut self, message: &Message);

    /// Print the indicator shown while a request is in flight.
    fn print_loading(&mut self);

    /// Print suggested follow-up questions, numbered from 1.
    fn print_suggestions(&mut self, suggestions: &[String]);

    /// Print the call-to-action hints for the current reply.
    fn print_affordances(&mut self, show_buy: bool, show_dashboard: bool);

    /// Print the dashboard.
    fn print_dashboard(&mut self, summary: &DashboardSummary);

    /// Print a transient portfolio notice.
    fn print_notice(&mut self, notice: &Notice);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Whether ANSI styling is emitted.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.stdout, "{line}");
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        let line = format_message(message, self.use_color);
        self.write_line(&line);
    }

    fn print_loading(&mut self) {
        let line = paint("Aurum AI is typing...", ANSI_DIM, self.use_color);
        self.write_line(&line);
    }

    fn print_suggestions(&mut self, suggestions: &[String]) {
        if let Some(block) = format_suggestions(suggestions, self.use_color) {
            self.write_line(&block);
        }
    }

    fn print_affordances(&mut self, show_buy: bool, show_dashboard: bool) {
        if let Some(line) = format_affordances(show_buy, show_dashboard, self.use_color) {
            self.write_line(&line);
        }
    }

    fn print_dashboard(&mut self, summary: &DashboardSummary) {
        let block = format_dashboard(summary, self.use_color);
        self.write_line(&block);
    }

    fn print_notice(&mut self, notice: &Notice) {
        let color = match notice.kind {
            NoticeKind::Success => ANSI_GREEN,
            NoticeKind::Failure => ANSI_RED,
        };
        let line = paint(&notice.text, color, self.use_color);
        self.write_line(&line);
    }

    fn print_error(&mut self, error: &str) {
        let _ = self.stdout.flush();
        eprintln!("Error: {error}");
    }

    fn print_info(&mut self, info: &str) {
        self.write_line(info);
    }
}

////////////////////////////////////////// Formatting //////////////////////////////////////////

/// Formats a message with its speaker label.
pub fn format_message(message: &Message, use_color: bool) -> String {
    match message.role {
        Role::User => format!("You: {}", message.content),
        Role::Assistant => {
            let label = paint(ASSISTANT_LABEL, ANSI_CYAN, use_color);
            format!("{label}: {}", emphasize(&message.content, use_color))
        }
    }
}

/// Renders `**text**` spans as bold, or strips the markers without color.
///
/// An unmatched `**` is kept as-is.
pub fn emphasize(text: &str, use_color: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        out.push_str(&rest[..start]);
        if use_color {
            out.push_str(ANSI_BOLD);
            out.push_str(&after[..end]);
            out.push_str(ANSI_RESET);
        } else {
            out.push_str(&after[..end]);
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Formats suggestions as a numbered list, or `None` when there are none.
pub fn format_suggestions(suggestions: &[String], use_color: bool) -> Option<String> {
    if suggestions.is_empty() {
        return None;
    }
    let mut lines = vec![paint("Suggestions (/suggest <n>):", ANSI_YELLOW, use_color)];
    for (i, suggestion) in suggestions.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, suggestion));
    }
    Some(lines.join("\n"))
}

/// Formats the call-to-action hints, or `None` when neither is offered.
pub fn format_affordances(show_buy: bool, show_dashboard: bool, use_color: bool) -> Option<String> {
    let mut hints = Vec::new();
    if show_buy {
        hints.push("Buy Gold: /buy <grams>");
    }
    if show_dashboard {
        hints.push("Go to Dashboard: /dashboard");
    }
    if hints.is_empty() {
        return None;
    }
    Some(paint(&hints.join("  |  "), ANSI_YELLOW, use_color))
}

/// Formats the dashboard block.
pub fn format_dashboard(summary: &DashboardSummary, use_color: bool) -> String {
    let heading = paint(&format!("Welcome, {}", summary.name), ANSI_BOLD, use_color);
    format!(
        "{heading}\n  Wallet: {}\n  Gold:   {}",
        summary.wallet, summary.gold
    )
}

fn paint(text: &str, style: &str, use_color: bool) -> String {
    if use_color {
        format!("{style}{text}{ANSI_RESET}")
    } else {
        text.to_string()
    }
}
