//! Slash command parsing for the chat widget.
//!
//! Input that starts with `/` controls the widget instead of being sent to the backend.

use crate::theme::Theme;

/// A parsed widget command.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    /// Clear the conversation and start over, keeping the session.
    Reset,

    /// Switch theme.  `None` toggles.
    Theme(Option<Theme>),

    /// Show session and connectivity details.
    Status,

    /// Save the transcript to a file.
    Save(String),

    /// Display help information.
    Help,

    /// Exit.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(WidgetCommand)` if the input is a command, or `None` if it should be sent as
/// a message.
///
/// # Examples
///
/// ```
/// # use ragchat::widget::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/theme dark").is_some());
/// assert!(parse_command("What is retrieval augmented generation?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<WidgetCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "reset" | "new" | "clear" => WidgetCommand::Reset,
        "theme" => match argument {
            None => WidgetCommand::Theme(None),
            Some(arg) => match arg.parse::<Theme>() {
                Ok(theme) => WidgetCommand::Theme(Some(theme)),
                Err(err) => WidgetCommand::Invalid(format!("/theme: {err}")),
            },
        },
        "status" | "stats" => WidgetCommand::Status,
        "save" => match argument {
            Some(arg) => WidgetCommand::Save(arg.to_string()),
            None => WidgetCommand::Invalid("/save requires a file path".to_string()),
        },
        "help" | "?" => WidgetCommand::Help,
        "quit" | "exit" | "q" => WidgetCommand::Quit,
        _ => WidgetCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /reset                 Clear the conversation (keeps the session)
  /theme [dark|light]    Set the theme (no argument toggles)
  /status                Show session and connection details
  /save <file>           Save the transcript as JSON
  /help                  Show this help message
  /quit                  Exit"#
}
