//! Output rendering for the chat widget.
//!
//! The widget reports every visible change through the [`Renderer`] trait; the default
//! implementation writes to the terminal using ANSI escape codes picked from the active theme.

use std::io::{self, Stdout, Write};

use crate::theme::Theme;
use crate::types::{Message, Sender, Source};
use crate::utils::time::clock;

use super::state::{StatusLevel, StatusLine};

/// ANSI escape code for dim text.
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code to erase the current line and return to column zero.
const ANSI_ERASE_LINE: &str = "\r\x1b[2K";

/// Colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    user: &'static str,
    bot: &'static str,
    source: &'static str,
    info: &'static str,
    error: &'static str,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                user: "\x1b[34m",
                bot: "\x1b[30m",
                source: "\x1b[35m",
                info: "\x1b[36m",
                error: "\x1b[31m",
            },
            Theme::Dark => Palette {
                user: "\x1b[94m",
                bot: "\x1b[97m",
                source: "\x1b[95m",
                info: "\x1b[96m",
                error: "\x1b[91m",
            },
        }
    }
}

/// Trait for rendering widget output.
pub trait Renderer: Send {
    /// Switch color schemes.
    fn set_theme(&mut self, theme: Theme);

    /// The whole transcript was replaced.
    fn print_transcript(&mut self, messages: &[Message], max_sources: usize);

    /// A finalized message was appended.
    fn print_message(&mut self, message: &Message, max_sources: usize);

    /// A request is in flight and its placeholder is showing.
    fn start_response(&mut self);

    /// The placeholder was removed.
    fn discard_response(&mut self);

    /// A streaming message was appended and is about to receive text.
    fn start_reveal(&mut self, message: &Message);

    /// Text was appended to the streaming message.
    fn print_reveal_text(&mut self, text: &str);

    /// The streaming message was finalized.
    fn finish_reveal(&mut self, message: &Message, max_sources: usize);

    /// The status line changed; `None` clears it.
    fn print_status(&mut self, status: Option<&StatusLine>);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    palette: Palette,
    placeholder_shown: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled and the light theme.
    pub fn new() -> Self {
        Self::with_color(true, Theme::default())
    }

    /// Creates a new PlainTextRenderer with the given color setting and theme.
    pub fn with_color(use_color: bool, theme: Theme) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            palette: Palette::for_theme(theme),
            placeholder_shown: false,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn style(&self, code: &'static str) -> &'static str {
        if self.use_color { code } else { "" }
    }

    fn reset(&self) -> &'static str {
        self.style(ANSI_RESET)
    }

    fn label(&self, message: &Message) -> String {
        let color = if message.is_error {
            self.palette.error
        } else {
            match message.sender {
                Sender::User => self.palette.user,
                Sender::Bot => self.palette.bot,
            }
        };
        let name = match message.sender {
            Sender::User => "You",
            Sender::Bot => "Bot",
        };
        format!(
            "{}{}{}{} {}[{}]{}",
            self.style(ANSI_BOLD),
            self.style(color),
            name,
            self.reset(),
            self.style(ANSI_DIM),
            clock(&message.timestamp),
            self.reset(),
        )
    }

    fn print_sources(&mut self, sources: &[Source]) {
        if sources.is_empty() {
            return;
        }
        let dim = self.style(ANSI_DIM);
        let color = self.style(self.palette.source);
        let reset = self.reset();
        println!("{dim}  Sources:{reset}");
        for (idx, source) in sources.iter().enumerate() {
            println!(
                "{dim}  [{}]{reset} {color}{}{reset} {dim}({}, {}% match){reset}",
                idx + 1,
                source.title,
                source.source,
                source.similarity_percent(),
            );
            if !source.url.is_empty() {
                println!("{dim}      {}{reset}", source.url);
            }
        }
    }

    fn clear_placeholder(&mut self) {
        if self.placeholder_shown {
            if self.use_color {
                print!("{ANSI_ERASE_LINE}");
            } else {
                println!();
            }
            self.placeholder_shown = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn set_theme(&mut self, theme: Theme) {
        self.palette = Palette::for_theme(theme);
    }

    fn print_transcript(&mut self, messages: &[Message], max_sources: usize) {
        self.clear_placeholder();
        println!();
        for message in messages {
            self.print_message(message, max_sources);
        }
    }

    fn print_message(&mut self, message: &Message, max_sources: usize) {
        self.clear_placeholder();
        let label = self.label(message);
        if message.is_error {
            let color = self.style(self.palette.error);
            let reset = self.reset();
            println!("{label} {color}{}{reset}", message.text);
        } else {
            println!("{label} {}", message.text);
        }
        self.print_sources(message.displayed_sources(max_sources));
        self.flush();
    }

    fn start_response(&mut self) {
        let dim = self.style(ANSI_DIM);
        let reset = self.reset();
        print!("{dim}Bot is thinking...{reset}");
        self.placeholder_shown = true;
        self.flush();
    }

    fn discard_response(&mut self) {
        self.clear_placeholder();
        self.flush();
    }

    fn start_reveal(&mut self, message: &Message) {
        self.clear_placeholder();
        let label = self.label(message);
        print!("{label} ");
        self.flush();
    }

    fn print_reveal_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn finish_reveal(&mut self, message: &Message, max_sources: usize) {
        println!();
        self.print_sources(message.displayed_sources(max_sources));
        self.flush();
    }

    fn print_status(&mut self, status: Option<&StatusLine>) {
        let Some(status) = status else {
            return;
        };
        self.clear_placeholder();
        let color = match status.level {
            StatusLevel::Info => self.style(self.palette.info),
            StatusLevel::Error => self.style(self.palette.error),
        };
        let reset = self.reset();
        eprintln!("{color}* {}{reset}", status.text);
    }

    fn print_info(&mut self, info: &str) {
        self.clear_placeholder();
        println!("{info}");
    }

    fn print_error(&mut self, error: &str) {
        self.clear_placeholder();
        eprintln!("\nError: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
        assert_eq!(renderer.palette, Palette::for_theme(Theme::Light));
    }

    #[test]
    fn renderer_without_color_emits_no_escapes() {
        let renderer = PlainTextRenderer::with_color(false, Theme::Dark);
        let label = renderer.label(&Message::user("m1", "hi"));
        assert!(!label.contains('\x1b'));
        assert!(label.starts_with("You ["));
    }

    #[test]
    fn theme_switch_changes_palette() {
        let mut renderer = PlainTextRenderer::with_color(true, Theme::Light);
        renderer.set_theme(Theme::Dark);
        assert_eq!(renderer.palette, Palette::for_theme(Theme::Dark));
        assert_ne!(
            Palette::for_theme(Theme::Dark),
            Palette::for_theme(Theme::Light)
        );
    }
}
