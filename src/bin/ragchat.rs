//! Interactive terminal client for a retrieval-augmented chat backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on localhost:3001
//! ragchat
//!
//! # Point at a deployed backend
//! ragchat --url https://rag.example.com/
//!
//! # Slow the reveal down and log transitions to stderr
//! ragchat --reveal-ms 250 --log-level debug
//! ```
//!
//! # Commands
//!
//! - `/help` - Show available commands
//! - `/reset` - Clear the conversation
//! - `/theme [dark|light]` - Switch themes
//! - `/status` - Show session and connectivity details
//! - `/save <file>` - Save the transcript as JSON
//! - `/quit` - Exit the application

use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc as std_mpsc;
use std::thread;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::Level;

use ragchat::widget::{
    BootstrapOutcome, Dispatch, Ignored, PlainTextRenderer, Renderer, Widget, WidgetArgs,
    WidgetCommand, WidgetConfig, help_text, parse_command,
};
use ragchat::{ChatBackend, FileStorage, RagClient};

/// Something the reader thread saw.
enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Main entry point for the ragchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = WidgetArgs::from_command_line_relaxed("ragchat [OPTIONS]");
    let level = match args.log_level.as_deref() {
        Some(level) => Level::from_str(level)?,
        None => Level::WARN,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = WidgetConfig::from(args);
    let client = RagClient::new(config.base_url.clone())?;
    let base_url = client.base_url().to_string();
    let state_path = config
        .state_path
        .clone()
        .unwrap_or_else(FileStorage::default_path);
    let storage = FileStorage::open(&state_path)?;

    let use_color = config.use_color;
    let mut widget = Widget::new(client, Box::new(storage), config);
    let mut renderer = PlainTextRenderer::with_color(use_color, widget.theme());

    let (interrupt_tx, mut interrupt_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })?;

    println!("RAG Chat ({})", base_url);
    println!("Type /help for commands, /quit to exit\n");

    // A cold start can take minutes; Ctrl+C must still exit while it runs.
    let outcome = tokio::select! {
        outcome = widget.bootstrap(&mut renderer) => outcome,
        _ = interrupt_rx.recv() => {
            println!("\nGoodbye!");
            widget.teardown();
            return Ok(());
        }
    };
    if let BootstrapOutcome::Failed = outcome {
        widget.teardown();
        return Ok(());
    }

    // The prompt is only shown when the reader is granted a permit, so revealed text never
    // lands in the middle of a line being typed.
    let (permit_tx, permit_rx) = std_mpsc::channel::<()>();
    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let mut rl = DefaultEditor::new()?;
    thread::spawn(move || {
        while permit_rx.recv().is_ok() {
            let input = match rl.readline("You: ") {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.trim());
                    Input::Line(line)
                }
                Err(ReadlineError::Interrupted) => Input::Interrupted,
                Err(ReadlineError::Eof) => Input::Eof,
                Err(err) => Input::Failed(err.to_string()),
            };
            if line_tx.send(input).is_err() {
                break;
            }
        }
    });

    let mut prompting = false;
    loop {
        if !prompting && !widget.is_busy() {
            if permit_tx.send(()).is_err() {
                break;
            }
            prompting = true;
        }

        tokio::select! {
            input = line_rx.recv() => {
                prompting = false;
                let Some(input) = input else {
                    break;
                };
                let line = match input {
                    Input::Line(line) => line,
                    Input::Interrupted | Input::Eof => {
                        println!("\nGoodbye!");
                        break;
                    }
                    Input::Failed(err) => {
                        renderer.print_error(&format!("Input error: {}", err));
                        break;
                    }
                };
                if !handle_line(&mut widget, &mut renderer, &line, &base_url, &state_path).await {
                    println!("Goodbye!");
                    break;
                }
            }
            alive = widget.pump(&mut renderer) => {
                if !alive {
                    break;
                }
            }
            _ = interrupt_rx.recv() => {
                println!("\nGoodbye!");
                break;
            }
        }
    }

    widget.teardown();
    Ok(())
}

/// Act on one line of input.  Returns false when the user asked to quit.
async fn handle_line<B: ChatBackend>(
    widget: &mut Widget<B>,
    renderer: &mut PlainTextRenderer,
    line: &str,
    base_url: &str,
    state_path: &Path,
) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    let Some(cmd) = parse_command(line) else {
        if let Dispatch::Ignored(reason) = widget.send(line, renderer) {
            match reason {
                Ignored::Blank => {}
                Ignored::Busy => renderer.print_info("Still answering the previous message."),
                Ignored::NoSession => renderer.print_error("No session; restart to try again."),
                Ignored::Disconnected => {
                    renderer.print_error("Not connected; waiting for the backend to come back.")
                }
                Ignored::TornDown => return false,
            }
        }
        return true;
    };

    match cmd {
        WidgetCommand::Quit => return false,
        WidgetCommand::Reset => {
            if widget.reset(renderer).await {
                renderer.print_info("Conversation cleared.");
            } else if !widget.is_connected() || widget.is_busy() {
                renderer.print_info("Can't reset right now.");
            }
        }
        WidgetCommand::Theme(theme) => {
            let theme = match theme {
                Some(theme) => {
                    widget.set_theme(theme, renderer);
                    theme
                }
                None => widget.toggle_theme(renderer),
            };
            renderer.print_info(&format!("Theme set to {}", theme));
        }
        WidgetCommand::Status => print_status(widget, base_url, state_path),
        WidgetCommand::Save(path) => match widget.save_transcript_to(&path) {
            Ok(()) => renderer.print_info(&format!("Transcript saved to {}", path)),
            Err(err) => renderer.print_error(&format!("Failed to save transcript: {}", err)),
        },
        WidgetCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        WidgetCommand::Invalid(message) => renderer.print_error(&message),
    }
    true
}

fn print_status<B: ChatBackend>(widget: &Widget<B>, base_url: &str, state_path: &Path) {
    println!("    Session Status:");
    println!("      Backend: {}", base_url);
    println!(
        "      Session: {}",
        widget.session_id().unwrap_or("(none)")
    );
    println!(
        "      Connection: {}",
        if widget.is_connected() {
            "connected"
        } else {
            "disconnected"
        }
    );
    println!(
        "      Health checks: {}",
        if widget.is_monitoring() {
            "running"
        } else {
            "stopped"
        }
    );
    println!("      Messages: {}", widget.transcript().len());
    println!("      Theme: {}", widget.theme());
    println!("      State file: {}", state_path.display());
    if let Some(status) = widget.status() {
        println!("      Status: {}", status.text);
    }
}
