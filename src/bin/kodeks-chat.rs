//! Interactive chat with the legal-assistant backend.
//!
//! This binary provides a streaming REPL interface for asking questions
//! about the Criminal Code of Ukraine.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the local development backend
//! kodeks-chat
//!
//! # Point at a deployed backend
//! kodeks-chat --base-url https://assistant.example.com/api/
//!
//! # Disable colors (useful for piping output)
//! kodeks-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/session` - Show the current session id
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use kodeks::chat::{ChatArgs, ChatCommand, ChatConfig, SharedRenderer, help_text, parse_command};
use kodeks::{Backend, Controller, Kodeks};

/// Main entry point for the kodeks-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("kodeks-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let client = Kodeks::with_options(config.base_url.clone(), Some(config.timeout))?;
    let renderer = SharedRenderer::with_color(config.use_color);
    let mut controller = Controller::new(client);
    controller
        .conversation_mut()
        .subscribe(Box::new(renderer.clone()));
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Kodeks legal assistant");
    println!("Type /help for commands, /quit to exit\n");

    controller.start().await;
    renderer.finish_response();
    if controller.session_id().is_none() {
        renderer.print_info("(no session: the backend could not be reached; queries will be unattributed)");
    }

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            controller.clear().await;
                            renderer.finish_response();
                        }
                        ChatCommand::Session => {
                            match controller.session_id() {
                                Some(id) => renderer.print_info(&format!("Session: {id}")),
                                None => renderer.print_info("Session: (none)"),
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&controller);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular query - stream the answer into the conversation;
                // the subscribed renderer prints chunks as they land.
                controller.send(line, interrupted.clone()).await;
                renderer.finish_response();
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats<B: Backend>(controller: &Controller<B>) {
    let turns = controller.conversation().turns();
    let user = turns.iter().filter(|t| t.role == kodeks::Role::User).count();
    let assistant = turns
        .iter()
        .filter(|t| t.role == kodeks::Role::Assistant)
        .count();
    let errors = turns
        .iter()
        .filter(|t| t.role == kodeks::Role::Error)
        .count();

    println!("    Session Statistics:");
    match controller.session_id() {
        Some(id) => println!("      Session: {id}"),
        None => println!("      Session: (none)"),
    }
    println!("      Turns: {}", turns.len());
    println!("      Questions: {user}");
    println!("      Answers: {assistant}");
    if errors > 0 {
        println!("      Errors: {errors}");
    }
}
