//! Siaga observer client.
//!
//! Connects to the event hub, prints every event it broadcasts and publishes
//! events typed on stdin. Reconnects automatically with exponential backoff
//! (1s, 2s, 4s, 8s, 16s) and gives up after 5 failed attempts.
//!
//! Commands:
//! ```not_rust
//! /signal                          request a fresh weather reading
//! /activity <message>              publish an activity
//! <event_name> <json>              publish any event
//! /quit                            exit
//! ```
//!
//! Run with:
//! ```not_rust
//! cargo run --bin siaga-client
//! cargo run --bin siaga-client -- --url ws://127.0.0.1:3001/ws --token secret
//! ```

use std::io::Write;

use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use siaga_client::{ConnectionManager, command::Command, formatter::EventFormatter, hub_url};
use siaga_shared::{
    logger::setup_logger,
    protocol::{Envelope, event},
};
use tokio::sync::mpsc;

const PROMPT: &str = "siaga> ";

/// Events printed to the terminal
const DISPLAYED_EVENTS: [&str; 8] = [
    event::SIGNAL_UPDATE,
    event::ACTIVITY_UPDATE,
    event::INCIDENT_BROADCAST,
    event::EVACUATION_BROADCAST,
    event::ACTIVITY_CREATE_CONFIRMED,
    event::INCIDENT_UPDATE_CONFIRMED,
    event::EVACUATION_UPDATE_CONFIRMED,
    event::ERROR,
];

#[derive(Parser, Debug)]
#[command(name = "siaga-client")]
#[command(about = "Observer client for the Siaga event hub", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3001/ws")]
    url: String,

    /// Admin token, required to publish when the hub is configured with one
    #[arg(short = 't', long, env = "SIAGA_ADMIN_TOKEN")]
    token: Option<String>,
}

/// Redisplay the prompt after printing an event
fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let url = match hub_url(&args.url, args.token.as_deref()) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let manager = ConnectionManager::new(url);
    for name in DISPLAYED_EVENTS {
        manager.subscribe(name, move |data| {
            let envelope = Envelope::new(name, data.clone());
            print!("{}", EventFormatter::format_envelope(&envelope));
            redisplay_prompt();
        });
    }

    // Terminal reconnect failure ends the process
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<()>();
    manager.subscribe(event::ERROR, move |data| {
        if data["message"] == siaga_client::manager::TERMINAL_FAILURE_MESSAGE {
            let _ = fatal_tx.send(());
        }
    });

    manager.connect();

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let exit_code = loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else { break 0 };
                match Command::parse(&line) {
                    Ok(command) => match command.into_event() {
                        Some((name, data)) => manager.emit(&name, data),
                        None => break 0,
                    },
                    Err(e) => {
                        println!("{}", e);
                        redisplay_prompt();
                    }
                }
            }
            _ = fatal_rx.recv() => break 1,
        }
    };

    manager.disconnect();
    std::process::exit(exit_code);
}
