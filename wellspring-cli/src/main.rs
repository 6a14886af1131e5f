//! wellspring-cli — terminal client for the Wellspring assistant API
//!
//! Talks to a running `wellspring-server` over HTTP.
//!
//! # Subcommands
//! - `ask <message> [--session <id>] [--json]` — send one message
//! - `chat [--session <id>]`                   — interactive conversation on stdin
//! - `status`                                  — show server health

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8001";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "wellspring-cli",
    version,
    about = "Chat with the water utility assistant from the terminal"
)]
struct Cli {
    /// Wellspring HTTP server URL (overrides WELLSPRING_HTTP_URL env var)
    #[arg(long, env = "WELLSPRING_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a single message and print the reply
    Ask {
        /// Message text
        message: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive conversation (type /quit to leave)
    Chat {
        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show Wellspring server status
    Status,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

/// What a line typed in `chat` mode means.
#[derive(Debug, PartialEq)]
pub enum ChatInput<'a> {
    Quit,
    Skip,
    Message(&'a str),
}

pub fn classify_line(line: &str) -> ChatInput<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ChatInput::Skip,
        "/quit" | "/exit" => ChatInput::Quit,
        _ => ChatInput::Message(trimmed),
    }
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST one message to /api/chat.
fn send_message(
    client: &reqwest::blocking::Client,
    server: &str,
    message: &str,
    session_id: Option<&str>,
) -> anyhow::Result<ChatResponse> {
    let url = format!("{}/api/chat", server);
    let resp = client
        .post(&url)
        .json(&ChatRequest {
            message,
            session_id,
        })
        .send()
        .map_err(|e| anyhow::anyhow!("connection failed to {}: {}", url, e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        let reason = body["error"].as_str().unwrap_or("unknown error").to_string();
        anyhow::bail!("server returned {}: {}", status, reason);
    }

    resp.json::<ChatResponse>()
        .map_err(|e| anyhow::anyhow!("failed to parse chat response: {}", e))
}

fn do_ask(server: &str, message: &str, session: Option<&str>, json_output: bool) -> anyhow::Result<()> {
    let client = http_client(60)?;
    let reply = send_message(&client, server, message, session)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.response);
        eprintln!("session: {}", reply.session_id);
    }
    Ok(())
}

fn do_chat(server: &str, session: Option<String>) -> anyhow::Result<()> {
    let client = http_client(60)?;
    let mut session_id = session;

    eprintln!("Connected to {} — type /quit to leave", server);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let message = match classify_line(&line) {
            ChatInput::Quit => break,
            ChatInput::Skip => continue,
            ChatInput::Message(m) => m,
        };

        match send_message(&client, server, message, session_id.as_deref()) {
            Ok(reply) => {
                println!("assistant> {}\n", reply.response);
                session_id = Some(reply.session_id);
            }
            Err(e) => eprintln!("wellspring-cli: {}", e),
        }
    }

    if let Some(id) = session_id {
        eprintln!("session: {}", id);
    }
    Ok(())
}

/// Show the server status by calling GET /api/health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = http_client(10)?;

    let url = format!("{}/api/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Wellspring server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:           {}", body["version"].as_str().unwrap_or("?"));
            println!("Sessions:          {}", body["sessions"].as_u64().unwrap_or(0));
            println!("Upstream backend:  {}", body["upstream_backend"].as_str().unwrap_or("?"));
            println!("Upstream model:    {}", body["upstream_model"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("wellspring-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("wellspring-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Ask {
            message,
            session,
            json,
        } => do_ask(&server, &message, session.as_deref(), json),
        Commands::Chat { session } => do_chat(&server, session),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("wellspring-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
