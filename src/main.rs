use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

const BOT_NAMES: [&str; 4] = ["North", "East", "South", "West"];

#[derive(Parser)]
#[command(name = "bridgebid-combined")]
#[command(about = "Bridge bidding lobby - combined server and client launcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server plus four bidding bots
    Demo {
        /// Port for the server
        #[arg(short, long, default_value = "9001")]
        port: u16,
        /// Lobby code
        #[arg(long, default_value = "ABCD")]
        code: String,
        /// Rounds the bots play before idling
        #[arg(long, default_value = "2")]
        rounds: u32,
    },
    /// Run only the server
    Server {
        /// Port for the server
        #[arg(short, long, default_value = "9001")]
        port: u16,
        /// Lobby code
        #[arg(long, default_value = "ABCD")]
        code: String,
    },
    /// Run the interactive terminal client
    Client {
        /// Port of a running server
        #[arg(short, long, default_value = "9001")]
        port: u16,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { port, code, rounds } => run_demo(port, code, rounds),
        Commands::Server { port, code } => run_server(port, &code),
        Commands::Client { port } => run_client(port),
    }
}

fn run_demo(port: u16, code: String, rounds: u32) -> Result<()> {
    println!("🚀 Starting bridge lobby on port {} with {} bots", port, BOT_NAMES.len());

    let server_code = code.clone();
    let server_handle = thread::spawn(move || run_server(port, &server_code));

    // Wait a moment for server to start
    thread::sleep(Duration::from_millis(1500));

    let mut bot_handles = Vec::new();
    for (i, &name) in BOT_NAMES.iter().enumerate() {
        println!("🤖 Starting bot {}...", name);
        let code = code.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300 * i as u64)); // join in seat order
            run_bot(name, port, &code, rounds, 2 + i as u8)
        });
        bot_handles.push(handle);
    }

    println!("✅ All processes started. Press Ctrl+C to stop.");

    for handle in bot_handles {
        if let Ok(Err(e)) = handle.join() {
            eprintln!("❌ {e:#}");
        }
    }
    match server_handle.join() {
        Ok(result) => result,
        Err(_) => bail!("server thread panicked"),
    }
}

fn run_server(port: u16, code: &str) -> Result<()> {
    let port = port.to_string();
    run_cargo(&["run", "-p", "bridgebid-server", "--", "--port", &port, "--room-code", code], "server")
}

fn run_client(port: u16) -> Result<()> {
    let url = format!("ws://127.0.0.1:{port}/ws");
    run_cargo(&["run", "--bin", "cli_client", "--", "--url", &url], "client")
}

fn run_bot(name: &str, port: u16, code: &str, rounds: u32, ceiling: u8) -> Result<()> {
    let url = format!("ws://127.0.0.1:{port}/ws");
    let rounds = rounds.to_string();
    let ceiling = ceiling.to_string();
    run_cargo(
        &[
            "run", "--bin", "demo_cli", "--", name, "--url", &url, "--code", code, "--rounds", &rounds,
            "--ceiling", &ceiling,
        ],
        name,
    )
}

fn run_cargo(args: &[&str], what: &str) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("failed to start {what}"))?;

    if !status.success() {
        bail!("{what} exited with error: {status}");
    }
    Ok(())
}
