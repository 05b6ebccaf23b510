//! clamber CLI - clamd scanning client.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clamber_client::{protocol, ClamClient};
use clamber_core::{ClamError, ScanResult, Status};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CLAMBER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = cli::Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("clamber: {e}");
            return ExitCode::from(2);
        }
    };
    debug!(host = %config.host, port = config.port, "resolved config");
    let client = ClamClient::new(config);

    match cli.command {
        cli::Command::Ping => run_ping(&client),
        cli::Command::Scan { files } => run_scan(&client, &files),
        cli::Command::Command { name } => run_command(&client, &name),
    }
}

fn run_ping(client: &ClamClient) -> ExitCode {
    match client.ping() {
        Ok(true) => {
            info!("daemon answered PONG");
            println!("PONG");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            warn!("daemon gave an unexpected reply to PING");
            eprintln!("clamber: daemon did not answer PONG");
            ExitCode::FAILURE
        }
        Err(e) => {
            warn!(%e, "ping failed");
            eprintln!("clamber: {e}");
            ExitCode::from(2)
        }
    }
}

fn run_scan(client: &ClamClient, files: &[PathBuf]) -> ExitCode {
    let mut found = false;
    let mut failed = false;

    if files.is_empty() {
        debug!("no files given, scanning stdin");
        match client.scan(std::io::stdin().lock()) {
            Ok(result) => found |= report("stdin", &result),
            Err(e) => failed |= report_error("stdin", &e),
        }
    }

    for path in files {
        let label = path.display().to_string();
        debug!(file = %label, "scanning");
        match client.scan_path(path) {
            Ok(result) => found |= report(&label, &result),
            Err(e) => failed |= report_error(&label, &e),
        }
    }

    if failed {
        ExitCode::from(2)
    } else if found {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print one verdict line; returns whether a signature matched.
fn report(label: &str, result: &ScanResult) -> bool {
    match result.status() {
        Status::Found(name) => {
            info!(input = label, name, "signature matched");
            println!("{label}: {name} FOUND");
            true
        }
        Status::Ok => {
            println!("{label}: OK");
            false
        }
        Status::SizeLimitExceeded => {
            warn!(input = label, "stream exceeded the daemon's size limit");
            println!("{label}: exceeds the daemon's stream size limit");
            false
        }
        Status::Unknown => {
            warn!(input = label, response = result.response(), "unrecognized reply");
            println!("{label}: UNKNOWN ({})", result.response());
            false
        }
    }
}

/// Print one failure line; always returns true.
fn report_error(label: &str, error: &ClamError) -> bool {
    warn!(input = label, %error, "scan failed");
    eprintln!("clamber: {label}: {error}");
    true
}

fn run_command(client: &ClamClient, name: &str) -> ExitCode {
    let command = protocol::encode_command(name, true);
    match client.send_command(&command) {
        Ok(raw) => {
            println!("{}", protocol::decode_reply(&raw));
            ExitCode::SUCCESS
        }
        Err(e) => {
            warn!(%e, command = name, "command failed");
            eprintln!("clamber: {e}");
            ExitCode::from(2)
        }
    }
}
