//! Station Calyx Policy Gate (C4) CLI: inspect the live allow-list or
//! append entries to it (spec §6 `policy --show`, `--set KEY=VALUE`).
//!
//! `KEY` is a request_type pattern (may contain `*`); `VALUE`, if present,
//! becomes its summary_pattern. Each `--set` is additive to the existing
//! allow-list — `configure` always replaces the whole document, so this
//! CLI reads the current one first and appends before writing it back.

use calyx_core::CalyxConfig;
use calyx_policy::{AllowPattern, PolicyDocument, PolicyGate};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-policy-cli", about = "Station Calyx Policy Gate (C4) CLI")]
struct Args {
    /// Print the live policy document and exit.
    #[arg(long, default_value_t = false)]
    show: bool,

    /// Append an allow-list entry as `request_type` or `request_type=summary_pattern`.
    /// May be given more than once.
    #[arg(long = "set")]
    set: Vec<String>,
}

fn read_document(policy_path: &std::path::Path) -> PolicyDocument {
    std::fs::read(policy_path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn parse_pattern(entry: &str) -> AllowPattern {
    match entry.split_once('=') {
        Some((request_type, summary)) if !summary.is_empty() => {
            AllowPattern { request_type: request_type.to_string(), summary_pattern: Some(summary.to_string()) }
        }
        Some((request_type, _)) => AllowPattern { request_type: request_type.to_string(), summary_pattern: None },
        None => AllowPattern { request_type: entry.to_string(), summary_pattern: None },
    }
}

fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-policy-cli] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();
    let policy_path = config.outgoing_dir().join("policies").join("policy.json");

    if args.set.is_empty() && !args.show {
        eprintln!("[calyx-policy-cli] nothing to do; pass --show or --set KEY=VALUE");
        return std::process::ExitCode::from(2);
    }

    if !args.set.is_empty() {
        let mut document = read_document(&policy_path);
        document.allow.extend(args.set.iter().map(|s| parse_pattern(s)));
        let gate = PolicyGate::open(&config.outgoing_dir(), None);
        match gate.configure(document.allow) {
            Ok(version) => println!("policy_version={version}"),
            Err(e) => {
                eprintln!("[calyx-policy-cli] failed to write policy: {e}");
                return std::process::ExitCode::from(3);
            }
        }
    }

    if args.show {
        let document = read_document(&policy_path);
        match serde_json::to_string_pretty(&document) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("[calyx-policy-cli] failed to render policy document: {e}");
                return std::process::ExitCode::from(3);
            }
        }
    }

    std::process::ExitCode::SUCCESS
}
