//! Station Calyx Lease & Cosignature Manager (C5) CLI (spec §6 `lease
//! --issue`, `--cosign --role {human|agent} --id ID --sig SIG`,
//! `--verify ID`).
//!
//! `--issue` and `--cosign` additionally need `--intent-id`/`--actor` and
//! `--lease-id` respectively, since the bare flags the spec lists aren't
//! enough to name a specific lease or actor on their own.

use calyx_core::entities::{CosignerRole, LeaseLimits};
use calyx_core::CalyxConfig;
use calyx_policy::lease::{LeaseManager, DEFAULT_HUMAN_SIG_TIMEOUT_SECS};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-lease-cli", about = "Station Calyx Lease & Cosignature Manager (C5) CLI")]
struct Args {
    #[arg(long, default_value_t = false)]
    issue: bool,
    #[arg(long)]
    intent_id: Option<String>,
    #[arg(long)]
    actor: Option<String>,
    #[arg(long, default_value_t = DEFAULT_HUMAN_SIG_TIMEOUT_SECS as u64)]
    timeout_secs: u64,

    #[arg(long, default_value_t = false)]
    cosign: bool,
    #[arg(long)]
    lease_id: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    sig: Option<String>,

    /// Lease id to verify for usability.
    #[arg(long)]
    verify: Option<String>,
}

const SIGNING_KEY_ENV: &str = "CALYX_BRIDGE_SIGNING_KEY";

fn parse_role(s: &str) -> Result<CosignerRole, String> {
    match s {
        "human" => Ok(CosignerRole::Human),
        "agent" => Ok(CosignerRole::Agent),
        other => Err(format!("unknown role '{other}', expected human or agent")),
    }
}

fn main() -> std::process::ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-lease-cli] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();
    let signing_key = std::env::var(SIGNING_KEY_ENV).unwrap_or_else(|_| "calyx-dev-signing-key".to_string());
    let mgr = LeaseManager::open(&config.outgoing_dir(), signing_key);

    if args.issue {
        let (Some(intent_id), Some(actor)) = (args.intent_id.as_deref(), args.actor.as_deref()) else {
            eprintln!("[calyx-lease-cli] --issue requires --intent-id and --actor");
            return std::process::ExitCode::from(2);
        };
        return match mgr.issue_lease(intent_id, actor, LeaseLimits { wallclock_timeout_s: args.timeout_secs }) {
            Ok(lease) => {
                println!("{}", serde_json::to_string_pretty(&lease).unwrap_or_default());
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("[calyx-lease-cli] issue failed: {e}");
                std::process::ExitCode::from(3)
            }
        };
    }

    if args.cosign {
        let (Some(lease_id), Some(role_str), Some(id), Some(sig)) =
            (args.lease_id.as_deref(), args.role.as_deref(), args.id.as_deref(), args.sig.as_deref())
        else {
            eprintln!("[calyx-lease-cli] --cosign requires --lease-id, --role, --id, and --sig");
            return std::process::ExitCode::from(2);
        };
        let role = match parse_role(role_str) {
            Ok(r) => r,
            Err(msg) => {
                eprintln!("[calyx-lease-cli] {msg}");
                return std::process::ExitCode::from(2);
            }
        };
        return match mgr.add_cosignature(lease_id, role, id, sig) {
            Ok(lease) => {
                println!("{}", serde_json::to_string_pretty(&lease).unwrap_or_default());
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("[calyx-lease-cli] cosign failed: {e}");
                std::process::ExitCode::from(3)
            }
        };
    }

    if let Some(lease_id) = args.verify.as_deref() {
        return match mgr.verify_lease(lease_id) {
            Ok(result) => {
                println!("usable={} reason={}", result.usable, result.reason);
                if result.usable {
                    std::process::ExitCode::SUCCESS
                } else {
                    std::process::ExitCode::from(1)
                }
            }
            Err(e) => {
                eprintln!("[calyx-lease-cli] verify failed: {e}");
                std::process::ExitCode::from(3)
            }
        };
    }

    eprintln!("[calyx-lease-cli] nothing to do; pass --issue, --cosign, or --verify ID");
    std::process::ExitCode::from(2)
}
