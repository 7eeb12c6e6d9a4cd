use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "keygated",
    about = "Keygated — daily access key issuance server daemon",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Keygate HTTP server
    Serve {
        /// Port to listen on (default: $KEYGATE_PORT or 5000)
        #[arg(long, env = "KEYGATE_PORT", default_value = "5000")]
        port: u16,
        /// Host to bind (default: $KEYGATE_HOST or 0.0.0.0)
        #[arg(long, env = "KEYGATE_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Directory holding generated_keys.json and banned_ips.json
        #[arg(long, env = "KEYGATE_DATA_DIR")]
        data_dir: Option<PathBuf>,
        /// Comma-separated IPs allowed to generate developer keys
        #[arg(long, env = "KEYGATE_ALLOWLIST", default_value = "127.0.0.1")]
        allowlist: String,
        /// Comma-separated CORS origins (default: any)
        #[arg(long, env = "KEYGATE_CORS_ORIGINS")]
        cors_origins: Option<String>,
        /// Log level: error, warn, info, debug, verbose (default: $KEYGATE_LOG_LEVEL or warn)
        #[arg(long, env = "KEYGATE_LOG_LEVEL")]
        log_level: Option<String>,
    },
    /// Print the banned IPs, one per line (read-only).
    Bans {
        #[arg(long, env = "KEYGATE_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let effective_log_level = if let Commands::Serve { ref log_level, .. } = cli.command {
        let raw = log_level.clone().unwrap_or_else(|| "warn".into());
        if raw.eq_ignore_ascii_case("verbose") {
            "debug".to_owned()
        } else {
            raw
        }
    } else {
        std::env::var("KEYGATE_LOG_LEVEL").unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&effective_log_level))
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            data_dir,
            allowlist,
            cors_origins,
            log_level: _,
        } => {
            let cfg = keygate_server::ServerConfig {
                host,
                port,
                data_dir,
                allowlist: keygate_server::server::parse_allowlist(&allowlist),
                cors_origins,
            };
            keygate_server::run(cfg).await
        }

        Commands::Bans { data_dir } => cmd_bans(data_dir),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

fn cmd_bans(data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = keygate_server::resolve_data_dir(data_dir.as_ref())?;
    let bans = keygate_server::store::BanList::open_bans(&data_dir);
    let banned = bans.load()?;
    tracing::debug!(count = banned.len(), path = %bans.path().display(), "loaded ban list");
    for ip in banned {
        println!("{ip}");
    }
    Ok(())
}
