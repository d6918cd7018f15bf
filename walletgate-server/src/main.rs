//! walletgate server implementation

use anyhow::Context;
use clap::{Arg, Command};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use walletgate_core::auth::{Authenticator, Whitelist};
use walletgate_core::WalletAddress;

mod handlers;
mod server;

use server::AuthServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = Command::new("walletgate-server")
        .version("0.1.0")
        .about("Challenge-response wallet authentication service")
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Bind address")
                .default_value("127.0.0.1:8080"),
        )
        .arg(
            Arg::new("whitelist")
                .long("whitelist")
                .value_name("PATH")
                .help("JSON array of permitted base-58 wallet addresses")
                .required(true),
        )
        .arg(
            Arg::new("challenge-ttl-secs")
                .long("challenge-ttl-secs")
                .value_name("SECS")
                .help("Lifetime of an issued challenge in seconds")
                .default_value("300"),
        )
        .get_matches();

    let bind_addr: SocketAddr = matches
        .get_one::<String>("bind")
        .unwrap()
        .parse()
        .context("invalid bind address")?;

    let whitelist_path: PathBuf = matches.get_one::<String>("whitelist").unwrap().into();

    let ttl_secs: u64 = matches
        .get_one::<String>("challenge-ttl-secs")
        .unwrap()
        .parse()
        .context("invalid challenge TTL")?;

    let whitelist = load_whitelist(&whitelist_path)
        .with_context(|| format!("failed to load whitelist from {}", whitelist_path.display()))?;

    info!("Starting walletgate server");
    info!("Bind address: {}", bind_addr);
    info!("Whitelisted addresses: {}", whitelist.len());
    info!("Challenge TTL: {}s", ttl_secs);

    if whitelist.is_empty() {
        warn!("Whitelist is empty; every initiation will be rejected");
    }

    let authenticator = Authenticator::new(whitelist, Duration::from_secs(ttl_secs));

    let server = AuthServer::new(authenticator);

    match server.serve(bind_addr).await {
        Ok(()) => info!("Server shutdown gracefully"),
        Err(e) => {
            warn!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

/// Load the whitelist file: a JSON array of base-58 addresses.
///
/// Every entry must validate; a single bad address fails startup rather
/// than silently admitting nobody.
fn load_whitelist(path: &Path) -> anyhow::Result<Whitelist> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<String> =
        serde_json::from_str(&raw).context("whitelist must be a JSON array of strings")?;

    let mut addresses = Vec::with_capacity(entries.len());
    for entry in &entries {
        let address = WalletAddress::parse(entry)
            .map_err(|e| anyhow::anyhow!("invalid whitelist entry {:?}: {}", entry, e))?;
        addresses.push(address);
    }

    Ok(Whitelist::new(addresses))
}
