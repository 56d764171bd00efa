//! settle-keygen: create or inspect a request signing key pair.

use anyhow::{Context, Result};
use clap::Parser;
use settle_keygen::{KeyPair, DERIVATION_PATH};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate a secp256k1 key pair for signing settlement requests
#[derive(Parser, Debug)]
#[command(name = "settle-keygen")]
#[command(about = "Generate or inspect a secp256k1 request signing key pair")]
struct Args {
    /// BIP-39 mnemonic to derive the key from; a new one is generated if omitted
    #[arg(long, env = "SETTLE_MNEMONIC", hide_env_values = true, conflicts_with_all = ["private_key", "no_mnemonic"])]
    mnemonic: Option<String>,

    /// Existing hex private key to derive the public key from
    #[arg(long, env = "SETTLE_PRIVATE_KEY", hide_env_values = true, conflicts_with = "no_mnemonic")]
    private_key: Option<String>,

    /// Generate a bare random key without a mnemonic
    #[arg(long)]
    no_mnemonic: bool,

    /// Print the key pair as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let pair = if let Some(phrase) = args.mnemonic.as_deref() {
        info!(path = DERIVATION_PATH, "Deriving key pair from supplied mnemonic");
        KeyPair::from_mnemonic(phrase).context("invalid mnemonic")?
    } else if let Some(key) = args.private_key.as_deref() {
        info!("Deriving public key from supplied private key");
        KeyPair::from_private_key_hex(key).context("invalid private key")?
    } else if args.no_mnemonic {
        info!("Generating new random key pair");
        KeyPair::generate()
    } else {
        info!(path = DERIVATION_PATH, "Generating new mnemonic and key pair");
        KeyPair::generate_with_mnemonic().context("failed to generate mnemonic")?
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&pair).context("failed to encode key pair")?
        );
    } else {
        println!("{pair}");
    }

    Ok(())
}
