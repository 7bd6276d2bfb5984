// rsa-license - issue and verify machine-bound licenses
//
// Usage:
//   rsa-license keygen --bits 1024
//   rsa-license fingerprint
//   rsa-license issue --fingerprint <BASE64>
//   rsa-license verify
//
// Log level comes from RUST_LOG (default info); -v forces debug.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rsa_license::config::{load_config, LicenseConfig};
use rsa_license::license::{
    FingerprintSource, LicenseStatus, StaticFingerprintSource, SystemFingerprintSource,
};
use rsa_license::rsa::generate_keypair;
use rsa_license::util::file_ops::format_file_size;
use rsa_license::util::{read_json, write_json};
use rsa_license::{Fingerprint, Issuer, RsaKeyPair, RsaPublicKey, Verifier};

#[derive(Parser, Debug)]
#[command(name = "rsa-license")]
#[command(about = "Machine-bound RSA license issuance and verification")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and write the private and public key files
    Keygen {
        /// Modulus size in bits (defaults to the configured size)
        #[arg(long)]
        bits: Option<u32>,
    },

    /// Print this machine's fingerprint as base64
    Fingerprint,

    /// Sign a base64 fingerprint into a license file
    Issue {
        /// Base64 fingerprint sent by the customer
        #[arg(short, long)]
        fingerprint: String,

        /// Output license path (defaults to the configured path)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check the license file against this machine
    Verify {
        /// License path (defaults to the configured path)
        #[arg(short, long)]
        license: Option<PathBuf>,

        /// Use these machine fields instead of collecting them
        #[arg(long)]
        fields: Option<String>,
    },
}

fn main() {
    let args = Args::parse();
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run(args) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LicenseConfig::default(),
    };

    match args.command {
        Command::Keygen { bits } => keygen(&config, bits.unwrap_or(config.modulus_bits)),
        Command::Fingerprint => {
            let fingerprint = SystemFingerprintSource::default()
                .fingerprint()
                .context("collecting machine fingerprint")?;
            println!("{}", fingerprint.to_base64());
            Ok(())
        }
        Command::Issue { fingerprint, out } => {
            let out = out.unwrap_or_else(|| config.license_path.clone());
            issue(&config, &fingerprint, &out)
        }
        Command::Verify { license, fields } => {
            let license = license.unwrap_or_else(|| config.license_path.clone());
            verify(&config, &license, fields)
        }
    }
}

fn keygen(config: &LicenseConfig, bits: u32) -> Result<()> {
    info!(bits, "generating key pair");
    let keypair = generate_keypair(bits).context("generating key pair")?;

    write_json(&config.private_key_path, &keypair)?;
    write_json(&config.public_key_path, &keypair.public_key())?;

    info!(
        private = %config.private_key_path.display(),
        public = %config.public_key_path.display(),
        "key files written"
    );
    Ok(())
}

fn issue(config: &LicenseConfig, fingerprint_b64: &str, out: &Path) -> Result<()> {
    let keypair: RsaKeyPair = read_json(&config.private_key_path)?;
    let fingerprint = Fingerprint::from_base64(fingerprint_b64).context("decoding fingerprint")?;

    let issuer = Issuer::new(keypair)?.with_encoding(config.encoding);
    let written = issuer.issue_to_file(&fingerprint, out)?;

    println!("{} ({})", out.display(), format_file_size(written as u64));
    Ok(())
}

fn verify(config: &LicenseConfig, license: &Path, fields: Option<String>) -> Result<()> {
    let public_key: RsaPublicKey = read_json(&config.public_key_path)?;
    let verifier = Verifier::new(public_key)?
        .with_encoding(config.encoding)
        .with_tolerance_days(config.tolerance_days);

    let source: Box<dyn FingerprintSource> = match fields {
        Some(fields) => Box::new(StaticFingerprintSource::new(fields)),
        None => Box::new(SystemFingerprintSource::default()),
    };

    let result = verifier.verify_with_source(license, source.as_ref());
    match LicenseStatus::from(&result) {
        LicenseStatus::Valid => {
            println!("{}", LicenseStatus::Valid);
            Ok(())
        }
        status => {
            println!("{status}");
            let reason = result.err().map(|e| e.to_string()).unwrap_or_default();
            Err(anyhow!("license {status}: {reason}"))
        }
    }
}
