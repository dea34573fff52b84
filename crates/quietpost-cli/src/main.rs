//! quietpost command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Print this identity's public key (created on first use)
//! quietpost --store alice.redb public-key > alice.jwk
//!
//! # Encrypt for bob with his published key (v2), or without it (legacy)
//! quietpost --store alice.redb encrypt --me alice --peer bob --peer-key bob.jwk "hi bob"
//!
//! # Decrypt a message from alice
//! quietpost --store bob.redb decrypt --me bob --peer alice --peer-key alice.jwk "v2:..."
//!
//! # Check whether text looks like an envelope
//! quietpost inspect "AAECAwQFBgcICQoLZVsPPDu1gAvghptmNsAEtzHVo11g"
//! ```

use std::{
    error::Error,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use quietpost_core::{ConversationId, E2eClient, Environment, KeyValueStore, RedbStore, SystemEnv};
use quietpost_crypto::{PublicKey, decode_public_key, is_likely_encrypted};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// quietpost end-to-end message encryption
#[derive(Parser, Debug)]
#[command(name = "quietpost")]
#[command(about = "End-to-end encryption for quietpost direct messages")]
#[command(version)]
struct Args {
    /// Key store database (created if missing)
    #[arg(long, default_value = "quietpost.redb")]
    store: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print this identity's public key as JWK
    PublicKey,

    /// Encrypt a message for a conversation
    Encrypt {
        #[command(flatten)]
        conversation: ConversationArgs,

        /// Message text
        text: String,
    },

    /// Decrypt a message from a conversation
    Decrypt {
        #[command(flatten)]
        conversation: ConversationArgs,

        /// Envelope text
        envelope: String,
    },

    /// Report whether text looks encrypted
    Inspect {
        /// Text to inspect
        text: String,
    },
}

#[derive(clap::Args, Debug)]
struct ConversationArgs {
    /// Local user id
    #[arg(long)]
    me: String,

    /// Peer user id
    #[arg(long)]
    peer: String,

    /// File holding the peer's public JWK. Without it messages use the
    /// legacy scheme.
    #[arg(long)]
    peer_key: Option<PathBuf>,
}

impl ConversationArgs {
    fn conversation(&self) -> ConversationId {
        ConversationId::between(&self.me, &self.peer)
    }

    fn peer_key(&self) -> Result<Option<PublicKey>, Box<dyn Error>> {
        self.peer_key.as_deref().map(read_public_key).transpose()
    }
}

fn read_public_key(path: &Path) -> Result<PublicKey, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(decode_public_key(text.trim())?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();

    // Inspecting needs no identity; don't create a key store for it
    if let Command::Inspect { text } = &args.command {
        return inspect(text, &mut out);
    }

    tracing::debug!("Opening key store at {}", args.store.display());
    let store = RedbStore::open(&args.store)?;
    let client = E2eClient::open(store, SystemEnv::new())?;

    execute(&args.command, &client, &mut out)
}

fn execute<S: KeyValueStore, E: Environment>(
    command: &Command,
    client: &E2eClient<S, E>,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::PublicKey => writeln!(out, "{}", client.public_key_jwk())?,
        Command::Encrypt { conversation, text } => {
            let peer_key = conversation.peer_key()?;
            if peer_key.is_none() {
                tracing::warn!("No peer key given - encrypting with the legacy scheme");
            }

            let envelope = client.encrypt(text, &conversation.conversation(), peer_key.as_ref());
            writeln!(out, "{envelope}")?;
        },
        Command::Decrypt { conversation, envelope } => {
            let peer_key = conversation.peer_key()?;
            let outcome =
                client.decrypt(envelope.trim(), &conversation.conversation(), peer_key.as_ref());
            writeln!(out, "{}", outcome.display_text())?;
        },
        Command::Inspect { text } => inspect(text, out)?,
    }

    Ok(())
}

fn inspect(text: &str, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let verdict = if is_likely_encrypted(text) { "encrypted" } else { "plaintext" };
    writeln!(out, "{verdict}")?;
    Ok(())
}
