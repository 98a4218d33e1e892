use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::file;
use crate::keys::{PrivateKey, PublicKey};
use crate::processor::{Options, Processor};
use crate::types::Mode;

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a file under an RSA public key.
    Encrypt {
        /// Input file path.
        #[arg(short, long)]
        input: PathBuf,

        /// PEM-encoded RSA public key file.
        #[arg(short, long)]
        key: PathBuf,

        /// Output file path (defaults to the input with ".clk" appended).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Plaintext chunk size in bytes (default 40 MiB).
        #[arg(short, long)]
        chunk_size: Option<u64>,

        /// Number of parallel workers (defaults to the available cores).
        #[arg(short, long)]
        jobs: Option<i64>,

        /// Per-worker timeout in seconds (no timeout by default).
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Decrypt a file under the paired RSA private key.
    Decrypt {
        /// Input file path.
        #[arg(short, long)]
        input: PathBuf,

        /// PEM-encoded RSA private key file.
        #[arg(short, long)]
        key: PathBuf,

        /// Output file path (defaults to the input without ".clk").
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of parallel workers (defaults to the available cores).
        #[arg(short, long)]
        jobs: Option<i64>,

        /// Per-worker timeout in seconds (no timeout by default).
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

#[derive(Parser)]
#[command(name = "chunklock", version = "1.2.0", about = "Encrypt large files in parallel chunks: RSA-wrapped session keys, one authenticated envelope per chunk.")]
pub struct App {
    #[command(subcommand)]
    command: Commands,
}

impl App {
    pub fn init() -> Result<Self> {
        let subscriber = tracing_subscriber::fmt().with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(Self::parse())
    }

    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Encrypt { input, key, output, chunk_size, jobs, timeout } => {
                let options = Options::new(chunk_size, jobs, timeout.map(Duration::from_secs))?;
                let output = match output {
                    Some(path) => path,
                    None => file::derive_output_path(&input, Mode::Encrypt)?,
                };
                let key = PublicKey::load(&key)?;

                Processor::new(options).encrypt(&input, &output, &key).await.with_context(|| format!("encrypt failed: {}", input.display()))?;

                crate::ui::show_success(Mode::Encrypt, &output);
                Ok(())
            }
            Commands::Decrypt { input, key, output, jobs, timeout } => {
                let options = Options::new(None, jobs, timeout.map(Duration::from_secs))?;
                let output = match output {
                    Some(path) => path,
                    None => file::derive_output_path(&input, Mode::Decrypt)?,
                };
                let key = PrivateKey::load(&key)?;

                Processor::new(options).decrypt(&input, &output, &key).await.with_context(|| format!("decrypt failed: {}", input.display()))?;

                crate::ui::show_success(Mode::Decrypt, &output);
                Ok(())
            }
        }
    }
}
