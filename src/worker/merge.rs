//! Ordered merge of intermediate artifacts.
//!
//! Runs only after the dispatcher has joined every worker, so each artifact
//! is complete before its first read. The chunk-0 artifact becomes the
//! accumulator; artifacts `1..count` are appended in ascending index order
//! and deleted as they are consumed. The accumulator is then renamed to the
//! caller's output path, an atomic operation where the platform permits it.
//! Output byte order therefore equals chunk order regardless of the order in
//! which workers actually finished.

use std::path::Path;

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::worker::artifact::ArtifactSet;

pub async fn merge(artifacts: &ArtifactSet, chunk_count: u64, output: &Path) -> Result<()> {
    let accumulator_path = artifacts.path(0);
    let accumulator = OpenOptions::new().append(true).open(&accumulator_path).await?;
    let mut writer = BufWriter::new(accumulator);

    for index in 1..chunk_count {
        let path = artifacts.path(index);
        let mut part = fs::File::open(&path).await?;
        tokio::io::copy(&mut part, &mut writer).await?;
        fs::remove_file(&path).await?;
    }

    writer.flush().await?;
    drop(writer);

    fs::rename(&accumulator_path, output).await?;
    Ok(())
}
