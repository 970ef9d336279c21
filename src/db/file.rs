use anyhow::{anyhow, ensure, Context as _, Result};
use crc::{Crc, CRC_32_BZIP2};
use std::path::{Path, PathBuf};

use super::{crypto::Cipher, database::DatabaseV1, Database};

const MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024 * 1024;

fn crc() -> Crc<u32> {
    Crc::<u32>::new(&CRC_32_BZIP2)
}

/// Returns Ok(None) if the db file doesn't exist yet
pub async fn load(path: &Path, cipher: &impl Cipher) -> Result<Option<DatabaseV1>> {
    log::info!("Loading database...");
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }

    let content_ciphertext = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content_plaintext = cipher.decrypt(&content_ciphertext)?;
    let content_decompressed = zstd::bulk::decompress(&content_plaintext, MAX_DECOMPRESSED_SIZE)?;
    let crc = crc();
    let (parsed, remaining): (Database, &[u8]) =
        postcard::take_from_bytes_crc32(&content_decompressed, crc.digest())?;
    let Database::V1(database) = parsed;
    ensure!(remaining.is_empty(), "File had extra bytes");

    log::info!("Loading database...done");

    Ok(Some(database))
}

pub async fn save(db: &DatabaseV1, path: &Path, cipher: &impl Cipher) -> Result<()> {
    let tmppath = stage(db, path, cipher).await?;
    publish(&tmppath, path).await
}

/// Write the database to a temporary file next to `path`. Nothing is visible at `path` until [publish] is called.
pub async fn stage(db: &DatabaseV1, path: &Path, cipher: &impl Cipher) -> Result<PathBuf> {
    log::info!("Saving database...");

    let crc = crc();
    let content_plaintext = postcard::to_stdvec_crc32(&Database::V1(db.clone()), crc.digest())?;
    let content_compressed = zstd::bulk::compress(&content_plaintext, zstd::DEFAULT_COMPRESSION_LEVEL)?;
    let content_ciphertext = cipher.encrypt(&content_compressed)?;

    let tmppath = temp_path(path)?;
    tokio::fs::write(&tmppath, content_ciphertext)
        .await
        .with_context(|| format!("Failed to write {}", tmppath.display()))?;
    Ok(tmppath)
}

/// Atomically replace the database at `path` with a file written by [stage].
pub async fn publish(tmppath: &Path, path: &Path) -> Result<()> {
    tokio::fs::rename(tmppath, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    log::info!("Saving database...done");

    Ok(())
}

/// Remove a file left behind by an abandoned [stage].
pub async fn discard(path: &Path) {
    let Ok(tmppath) = temp_path(path) else {
        return;
    };
    if let Err(err) = tokio::fs::remove_file(&tmppath).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove {}: {err}", tmppath.display());
        }
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let filename = path
        .file_name()
        .ok_or_else(|| anyhow!("Path has no filename"))?
        .to_str()
        .ok_or_else(|| anyhow!("Filename isn't valid utf-8"))?;
    Ok(path.with_file_name(format!("{}.temp", filename)))
}
