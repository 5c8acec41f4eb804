use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use flxsetup_core::SetupError;
use sha2::{Digest, Sha256};

/// Transient network operations get a fixed small number of attempts
/// instead of a timeout; latency here is the only user-uncontrolled part
/// of a run.
pub const DOWNLOAD_ATTEMPTS: u32 = 3;

pub fn download_with_retry(url: &str, dest: &Path, attempts: u32) -> Result<()> {
    download_with_retry_using(fetch_over_http, url, dest, attempts)
}

/// Retry loop over an injectable fetcher. The payload lands in a `.part`
/// sibling and is renamed into place only after a fully successful fetch.
pub(crate) fn download_with_retry_using(
    fetch: impl Fn(&str, &Path) -> Result<()>,
    url: &str,
    dest: &Path,
    attempts: u32,
) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let part = dest.with_file_name(format!(
        "{}.part",
        dest.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("download")
    ));

    let mut last_error = None;
    for _ in 0..attempts.max(1) {
        match fetch(url, &part) {
            Ok(()) => {
                if dest.exists() {
                    fs::remove_file(dest)
                        .with_context(|| format!("failed to replace {}", dest.display()))?;
                }
                fs::rename(&part, dest)
                    .with_context(|| format!("failed to move download into {}", dest.display()))?;
                return Ok(());
            }
            Err(err) => {
                let _ = fs::remove_file(&part);
                last_error = Some(err);
            }
        }
    }

    let detail = last_error
        .map(|err| format!("{err:#}"))
        .unwrap_or_else(|| "no attempts were made".to_string());
    Err(SetupError::Network {
        operation: format!("download of {url}"),
        attempts: attempts.max(1),
        detail,
    }
    .into())
}

pub(crate) fn fetch_over_http(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("request to {url} was refused"))?;
    let mut reader = response;
    let mut file =
        fs::File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    std::io::copy(&mut reader, &mut file)
        .with_context(|| format!("failed writing {}", dest.display()))?;
    Ok(())
}

pub fn verify_sha256(path: &Path, expected_hex: &str) -> Result<()> {
    let mut file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("failed reading {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    let actual = hex::encode(hasher.finalize());
    if actual.eq_ignore_ascii_case(expected_hex) {
        return Ok(());
    }
    Err(anyhow!(
        "checksum mismatch for {}: expected {expected_hex}, got {actual}",
        path.display()
    ))
}
