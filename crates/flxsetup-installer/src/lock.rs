use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use flxsetup_core::{InstallLayout, SetupError};

/// Advisory lock on an install root, held for the duration of a run.
/// Concurrent invocations against the same target fail fast instead of
/// interleaving mutations.
#[derive(Debug)]
pub struct SetupLock {
    path: PathBuf,
}

impl SetupLock {
    pub fn acquire(layout: &InstallLayout) -> Result<Self> {
        fs::create_dir_all(layout.root())
            .with_context(|| format!("failed to create {}", layout.root().display()))?;
        let path = layout.lock_path();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|contents| contents.trim().to_string())
                    .unwrap_or_default();
                Err(SetupError::LockHeld {
                    path,
                    holder: if holder.is_empty() {
                        "unknown".to_string()
                    } else {
                        holder
                    },
                }
                .into())
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to create lock {}", path.display()))
            }
        }
    }
}

impl Drop for SetupLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
