use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use flxsetup_core::ENTRY_POINT;

use crate::net;
use crate::runner::{run_checked, CommandRunner};

/// Pinned source archive for the bootstrap path. A single downloaded
/// installer binary with no source tree beside it fetches exactly this
/// release.
pub const SOURCE_ARCHIVE_URL: &str =
    "https://github.com/flx4control/flx4control/archive/refs/tags/v1.4.2.tar.gz";
pub const SOURCE_ARCHIVE_SHA256: &str =
    "8c7b5f2e04c1a9d3b6e8f0a2c4d6e8f0a2c4d6e8f0a2c4d6e8f0a2c4d6e8f0a2";

/// Where the payload source tree for this run lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTree {
    /// The installer sits inside a full checkout/installed copy.
    Local(PathBuf),
    /// The installer was an ephemeral download; the tree was fetched.
    Fetched(PathBuf),
}

impl SourceTree {
    pub fn dir(&self) -> &Path {
        match self {
            Self::Local(dir) | Self::Fetched(dir) => dir,
        }
    }
}

/// The entry point beside the running artifact is the marker for a full
/// source tree.
pub fn needs_bootstrap(exe_dir: &Path) -> bool {
    !exe_dir.join(ENTRY_POINT).is_file()
}

/// Resolves the source tree for this run. When the marker is absent the
/// pinned archive is fetched, verified, and extracted, and the rest of the
/// installer continues from the extracted tree; nothing afterwards refers
/// back to the ephemeral download location.
pub fn resolve_source_tree(runner: &dyn CommandRunner, exe_dir: &Path) -> Result<SourceTree> {
    if !needs_bootstrap(exe_dir) {
        return Ok(SourceTree::Local(exe_dir.to_path_buf()));
    }

    let staging = std::env::temp_dir().join(format!(
        "flx4setup-bootstrap-{}-{}",
        std::process::id(),
        crate::unique_nanos()
    ));
    let archive = staging.join("source.tar.gz");
    net::download_with_retry(SOURCE_ARCHIVE_URL, &archive, net::DOWNLOAD_ATTEMPTS)?;
    net::verify_sha256(&archive, SOURCE_ARCHIVE_SHA256)?;

    let extracted = staging.join("tree");
    fs::create_dir_all(&extracted)
        .with_context(|| format!("failed to create {}", extracted.display()))?;
    extract_archive(runner, &archive, &extracted)?;
    let _ = fs::remove_file(&archive);

    let root = first_top_level_dir(&extracted)?;
    if !root.join(ENTRY_POINT).is_file() {
        return Err(anyhow!(
            "fetched source archive has no {ENTRY_POINT} under {}",
            root.display()
        ));
    }
    Ok(SourceTree::Fetched(root))
}

/// Release archives wrap their contents in one versioned directory; find it.
pub(crate) fn first_top_level_dir(dir: &Path) -> Result<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs.into_iter()
        .next()
        .ok_or_else(|| anyhow!("extracted archive contains no directory"))
}

pub(crate) fn extract_archive(
    runner: &dyn CommandRunner,
    archive: &Path,
    dest: &Path,
) -> Result<()> {
    if archive.extension().and_then(|ext| ext.to_str()) == Some("zip") {
        if cfg!(windows) {
            let mut command = Command::new("powershell");
            command.arg("-NoProfile").arg("-Command").arg(format!(
                "Expand-Archive -LiteralPath '{}' -DestinationPath '{}' -Force",
                archive.display().to_string().replace('\'', "''"),
                dest.display().to_string().replace('\'', "''")
            ));
            return run_checked(runner, &mut command, "failed to extract zip archive").map(drop);
        }
        let mut command = Command::new("unzip");
        command.arg("-q").arg(archive).arg("-d").arg(dest);
        return run_checked(runner, &mut command, "failed to extract zip archive").map(drop);
    }

    run_checked(
        runner,
        Command::new("tar").arg("-xf").arg(archive).arg("-C").arg(dest),
        "failed to extract source archive",
    )
    .map(drop)
}
