use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use flxsetup_core::{FileSyncCause, InstallLayout, SetupError, APP_DISPLAY_NAME};

/// Transient directories never copied into, and never wiped from, an
/// install root.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".venv",
    "venv",
    "__pycache__",
    ".git",
    ".mypy_cache",
    ".pytest_cache",
    "build",
    "dist",
];

/// Names the synchronizer refuses to touch in either direction: the
/// disposable environment, caches, VCS metadata, the advisory lock, and
/// artifacts the integration generator owns.
pub(crate) fn excluded(name: &str) -> bool {
    if EXCLUDED_DIRS.contains(&name) {
        return true;
    }
    if name == flxsetup_core::LOCK_FILE_NAME || name == "flx4control.sh" {
        return true;
    }
    if name == format!("{APP_DISPLAY_NAME}.app") || name == format!("{APP_DISPLAY_NAME}.bat") {
        return true;
    }
    name.ends_with(".pyc") || name.ends_with(".log")
}

/// Mirrors the source tree into the install root with full-overwrite
/// semantics: existing destination entries outside the deny-list are
/// removed first so no stale file survives a downgrade. When source and
/// destination are the same canonical path this is a no-op (self-hosted
/// re-run).
pub fn sync_tree(source: &Path, layout: &InstallLayout) -> Result<()> {
    let dest = layout.root();
    fs::create_dir_all(dest).map_err(|err| classify(err, dest))?;

    let source_canon = source
        .canonicalize()
        .with_context(|| format!("source tree {} is not readable", source.display()))?;
    let dest_canon = dest.canonicalize().map_err(|err| classify(err, dest))?;
    if source_canon == dest_canon {
        return Ok(());
    }

    wipe_destination(&dest_canon)?;
    copy_filtered(&source_canon, &dest_canon)
}

fn wipe_destination(dest: &Path) -> Result<()> {
    for entry in fs::read_dir(dest).map_err(|err| classify(err, dest))? {
        let entry = entry.map_err(|err| classify(err, dest))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if excluded(&name) {
            continue;
        }
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).map_err(|err| classify(err, &path))?;
        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|err| classify(err, &path))?;
    }
    Ok(())
}

fn copy_filtered(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|err| classify(err, dst))?;
    for entry in fs::read_dir(src).map_err(|err| classify(err, src))? {
        let entry = entry.map_err(|err| classify(err, src))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if excluded(&name) {
            continue;
        }
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&src_path).map_err(|err| classify(err, &src_path))?;

        if metadata.is_dir() {
            copy_filtered(&src_path, &dst_path)?;
            continue;
        }

        #[cfg(unix)]
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&src_path).map_err(|err| classify(err, &src_path))?;
            std::os::unix::fs::symlink(&target, &dst_path)
                .map_err(|err| classify(err, &dst_path))?;
            continue;
        }

        fs::copy(&src_path, &dst_path).map_err(|err| classify(err, &dst_path))?;
    }
    Ok(())
}

/// Maps an I/O failure into the sync error taxonomy so the message can
/// distinguish "needs elevation" from "disk error".
pub(crate) fn classify(err: io::Error, path: &Path) -> anyhow::Error {
    let cause = if err.kind() == io::ErrorKind::PermissionDenied {
        FileSyncCause::Permission
    } else {
        FileSyncCause::Io
    };
    SetupError::FileSync {
        cause,
        path: path.to_path_buf(),
        detail: err.to_string(),
    }
    .into()
}
