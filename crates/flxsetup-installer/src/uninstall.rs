use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use flxsetup_core::{InstallLayout, InstallTarget};

use crate::platform::PlatformAdapter;
use crate::sync::classify;

/// "Not installed" is an answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallStatus {
    NotInstalled,
    Cancelled,
    Removed,
}

impl UninstallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInstalled => "not-installed",
            Self::Cancelled => "cancelled",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub status: UninstallStatus,
    pub root: Option<PathBuf>,
    pub user_data_removed: bool,
    pub warnings: Vec<String>,
}

impl UninstallOutcome {
    pub fn not_installed() -> Self {
        Self {
            status: UninstallStatus::NotInstalled,
            root: None,
            user_data_removed: false,
            warnings: Vec::new(),
        }
    }
}

/// Probes the canonical targets for an existing installation, identified by
/// the payload entry point at the target root.
pub fn locate_existing_install(adapter: &dyn PlatformAdapter) -> Option<InstallTarget> {
    adapter
        .default_install_targets()
        .into_iter()
        .find(|target| InstallLayout::new(&target.root).entry_point().is_file())
}

pub fn remove_install_root(layout: &InstallLayout) -> Result<()> {
    fs::remove_dir_all(layout.root()).map_err(|err| classify(err, layout.root()))
}

/// Deletes the payload's settings/sounds directory. Only ever called after
/// the uninstall flow's explicit opt-in.
pub fn remove_user_data(adapter: &dyn PlatformAdapter) -> Result<bool> {
    let dir = adapter.user_data_dir();
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&dir).map_err(|err| classify(err, &dir))?;
    Ok(true)
}
