use std::path::{Path, PathBuf};

use crate::platform::Platform;
use crate::{APP_DISPLAY_NAME, ENTRY_POINT};

pub const VENV_DIR_NAME: &str = ".venv";
pub const LOCK_FILE_NAME: &str = ".setup.lock";

/// Path projections for one install root. Pure; nothing here touches the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_point(&self) -> PathBuf {
        self.root.join(ENTRY_POINT)
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.root.join(VENV_DIR_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    pub fn venv_python(&self, platform: Platform) -> PathBuf {
        if platform.is_windows() {
            self.venv_dir().join("Scripts").join("python.exe")
        } else {
            self.venv_dir().join("bin").join("python")
        }
    }

    /// Windowless interpreter for launcher artifacts; only Windows ships a
    /// separate executable for this.
    pub fn venv_pythonw(&self, platform: Platform) -> PathBuf {
        if platform.is_windows() {
            self.venv_dir().join("Scripts").join("pythonw.exe")
        } else {
            self.venv_python(platform)
        }
    }

    pub fn launcher_path(&self, platform: Platform) -> PathBuf {
        if platform.is_windows() {
            self.root.join(format!("{APP_DISPLAY_NAME}.bat"))
        } else {
            // Not plain "flx4control": that name is taken by the payload's
            // package directory.
            self.root.join("flx4control.sh")
        }
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.root.join(format!("{APP_DISPLAY_NAME}.app"))
    }

    pub fn icon_path(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Linux => self.root.join("icon.png"),
            Platform::Macos => self.root.join("icon.icns"),
            Platform::Windows => self.root.join("icon.ico"),
        }
    }

    pub fn icon_generator(&self) -> PathBuf {
        self.root.join("generate_icon.py")
    }
}
