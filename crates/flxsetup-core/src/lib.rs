mod error;
mod layout;
mod manifest;
mod platform;
mod runtime;
mod target;

pub use error::{FileSyncCause, SetupError};
pub use layout::{InstallLayout, LOCK_FILE_NAME, VENV_DIR_NAME};
pub use manifest::{DependencyManifest, PackagePin, PlatformPredicate};
pub use platform::Platform;
pub use runtime::{parse_version_output, RuntimeCandidate, RuntimeRange};
pub use target::{InstallScope, InstallTarget};

/// Display name used for launchers, shortcuts, and the macOS bundle.
pub const APP_DISPLAY_NAME: &str = "FLX4 Control";

/// Directory name of the payload's per-user settings/sounds location.
/// Owned by the application, never by the installer.
pub const USER_DATA_DIR_NAME: &str = "flx4control";

/// Marker file that distinguishes a full source tree from an ephemeral
/// single-file download.
pub const ENTRY_POINT: &str = "main.py";

#[cfg(test)]
mod tests;
