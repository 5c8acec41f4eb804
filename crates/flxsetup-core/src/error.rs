use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSyncCause {
    Permission,
    Io,
}

/// Fatal failure taxonomy. Carried inside `anyhow::Error` and downcast at
/// the CLI boundary so every diagnosis can print its remediation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// No compatible runtime found, even after the managed-install fallback.
    PrerequisiteMissing { range: String },
    /// The chosen target needs elevation and re-elevation was declined or
    /// failed.
    PrivilegeRequired { target: PathBuf },
    FileSync {
        cause: FileSyncCause,
        path: PathBuf,
        detail: String,
    },
    /// Environment creation or dependency install failed.
    Provision { detail: String },
    /// A binary-only dependency has no prebuilt artifact for the resolved
    /// runtime version. Distinct from `Provision` because the user can fix
    /// it without touching the installer.
    NoBinaryArtifact { package: String, runtime: String },
    /// Bootstrap fetch or managed-runtime download failed after retries.
    Network {
        operation: String,
        attempts: u32,
        detail: String,
    },
    /// Another installer invocation holds the advisory lock on this target.
    LockHeld { path: PathBuf, holder: String },
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrerequisiteMissing { range } => {
                write!(f, "no compatible Python runtime found (supported: {range})")
            }
            Self::PrivilegeRequired { target } => write!(
                f,
                "administrator privileges are required to install into {}",
                target.display()
            ),
            Self::FileSync {
                cause: FileSyncCause::Permission,
                path,
                detail,
            } => write!(
                f,
                "permission denied while writing {}: {detail}",
                path.display()
            ),
            Self::FileSync {
                cause: FileSyncCause::Io,
                path,
                detail,
            } => write!(f, "file copy failed at {}: {detail}", path.display()),
            Self::Provision { detail } => {
                write!(f, "failed to provision the runtime environment: {detail}")
            }
            Self::NoBinaryArtifact { package, runtime } => write!(
                f,
                "no prebuilt {package} artifact exists for Python {runtime}"
            ),
            Self::Network {
                operation,
                attempts,
                detail,
            } => write!(f, "{operation} failed after {attempts} attempts: {detail}"),
            Self::LockHeld { path, holder } => write!(
                f,
                "installation already in progress (lock held by process {holder} at {})",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SetupError {}

impl SetupError {
    /// A concrete action the user can take, printed after the diagnosis.
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::PrerequisiteMissing { range } => Some(format!(
                "install Python {range} from https://www.python.org/downloads/ and re-run the installer"
            )),
            Self::PrivilegeRequired { .. } => Some(
                "re-run the installer elevated (sudo on Linux, 'Run as administrator' on Windows), or choose the user-scoped location".to_string(),
            ),
            Self::FileSync {
                cause: FileSyncCause::Permission,
                ..
            } => Some(
                "the chosen location needs elevation; re-run the installer as administrator".to_string(),
            ),
            Self::FileSync {
                cause: FileSyncCause::Io,
                ..
            } => Some("check free disk space and that the drive is writable".to_string()),
            Self::NoBinaryArtifact { .. } => Some(format!(
                "use a Python version within {}; newer interpreters have no prebuilt wheels yet",
                crate::RuntimeRange::supported()
            )),
            Self::Network { .. } => {
                Some("check your network connection and re-run the installer".to_string())
            }
            Self::LockHeld { .. } => Some(
                "wait for the other installer to finish, or delete the lock file if it is stale".to_string(),
            ),
            Self::Provision { .. } => None,
        }
    }
}
