use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Install-location selector exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
    User,
    System,
}

impl InstallScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            _ => Err(anyhow!("invalid install scope: {value}")),
        }
    }
}

/// A canonical (directory, privilege-requirement) pair the installer can
/// provision into. Immutable once chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub root: PathBuf,
    pub scope: InstallScope,
    pub requires_elevation: bool,
    pub is_default: bool,
}
