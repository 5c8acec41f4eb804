use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformPredicate {
    #[default]
    All,
    WindowsOnly,
    UnixOnly,
}

impl PlatformPredicate {
    pub fn matches(self, platform: Platform) -> bool {
        match self {
            Self::All => true,
            Self::WindowsOnly => platform.is_windows(),
            Self::UnixOnly => !platform.is_windows(),
        }
    }
}

/// One version-pinned package the payload application requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PackagePin {
    pub name: String,
    pub constraint: String,
    #[serde(default)]
    pub platform: PlatformPredicate,
    /// Must install from a prebuilt artifact; source builds are refused so
    /// users never need a local compiler toolchain.
    #[serde(default)]
    pub binary_only: bool,
}

impl PackagePin {
    /// The requirement string handed to the package-install command.
    pub fn requirement(&self) -> String {
        format!("{}{}", self.name, self.constraint)
    }
}

/// The fixed, ordered dependency set. No graph resolution happens here;
/// every entry must be installable in a single batched call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyManifest {
    #[serde(rename = "pin")]
    pub pins: Vec<PackagePin>,
}

impl DependencyManifest {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let manifest: Self =
            toml::from_str(input).context("failed to parse dependency manifest")?;
        let mut seen = HashSet::new();
        for pin in &manifest.pins {
            if pin.name.trim().is_empty() {
                return Err(anyhow!("dependency manifest contains an empty package name"));
            }
            if pin.constraint.trim().is_empty() {
                return Err(anyhow!(
                    "dependency '{}' has no version constraint",
                    pin.name
                ));
            }
            if !seen.insert(pin.name.to_ascii_lowercase()) {
                return Err(anyhow!(
                    "dependency '{}' is declared more than once",
                    pin.name
                ));
            }
        }
        Ok(manifest)
    }

    /// The manifest compiled into the installer.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(include_str!("../assets/manifest.toml"))
            .context("bundled dependency manifest is invalid")
    }

    /// Entries whose platform predicate admits `platform`, in manifest order.
    pub fn for_platform(&self, platform: Platform) -> Vec<&PackagePin> {
        self.pins
            .iter()
            .filter(|pin| pin.platform.matches(platform))
            .collect()
    }
}
