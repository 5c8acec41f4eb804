use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use semver::Version;

use flxsetup_core::{
    DependencyManifest, InstallLayout, PackagePin, Platform, RuntimeCandidate, SetupError,
};

use crate::runner::{CommandOutput, CommandRunner};

/// Destroys any existing isolated environment at the target and recreates
/// it from scratch, then installs the platform-filtered manifest in one
/// batched call. Never upgrades in place: a dependency-set change across
/// versions must not leave orphaned packages behind.
pub fn provision(
    runner: &dyn CommandRunner,
    layout: &InstallLayout,
    runtime: &RuntimeCandidate,
    manifest: &DependencyManifest,
    platform: Platform,
) -> Result<()> {
    let venv = layout.venv_dir();
    if venv.exists() {
        fs::remove_dir_all(&venv)
            .with_context(|| format!("failed to remove old environment {}", venv.display()))?;
    }

    let created = runner
        .run(Command::new(&runtime.command).arg("-m").arg("venv").arg(&venv))
        .context("environment creation failed to start")?;
    if !created.success {
        return Err(SetupError::Provision {
            detail: format!("environment creation failed: {}", failure_line(&created)),
        }
        .into());
    }

    let python = layout.venv_python(platform);

    let pip_upgrade = runner
        .run(
            Command::new(&python)
                .arg("-m")
                .arg("pip")
                .arg("install")
                .arg("--upgrade")
                .arg("pip"),
        )
        .context("pip upgrade failed to start")?;
    if !pip_upgrade.success {
        return Err(SetupError::Provision {
            detail: format!("pip upgrade failed: {}", failure_line(&pip_upgrade)),
        }
        .into());
    }

    let pins = manifest.for_platform(platform);
    let installed = runner
        .run(Command::new(&python).args(pip_install_args(&pins)))
        .context("dependency install failed to start")?;
    if !installed.success {
        return Err(classify_pip_failure(&pins, &runtime.version, &installed).into());
    }
    Ok(())
}

/// One batched install call for the whole filtered manifest. Binary-only
/// pins carry an `--only-binary` constraint so a missing wheel fails
/// instead of falling through to a source build.
pub(crate) fn pip_install_args(pins: &[&PackagePin]) -> Vec<String> {
    let mut args: Vec<String> = ["-m", "pip", "install", "--no-input"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for pin in pins.iter().filter(|pin| pin.binary_only) {
        args.push("--only-binary".to_string());
        args.push(pin.name.clone());
    }
    for pin in pins {
        args.push(pin.requirement());
    }
    args
}

/// Distinguishes "no prebuilt artifact for this runtime" on a binary-only
/// pin from every other install failure; the former is recoverable by the
/// user without re-running installer internals.
pub(crate) fn classify_pip_failure(
    pins: &[&PackagePin],
    runtime_version: &Version,
    output: &CommandOutput,
) -> SetupError {
    let transcript = format!("{}\n{}", output.stdout, output.stderr).to_ascii_lowercase();
    for pin in pins.iter().filter(|pin| pin.binary_only) {
        let name = pin.name.to_ascii_lowercase();
        let no_distribution =
            transcript.contains(&format!("no matching distribution found for {name}"));
        let no_satisfying = transcript
            .contains("could not find a version that satisfies the requirement")
            && transcript.contains(&name);
        if no_distribution || no_satisfying {
            return SetupError::NoBinaryArtifact {
                package: pin.name.clone(),
                runtime: runtime_version.to_string(),
            };
        }
    }
    SetupError::Provision {
        detail: format!("dependency install failed: {}", failure_line(output)),
    }
}

fn failure_line(output: &CommandOutput) -> String {
    output
        .stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output")
        .to_string()
}
