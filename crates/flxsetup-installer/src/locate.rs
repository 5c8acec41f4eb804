use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use semver::Version;

use flxsetup_core::{parse_version_output, RuntimeCandidate, RuntimeRange, SetupError};

use crate::net;
use crate::platform::{ManagedRuntime, PlatformAdapter};
use crate::runner::{run_checked, CommandRunner};

/// Asks one candidate for its version. Probe failures (missing executable,
/// garbage output) disqualify the candidate silently; they are the normal
/// way to discover a candidate is absent.
pub fn probe_version(runner: &dyn CommandRunner, candidate: &str) -> Option<Version> {
    let output = runner
        .run(Command::new(candidate).arg("--version"))
        .ok()
        .filter(|output| output.success)?;
    // Python 2 printed its version to stderr; probe both streams.
    parse_version_output(output.stdout.trim())
        .or_else(|| parse_version_output(output.stderr.trim()))
}

/// Probes candidates in priority order; the first whose version lies inside
/// the inclusive range wins. No scoring across acceptable candidates.
pub fn locate_runtime(
    runner: &dyn CommandRunner,
    candidates: &[String],
    range: &RuntimeRange,
) -> Option<RuntimeCandidate> {
    for candidate in candidates {
        let Some(version) = probe_version(runner, candidate) else {
            continue;
        };
        if range.contains(&version) {
            return Some(RuntimeCandidate {
                command: candidate.clone(),
                version,
            });
        }
    }
    None
}

/// Locates an acceptable runtime, falling back to the platform's managed
/// runtime install (silent, user-scoped) where one is configured, then
/// re-probing. Exhaustion is fatal with a remediation link.
pub fn ensure_runtime(
    runner: &dyn CommandRunner,
    adapter: &dyn PlatformAdapter,
    range: &RuntimeRange,
) -> Result<RuntimeCandidate> {
    ensure_runtime_with_fetcher(runner, adapter, range, net::fetch_over_http)
}

pub(crate) fn ensure_runtime_with_fetcher(
    runner: &dyn CommandRunner,
    adapter: &dyn PlatformAdapter,
    range: &RuntimeRange,
    fetch: impl Fn(&str, &Path) -> Result<()>,
) -> Result<RuntimeCandidate> {
    let candidates = adapter.runtime_candidates();
    if let Some(found) = locate_runtime(runner, &candidates, range) {
        return Ok(found);
    }
    if let Some(managed) = adapter.managed_runtime() {
        install_managed_runtime(runner, &managed, fetch)?;
        if let Some(found) = locate_runtime(runner, &candidates, range) {
            return Ok(found);
        }
    }
    Err(SetupError::PrerequisiteMissing {
        range: range.to_string(),
    }
    .into())
}

fn install_managed_runtime(
    runner: &dyn CommandRunner,
    managed: &ManagedRuntime,
    fetch: impl Fn(&str, &Path) -> Result<()>,
) -> Result<()> {
    let staging = std::env::temp_dir().join(format!(
        "flx4setup-runtime-{}-{}",
        std::process::id(),
        crate::unique_nanos()
    ));
    let installer = staging.join(&managed.file_name);
    net::download_with_retry_using(fetch, &managed.url, &installer, net::DOWNLOAD_ATTEMPTS)?;
    let result = run_checked(
        runner,
        Command::new(&installer).args(&managed.silent_args),
        "silent runtime install failed",
    );
    let _ = fs::remove_dir_all(&staging);
    result.map(drop)
}
