mod bootstrap;
mod integrate;
mod locate;
mod lock;
mod net;
mod platform;
mod provision;
mod runner;
mod sync;
mod uninstall;

pub use bootstrap::{
    needs_bootstrap, resolve_source_tree, SourceTree, SOURCE_ARCHIVE_SHA256, SOURCE_ARCHIVE_URL,
};
pub use integrate::{generate_integration, remove_integration, IntegrationReport};
pub use locate::{ensure_runtime, locate_runtime, probe_version};
pub use lock::SetupLock;
pub use net::{download_with_retry, verify_sha256, DOWNLOAD_ATTEMPTS};
pub use platform::{
    host_adapter, LinuxAdapter, MacosAdapter, ManagedRuntime, PlatformAdapter, ShortcutSpec,
    WindowsAdapter, MACOS_LSREGISTER_PATH,
};
pub use provision::provision;
pub use runner::{render_command, run_checked, CommandOutput, CommandRunner, ProcessRunner};
pub use sync::{sync_tree, EXCLUDED_DIRS};
pub use uninstall::{
    locate_existing_install, remove_install_root, remove_user_data, UninstallOutcome,
    UninstallStatus,
};

/// Suffix for temp staging directories so concurrent runs never collide.
pub(crate) fn unique_nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default()
}
