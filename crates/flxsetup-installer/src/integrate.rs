use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use flxsetup_core::{InstallLayout, Platform, APP_DISPLAY_NAME};

use crate::platform::{PlatformAdapter, ShortcutSpec};
use crate::runner::CommandRunner;

/// What the generator produced. Shortcut and icon problems are warnings,
/// not failures; only the launcher itself is load-bearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationReport {
    pub launcher: PathBuf,
    pub icon: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Emits the launcher artifact, an optional icon, the macOS bundle, and a
/// desktop-visible shortcut pointing at the provisioned runtime and entry
/// point.
pub fn generate_integration(
    runner: &dyn CommandRunner,
    adapter: &dyn PlatformAdapter,
    layout: &InstallLayout,
) -> Result<IntegrationReport> {
    let platform = adapter.platform();
    let mut warnings = Vec::new();

    let launcher = write_launcher(layout, platform)?;

    let icon = match generate_icon(runner, layout, platform) {
        Ok(icon) => icon,
        Err(err) => {
            warnings.push(format!("icon generation failed: {err:#}"));
            None
        }
    };

    let bundle = if platform == Platform::Macos {
        match write_bundle(layout, icon.as_deref()) {
            Ok(bundle) => Some(bundle),
            Err(err) => {
                warnings.push(format!("application bundle creation failed: {err:#}"));
                None
            }
        }
    } else {
        None
    };

    let spec = ShortcutSpec {
        launcher: launcher.clone(),
        working_dir: layout.root().to_path_buf(),
        display_name: APP_DISPLAY_NAME.to_string(),
        icon: icon.clone(),
        bundle,
    };
    if let Err(err) = adapter.make_shortcut(&spec) {
        warnings.push(format!("desktop shortcut creation failed: {err:#}"));
    }

    Ok(IntegrationReport {
        launcher,
        icon,
        warnings,
    })
}

fn write_launcher(layout: &InstallLayout, platform: Platform) -> Result<PathBuf> {
    let path = layout.launcher_path(platform);
    if platform.is_windows() {
        let contents =
            render_windows_launcher(&layout.venv_pythonw(platform), &layout.entry_point());
        fs::write(&path, contents)
            .with_context(|| format!("failed to write launcher {}", path.display()))?;
    } else {
        let contents = render_unix_launcher(&layout.venv_python(platform), &layout.entry_point());
        write_executable(&path, &contents)?;
    }
    Ok(path)
}

pub(crate) fn render_unix_launcher(python: &Path, entry: &Path) -> String {
    format!(
        "#!/bin/sh\nexec \"{}\" \"{}\" \"$@\"\n",
        python.display(),
        entry.display()
    )
}

/// `start` detaches the interpreter and pythonw keeps it windowless.
pub(crate) fn render_windows_launcher(pythonw: &Path, entry: &Path) -> String {
    format!(
        "@echo off\r\nstart \"\" \"{}\" \"{}\" %*\r\n",
        pythonw.display(),
        entry.display()
    )
}

/// Runs the payload's own icon generator against the install root.
/// Best-effort: a missing generator or a failed run just means no custom
/// icon.
fn generate_icon(
    runner: &dyn CommandRunner,
    layout: &InstallLayout,
    platform: Platform,
) -> Result<Option<PathBuf>> {
    let generator = layout.icon_generator();
    if !generator.is_file() {
        return Ok(None);
    }
    let python = layout.venv_python(platform);
    let output = runner
        .run(
            Command::new(&python)
                .arg(&generator)
                .arg(layout.root()),
        )
        .context("icon generator failed to start")?;
    if !output.success {
        return Ok(None);
    }
    let icon = layout.icon_path(platform);
    Ok(icon.is_file().then_some(icon))
}

/// Self-describing bundle whose executable shim resolves the real install
/// directory relative to its own physical location, so the same bundle
/// works beside a source checkout and inside the final install dir.
fn write_bundle(layout: &InstallLayout, icon: Option<&Path>) -> Result<PathBuf> {
    let bundle = layout.bundle_path();
    let contents_dir = bundle.join("Contents");
    let macos_dir = contents_dir.join("MacOS");
    let resources_dir = contents_dir.join("Resources");
    for dir in [&macos_dir, &resources_dir] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let plist_path = contents_dir.join("Info.plist");
    fs::write(&plist_path, render_info_plist())
        .with_context(|| format!("failed to write {}", plist_path.display()))?;

    let shim_path = macos_dir.join(APP_DISPLAY_NAME);
    write_executable(&shim_path, &render_bundle_shim())?;

    if let Some(icon) = icon {
        let dest = resources_dir.join("icon.icns");
        fs::copy(icon, &dest)
            .with_context(|| format!("failed to copy icon into {}", dest.display()))?;
    }
    Ok(bundle)
}

pub(crate) fn render_info_plist() -> String {
    let mut plist = String::new();
    plist.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    plist.push_str("<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n");
    plist.push_str("<plist version=\"1.0\">\n<dict>\n");
    plist.push_str(&format!(
        "  <key>CFBundleName</key>\n  <string>{APP_DISPLAY_NAME}</string>\n"
    ));
    plist.push_str(&format!(
        "  <key>CFBundleDisplayName</key>\n  <string>{APP_DISPLAY_NAME}</string>\n"
    ));
    plist.push_str("  <key>CFBundleIdentifier</key>\n  <string>io.flx4control.app</string>\n");
    plist.push_str(&format!(
        "  <key>CFBundleExecutable</key>\n  <string>{APP_DISPLAY_NAME}</string>\n"
    ));
    plist.push_str("  <key>CFBundleIconFile</key>\n  <string>icon.icns</string>\n");
    plist.push_str("  <key>CFBundlePackageType</key>\n  <string>APPL</string>\n");
    plist.push_str("  <key>LSUIElement</key>\n  <false/>\n");
    plist.push_str("</dict>\n</plist>\n");
    plist
}

/// The shim walks up from Contents/MacOS to the directory holding the
/// bundle; `pwd -P` resolves the ~/Applications symlink so both layouts
/// land on the directory that actually contains the payload.
pub(crate) fn render_bundle_shim() -> String {
    let mut shim = String::new();
    shim.push_str("#!/bin/sh\n");
    shim.push_str("bundle=\"$(cd \"$(dirname \"$0\")/../..\" && pwd -P)\"\n");
    shim.push_str("root=\"$(dirname \"$bundle\")\"\n");
    shim.push_str("if [ ! -f \"$root/main.py\" ]; then\n");
    shim.push_str("  echo \"FLX4 Control is not installed next to this bundle\" >&2\n");
    shim.push_str("  exit 1\n");
    shim.push_str("fi\n");
    shim.push_str("exec \"$root/.venv/bin/python\" \"$root/main.py\"\n");
    shim
}

fn write_executable(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("failed to set executable mode on {}", path.display()))?;
    }
    Ok(())
}

/// Removes the shortcut artifacts an adapter may have created. Best-effort;
/// each failure becomes a warning.
pub fn remove_integration(adapter: &dyn PlatformAdapter) -> Vec<String> {
    let mut warnings = Vec::new();
    for path in adapter.shortcut_paths() {
        if fs::symlink_metadata(&path).is_err() {
            continue;
        }
        if let Err(err) = fs::remove_file(&path) {
            warnings.push(format!("could not remove shortcut {}: {err}", path.display()));
        }
    }
    warnings
}
