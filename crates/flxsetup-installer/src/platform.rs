use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use flxsetup_core::{
    InstallLayout, InstallScope, InstallTarget, Platform, APP_DISPLAY_NAME, USER_DATA_DIR_NAME,
};

use crate::runner::{run_checked, CommandRunner};

pub const MACOS_LSREGISTER_PATH: &str = "/System/Library/Frameworks/CoreServices.framework/Frameworks/LaunchServices.framework/Support/lsregister";

/// A pinned runtime the locator may install silently, user-scoped, when no
/// acceptable interpreter is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRuntime {
    pub version: String,
    pub url: String,
    pub file_name: String,
    pub silent_args: Vec<String>,
}

/// Everything the integration generator needs to point a desktop-visible
/// shortcut at the provisioned install.
#[derive(Debug, Clone)]
pub struct ShortcutSpec {
    pub launcher: PathBuf,
    pub working_dir: PathBuf,
    pub display_name: String,
    pub icon: Option<PathBuf>,
    /// macOS only: the emitted application bundle the shortcut links to.
    pub bundle: Option<PathBuf>,
}

/// OS-specific primitives behind one interface, so the orchestrator above
/// this layer is platform-agnostic. Each variant satisfies identical
/// pre/post-conditions.
pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    /// Canonical install targets, the first being the no-privilege default.
    fn default_install_targets(&self) -> Vec<InstallTarget>;

    /// The payload's own settings/sounds directory. Never written by the
    /// installer; read for existence and removed only on uninstall opt-in.
    fn user_data_dir(&self) -> PathBuf;

    /// Candidate runtime invocations in probe priority order.
    fn runtime_candidates(&self) -> Vec<String>;

    fn managed_runtime(&self) -> Option<ManagedRuntime> {
        None
    }

    fn is_elevated(&self) -> bool;

    /// Spawns an elevated copy of the installer and returns; the caller is
    /// expected to exit 0 without running further steps. Callers must check
    /// `is_elevated` first so a privileged process never re-elevates.
    fn relaunch_elevated(&self, exe: &Path, args: &[String]) -> Result<()>;

    /// Best-effort; failure is non-fatal and reported as a warning.
    fn kill_running_instance(&self, layout: &InstallLayout) -> Result<()>;

    /// Every shortcut artifact this adapter may have created, for removal.
    fn shortcut_paths(&self) -> Vec<PathBuf>;

    fn make_shortcut(&self, spec: &ShortcutSpec) -> Result<()>;
}

pub fn host_adapter<'a>(runner: &'a dyn CommandRunner) -> Result<Box<dyn PlatformAdapter + 'a>> {
    match Platform::current() {
        Platform::Linux => Ok(Box::new(LinuxAdapter::from_env(runner)?)),
        Platform::Macos => Ok(Box::new(MacosAdapter::from_env(runner)?)),
        Platform::Windows => Ok(Box::new(WindowsAdapter::from_env(runner)?)),
    }
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("neither HOME nor USERPROFILE is set"))
}

fn unix_is_elevated(runner: &dyn CommandRunner) -> bool {
    match runner.run(Command::new("id").arg("-u")) {
        Ok(output) => output.success && output.stdout.trim() == "0",
        Err(_) => false,
    }
}

fn unix_kill_entry_point(runner: &dyn CommandRunner, layout: &InstallLayout) -> Result<()> {
    let pattern = layout.entry_point().display().to_string();
    // pkill exits 1 when nothing matched; that is the common case.
    runner
        .run(Command::new("pkill").arg("-f").arg(&pattern))
        .context("pkill failed to start")
        .map(drop)
}

fn escape_ps_single_quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn escape_sh_double_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Linux
// ---------------------------------------------------------------------------

pub struct LinuxAdapter<'a> {
    runner: &'a dyn CommandRunner,
    config_home: PathBuf,
    data_home: PathBuf,
}

impl<'a> LinuxAdapter<'a> {
    pub fn from_env(runner: &'a dyn CommandRunner) -> Result<Self> {
        let home = home_dir()?;
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config"));
        let data_home = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".local").join("share"));
        Ok(Self {
            runner,
            config_home,
            data_home,
        })
    }

    pub fn with_dirs(
        runner: &'a dyn CommandRunner,
        config_home: PathBuf,
        data_home: PathBuf,
    ) -> Self {
        Self {
            runner,
            config_home,
            data_home,
        }
    }

    fn applications_dir(&self) -> PathBuf {
        self.data_home.join("applications")
    }

    fn desktop_entry_path(&self) -> PathBuf {
        self.applications_dir().join("flx4control.desktop")
    }
}

impl PlatformAdapter for LinuxAdapter<'_> {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn default_install_targets(&self) -> Vec<InstallTarget> {
        vec![
            InstallTarget {
                root: self.data_home.join(USER_DATA_DIR_NAME),
                scope: InstallScope::User,
                requires_elevation: false,
                is_default: true,
            },
            InstallTarget {
                root: PathBuf::from("/opt").join(USER_DATA_DIR_NAME),
                scope: InstallScope::System,
                requires_elevation: true,
                is_default: false,
            },
        ]
    }

    fn user_data_dir(&self) -> PathBuf {
        self.config_home.join(USER_DATA_DIR_NAME)
    }

    fn runtime_candidates(&self) -> Vec<String> {
        ["python3.12", "python3.11", "python3.10", "python3", "python"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn is_elevated(&self) -> bool {
        unix_is_elevated(self.runner)
    }

    fn relaunch_elevated(&self, exe: &Path, args: &[String]) -> Result<()> {
        let mut command = Command::new("sudo");
        command.arg(exe).args(args);
        self.runner.spawn_detached(&mut command)
    }

    fn kill_running_instance(&self, layout: &InstallLayout) -> Result<()> {
        unix_kill_entry_point(self.runner, layout)
    }

    fn shortcut_paths(&self) -> Vec<PathBuf> {
        vec![self.desktop_entry_path()]
    }

    fn make_shortcut(&self, spec: &ShortcutSpec) -> Result<()> {
        let dir = self.applications_dir();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let path = self.desktop_entry_path();
        let entry = render_desktop_entry(spec);
        fs::write(&path, entry)
            .with_context(|| format!("failed to write desktop entry {}", path.display()))?;
        // Refresh the menu cache; missing tool is fine.
        let _ = self
            .runner
            .run(Command::new("update-desktop-database").arg(&dir));
        Ok(())
    }
}

pub(crate) fn render_desktop_entry(spec: &ShortcutSpec) -> String {
    let mut desktop = String::new();
    desktop.push_str("[Desktop Entry]\n");
    desktop.push_str("Type=Application\n");
    desktop.push_str(&format!("Name={}\n", spec.display_name));
    desktop.push_str(&format!("Exec=\"{}\"\n", spec.launcher.display()));
    desktop.push_str(&format!("Path={}\n", spec.working_dir.display()));
    if let Some(icon) = &spec.icon {
        desktop.push_str(&format!("Icon={}\n", icon.display()));
    }
    desktop.push_str("Terminal=false\n");
    desktop.push_str("Categories=AudioVideo;Audio;\n");
    desktop
}

// ---------------------------------------------------------------------------
// macOS
// ---------------------------------------------------------------------------

pub struct MacosAdapter<'a> {
    runner: &'a dyn CommandRunner,
    home: PathBuf,
}

impl<'a> MacosAdapter<'a> {
    pub fn from_env(runner: &'a dyn CommandRunner) -> Result<Self> {
        Ok(Self {
            runner,
            home: home_dir()?,
        })
    }

    pub fn with_home(runner: &'a dyn CommandRunner, home: PathBuf) -> Self {
        Self { runner, home }
    }

    fn user_applications_dir(&self) -> PathBuf {
        self.home.join("Applications")
    }

    fn bundle_link_path(&self) -> PathBuf {
        self.user_applications_dir()
            .join(format!("{APP_DISPLAY_NAME}.app"))
    }
}

impl PlatformAdapter for MacosAdapter<'_> {
    fn platform(&self) -> Platform {
        Platform::Macos
    }

    fn default_install_targets(&self) -> Vec<InstallTarget> {
        vec![
            InstallTarget {
                root: self.user_applications_dir().join("FLX4Control"),
                scope: InstallScope::User,
                requires_elevation: false,
                is_default: true,
            },
            InstallTarget {
                root: PathBuf::from("/Applications").join("FLX4Control"),
                scope: InstallScope::System,
                requires_elevation: true,
                is_default: false,
            },
        ]
    }

    fn user_data_dir(&self) -> PathBuf {
        self.home
            .join("Library")
            .join("Application Support")
            .join(USER_DATA_DIR_NAME)
    }

    fn runtime_candidates(&self) -> Vec<String> {
        ["python3.12", "python3.11", "python3.10", "python3"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn is_elevated(&self) -> bool {
        unix_is_elevated(self.runner)
    }

    fn relaunch_elevated(&self, exe: &Path, args: &[String]) -> Result<()> {
        let mut shell_line = format!("\"{}\"", escape_sh_double_quote(&exe.display().to_string()));
        for arg in args {
            shell_line.push_str(&format!(" \"{}\"", escape_sh_double_quote(arg)));
        }
        let script = format!(
            "do shell script \"{}\" with administrator privileges",
            escape_sh_double_quote(&shell_line)
        );
        let mut command = Command::new("osascript");
        command.arg("-e").arg(script);
        self.runner.spawn_detached(&mut command)
    }

    fn kill_running_instance(&self, layout: &InstallLayout) -> Result<()> {
        unix_kill_entry_point(self.runner, layout)
    }

    fn shortcut_paths(&self) -> Vec<PathBuf> {
        vec![self.bundle_link_path()]
    }

    fn make_shortcut(&self, spec: &ShortcutSpec) -> Result<()> {
        let bundle = spec
            .bundle
            .as_deref()
            .ok_or_else(|| anyhow!("macOS shortcut requires an application bundle"))?;
        let dir = self.user_applications_dir();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let link = self.bundle_link_path();
        if link == bundle {
            return Ok(());
        }
        if fs::symlink_metadata(&link).is_ok() {
            let _ = fs::remove_file(&link);
        }
        #[cfg(unix)]
        std::os::unix::fs::symlink(bundle, &link).with_context(|| {
            format!(
                "failed to link {} -> {}",
                link.display(),
                bundle.display()
            )
        })?;
        #[cfg(not(unix))]
        let _ = bundle;
        // Nudge LaunchServices; registration failures are cosmetic.
        let _ = self
            .runner
            .run(Command::new(MACOS_LSREGISTER_PATH).arg("-f").arg(&link));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

pub struct WindowsAdapter<'a> {
    runner: &'a dyn CommandRunner,
    local_app_data: PathBuf,
    roaming_app_data: PathBuf,
    program_files: PathBuf,
    user_profile: PathBuf,
}

impl<'a> WindowsAdapter<'a> {
    pub fn from_env(runner: &'a dyn CommandRunner) -> Result<Self> {
        let user_profile = home_dir()?;
        let local_app_data = std::env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| user_profile.join("AppData").join("Local"));
        let roaming_app_data = std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| user_profile.join("AppData").join("Roaming"));
        let program_files = std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Program Files"));
        Ok(Self {
            runner,
            local_app_data,
            roaming_app_data,
            program_files,
            user_profile,
        })
    }

    pub fn with_dirs(
        runner: &'a dyn CommandRunner,
        local_app_data: PathBuf,
        roaming_app_data: PathBuf,
        program_files: PathBuf,
        user_profile: PathBuf,
    ) -> Self {
        Self {
            runner,
            local_app_data,
            roaming_app_data,
            program_files,
            user_profile,
        }
    }

    fn desktop_shortcut_path(&self) -> PathBuf {
        self.user_profile
            .join("Desktop")
            .join(format!("{APP_DISPLAY_NAME}.lnk"))
    }

    fn start_menu_shortcut_path(&self) -> PathBuf {
        self.roaming_app_data
            .join("Microsoft")
            .join("Windows")
            .join("Start Menu")
            .join("Programs")
            .join(format!("{APP_DISPLAY_NAME}.lnk"))
    }
}

impl PlatformAdapter for WindowsAdapter<'_> {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn default_install_targets(&self) -> Vec<InstallTarget> {
        vec![
            InstallTarget {
                root: self.local_app_data.join("FLX4Control"),
                scope: InstallScope::User,
                requires_elevation: false,
                is_default: true,
            },
            InstallTarget {
                root: self.program_files.join("FLX4Control"),
                scope: InstallScope::System,
                requires_elevation: true,
                is_default: false,
            },
        ]
    }

    fn user_data_dir(&self) -> PathBuf {
        self.roaming_app_data.join(USER_DATA_DIR_NAME)
    }

    fn runtime_candidates(&self) -> Vec<String> {
        ["py", "python", "python3"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn managed_runtime(&self) -> Option<ManagedRuntime> {
        Some(ManagedRuntime {
            version: "3.11.9".to_string(),
            url: "https://www.python.org/ftp/python/3.11.9/python-3.11.9-amd64.exe".to_string(),
            file_name: "python-3.11.9-amd64.exe".to_string(),
            silent_args: vec![
                "/quiet".to_string(),
                "InstallAllUsers=0".to_string(),
                "PrependPath=1".to_string(),
                "Include_launcher=1".to_string(),
            ],
        })
    }

    fn is_elevated(&self) -> bool {
        match self.runner.run(Command::new("net").arg("session")) {
            Ok(output) => output.success,
            Err(_) => false,
        }
    }

    fn relaunch_elevated(&self, exe: &Path, args: &[String]) -> Result<()> {
        let argument_list = args
            .iter()
            .map(|arg| format!("'{}'", escape_ps_single_quote(arg)))
            .collect::<Vec<_>>()
            .join(",");
        let mut script = format!(
            "Start-Process -FilePath '{}'",
            escape_ps_single_quote(&exe.display().to_string())
        );
        if !args.is_empty() {
            script.push_str(&format!(" -ArgumentList {argument_list}"));
        }
        script.push_str(" -Verb RunAs");
        let mut command = Command::new("powershell");
        command.arg("-NoProfile").arg("-Command").arg(script);
        self.runner.spawn_detached(&mut command)
    }

    fn kill_running_instance(&self, layout: &InstallLayout) -> Result<()> {
        let root = escape_ps_single_quote(&layout.root().display().to_string());
        let script = format!(
            "Get-CimInstance Win32_Process -Filter \"Name like 'python%'\" | Where-Object {{ $_.CommandLine -like '*{root}*' }} | ForEach-Object {{ Stop-Process -Id $_.ProcessId -Force }}"
        );
        let mut command = Command::new("powershell");
        command.arg("-NoProfile").arg("-Command").arg(script);
        self.runner.run(&mut command).map(drop)
    }

    fn shortcut_paths(&self) -> Vec<PathBuf> {
        vec![self.desktop_shortcut_path(), self.start_menu_shortcut_path()]
    }

    fn make_shortcut(&self, spec: &ShortcutSpec) -> Result<()> {
        for path in self.shortcut_paths() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let script = render_lnk_script(&path, spec);
            let mut command = Command::new("powershell");
            command.arg("-NoProfile").arg("-Command").arg(script);
            run_checked(self.runner, &mut command, "shortcut creation failed")?;
        }
        Ok(())
    }
}

pub(crate) fn render_lnk_script(link_path: &Path, spec: &ShortcutSpec) -> String {
    let mut script = format!(
        "$shell = New-Object -ComObject WScript.Shell; \
         $shortcut = $shell.CreateShortcut('{}'); \
         $shortcut.TargetPath = '{}'; \
         $shortcut.WorkingDirectory = '{}'",
        escape_ps_single_quote(&link_path.display().to_string()),
        escape_ps_single_quote(&spec.launcher.display().to_string()),
        escape_ps_single_quote(&spec.working_dir.display().to_string()),
    );
    if let Some(icon) = &spec.icon {
        script.push_str(&format!(
            "; $shortcut.IconLocation = '{}'",
            escape_ps_single_quote(&icon.display().to_string())
        ));
    }
    script.push_str("; $shortcut.Save()");
    script
}
