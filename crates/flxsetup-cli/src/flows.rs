use std::path::PathBuf;

use anyhow::{anyhow, Result};
use flxsetup_core::{
    DependencyManifest, InstallLayout, InstallScope, InstallTarget, RuntimeCandidate,
    RuntimeRange, SetupError, APP_DISPLAY_NAME,
};
use flxsetup_installer::{
    ensure_runtime, generate_integration, locate_existing_install, provision,
    remove_install_root, remove_integration, remove_user_data, resolve_source_tree, sync_tree,
    CommandRunner, PlatformAdapter, SetupLock, UninstallOutcome, UninstallStatus,
};

use crate::prompt::Prompt;

/// Step announcements from a flow in progress.
pub trait Reporter {
    fn step(&self, message: &str);

    /// Called before the flow reads from the console; a live spinner must
    /// stop redrawing over the prompt.
    fn pause(&self) {}
}

/// Everything a flow needs about this invocation.
pub struct RunContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub adapter: &'a dyn PlatformAdapter,
    pub exe_path: PathBuf,
    pub exe_dir: PathBuf,
}

/// How an install invocation ended. `Relaunched` means an elevated copy now
/// owns the work and this process must exit successfully without touching
/// anything else.
#[derive(Debug)]
pub enum InstallRun {
    Completed(InstallReport),
    Relaunched,
}

#[derive(Debug)]
pub struct InstallReport {
    pub root: PathBuf,
    pub runtime: RuntimeCandidate,
    pub launcher: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub enum UninstallRun {
    Completed(UninstallOutcome),
    Relaunched,
}

/// The install state machine: resolve sources, secure a runtime, pick the
/// target, hand off to an elevated copy if the target needs it, then under
/// the advisory lock mirror the payload, provision the environment, and
/// generate the desktop integration. Update and repair are the same path;
/// every step converges on the desired state instead of assuming a fresh
/// machine.
pub fn install(
    ctx: &RunContext<'_>,
    scope: Option<InstallScope>,
    assume_yes: bool,
    prompt: &mut dyn Prompt,
    reporter: &dyn Reporter,
) -> Result<InstallRun> {
    reporter.step("resolving application sources");
    let source = resolve_source_tree(ctx.runner, &ctx.exe_dir)?;

    reporter.step("locating a Python runtime");
    let runtime = ensure_runtime(ctx.runner, ctx.adapter, &RuntimeRange::supported())?;

    reporter.pause();
    let target = choose_target(ctx.adapter, scope, assume_yes, prompt)?;
    if target.requires_elevation && !ctx.adapter.is_elevated() {
        return relaunch_install(ctx, &target, assume_yes, prompt);
    }

    let layout = InstallLayout::new(&target.root);
    let _lock = SetupLock::acquire(&layout)?;

    let mut warnings = Vec::new();
    if let Err(err) = ctx.adapter.kill_running_instance(&layout) {
        warnings.push(format!("could not stop a running instance: {err:#}"));
    }

    reporter.step(&format!("copying files into {}", target.root.display()));
    sync_tree(source.dir(), &layout)?;

    reporter.step(&format!(
        "provisioning a Python {} environment",
        runtime.version
    ));
    let manifest = DependencyManifest::bundled()?;
    provision(ctx.runner, &layout, &runtime, &manifest, ctx.adapter.platform())?;

    reporter.step("generating launchers and shortcuts");
    let integration = generate_integration(ctx.runner, ctx.adapter, &layout)?;
    warnings.extend(integration.warnings);

    Ok(InstallRun::Completed(InstallReport {
        root: target.root,
        runtime,
        launcher: integration.launcher,
        warnings,
    }))
}

/// The uninstall state machine. A missing installation is an ordinary
/// outcome; the flow only fails on errors while removing one that exists.
pub fn uninstall(
    ctx: &RunContext<'_>,
    purge_user_data: bool,
    assume_yes: bool,
    prompt: &mut dyn Prompt,
    reporter: &dyn Reporter,
) -> Result<UninstallRun> {
    let Some(target) = locate_existing_install(ctx.adapter) else {
        return Ok(UninstallRun::Completed(UninstallOutcome::not_installed()));
    };

    // Confirmation always happens here, in the unprivileged parent; an
    // elevated child runs with `--yes` and must never ask again.
    if !assume_yes {
        let question = format!(
            "Remove {APP_DISPLAY_NAME} from {}?",
            target.root.display()
        );
        if !prompt.confirm(&question, true)? {
            return Ok(UninstallRun::Completed(UninstallOutcome {
                status: UninstallStatus::Cancelled,
                root: Some(target.root),
                user_data_removed: false,
                warnings: Vec::new(),
            }));
        }
    }

    let purge = purge_user_data
        || (!assume_yes
            && ctx.adapter.user_data_dir().exists()
            && prompt.confirm("Also remove saved settings and sounds?", false)?);

    if target.requires_elevation && !ctx.adapter.is_elevated() {
        // User data lives under the invoking user's profile. The elevated
        // child would resolve it against the administrator's environment,
        // so it is removed here and the purge flag is never forwarded.
        if purge {
            remove_user_data(ctx.adapter)?;
        }
        let args = vec!["uninstall".to_string(), "--yes".to_string()];
        return relaunch_elevated(ctx, &target, args).map(|()| UninstallRun::Relaunched);
    }

    let layout = InstallLayout::new(&target.root);
    let _lock = SetupLock::acquire(&layout)?;

    let mut warnings = Vec::new();
    if let Err(err) = ctx.adapter.kill_running_instance(&layout) {
        warnings.push(format!("could not stop a running instance: {err:#}"));
    }

    reporter.step("removing shortcuts");
    warnings.extend(remove_integration(ctx.adapter));

    reporter.step(&format!("removing {}", target.root.display()));
    remove_install_root(&layout)?;

    let user_data_removed = if purge {
        remove_user_data(ctx.adapter)?
    } else {
        false
    };

    Ok(UninstallRun::Completed(UninstallOutcome {
        status: UninstallStatus::Removed,
        root: Some(target.root),
        user_data_removed,
        warnings,
    }))
}

fn choose_target(
    adapter: &dyn PlatformAdapter,
    scope: Option<InstallScope>,
    assume_yes: bool,
    prompt: &mut dyn Prompt,
) -> Result<InstallTarget> {
    let targets = adapter.default_install_targets();
    if let Some(scope) = scope {
        return targets
            .into_iter()
            .find(|target| target.scope == scope)
            .ok_or_else(|| anyhow!("no {}-scoped install location on this platform", scope.as_str()));
    }

    let default = targets.iter().position(|target| target.is_default).unwrap_or(0);
    let chosen = if assume_yes {
        default
    } else {
        let options: Vec<String> = targets
            .iter()
            .map(|target| format!("{} ({})", target.scope.as_str(), target.root.display()))
            .collect();
        prompt.choose(
            &format!("Where should {APP_DISPLAY_NAME} be installed?"),
            &options,
            default,
        )?
    };
    targets
        .into_iter()
        .nth(chosen)
        .ok_or_else(|| anyhow!("install location choice is out of range"))
}

fn relaunch_install(
    ctx: &RunContext<'_>,
    target: &InstallTarget,
    assume_yes: bool,
    prompt: &mut dyn Prompt,
) -> Result<InstallRun> {
    if !assume_yes {
        let question = format!(
            "Installing into {} needs administrator privileges. Relaunch elevated?",
            target.root.display()
        );
        if !prompt.confirm(&question, true)? {
            return Err(SetupError::PrivilegeRequired {
                target: target.root.clone(),
            }
            .into());
        }
    }
    let args = vec![
        "install".to_string(),
        "--scope".to_string(),
        target.scope.as_str().to_string(),
        "--yes".to_string(),
    ];
    relaunch_elevated(ctx, target, args).map(|()| InstallRun::Relaunched)
}

/// The chosen scope and `--yes` ride along so the elevated child never
/// prompts and never re-elevates.
fn relaunch_elevated(ctx: &RunContext<'_>, target: &InstallTarget, args: Vec<String>) -> Result<()> {
    if let Err(err) = ctx.adapter.relaunch_elevated(&ctx.exe_path, &args) {
        return Err(anyhow::Error::from(SetupError::PrivilegeRequired {
            target: target.root.clone(),
        })
        .context(format!("elevated relaunch failed: {err:#}")));
    }
    Ok(())
}
