mod flows;
mod prompt;
mod render;


use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flxsetup_core::{InstallScope, APP_DISPLAY_NAME};
use flxsetup_installer::{host_adapter, ProcessRunner, UninstallStatus};

use flows::{install, uninstall, InstallRun, RunContext, UninstallRun};
use prompt::{ConsolePrompt, Prompt, Unattended};
use render::{output_style, ProgressReporter, TerminalRenderer};

#[derive(Parser, Debug)]
#[command(name = "flx4-setup")]
#[command(about = "Installer and updater for FLX4 Control", long_about = None)]
#[command(version)]
struct Cli {
    /// Install location scope; skips the interactive choice.
    #[arg(long, global = true, value_enum)]
    scope: Option<ScopeArg>,
    /// Answer every question with its default.
    #[arg(long, global = true)]
    yes: bool,
    /// Disable colors and progress animations.
    #[arg(long, global = true)]
    plain: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install or update FLX4 Control (the default when no command is given).
    Install,
    /// Remove an existing installation.
    Uninstall {
        /// Also delete saved settings and sounds.
        #[arg(long)]
        purge_user_data: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScopeArg {
    User,
    System,
}

impl From<ScopeArg> for InstallScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::User => Self::User,
            ScopeArg::System => Self::System,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let renderer = TerminalRenderer::new(output_style(cli.plain));
    match run(cli, renderer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            renderer.print_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, renderer: TerminalRenderer) -> Result<()> {
    let runner = ProcessRunner;
    let adapter = host_adapter(&runner)?;
    let exe_path = std::env::current_exe().context("cannot determine the installer's own path")?;
    let exe_dir = exe_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("installer path has no parent directory"))?;
    let ctx = RunContext {
        runner: &runner,
        adapter: adapter.as_ref(),
        exe_path,
        exe_dir,
    };

    let mut console = ConsolePrompt;
    let mut unattended = Unattended;
    let prompt: &mut dyn Prompt = if cli.yes { &mut unattended } else { &mut console };
    let reporter = ProgressReporter::new(renderer);
    let scope = cli.scope.map(InstallScope::from);

    match cli.command.unwrap_or(Commands::Install) {
        Commands::Install => match install(&ctx, scope, cli.yes, prompt, &reporter)? {
            InstallRun::Relaunched => {
                reporter.finish();
                renderer.success("continuing in an elevated window; this one is done");
            }
            InstallRun::Completed(report) => {
                reporter.finish();
                for warning in &report.warnings {
                    renderer.warn(warning);
                }
                renderer.success(&format!(
                    "{APP_DISPLAY_NAME} is installed in {} (Python {})",
                    report.root.display(),
                    report.runtime.version
                ));
                println!("launch it with {}", report.launcher.display());
            }
        },
        Commands::Uninstall { purge_user_data } => {
            match uninstall(&ctx, purge_user_data, cli.yes, prompt, &reporter)? {
                UninstallRun::Relaunched => {
                    reporter.finish();
                    renderer.success("continuing in an elevated window; this one is done");
                }
                UninstallRun::Completed(outcome) => {
                    reporter.finish();
                    for warning in &outcome.warnings {
                        renderer.warn(warning);
                    }
                    match outcome.status {
                        UninstallStatus::NotInstalled => {
                            renderer.success(&format!("{APP_DISPLAY_NAME} is not installed"));
                        }
                        UninstallStatus::Cancelled => {
                            renderer.success("nothing was removed");
                        }
                        UninstallStatus::Removed => {
                            renderer.success(&format!("{APP_DISPLAY_NAME} has been removed"));
                            if outcome.user_data_removed {
                                println!("saved settings and sounds were deleted");
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
