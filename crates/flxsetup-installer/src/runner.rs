use std::process::Command;

use anyhow::{anyhow, Context, Result};

/// Captured result of a finished child process, lossy-decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Seam for every subprocess the installer runs. Production code uses
/// `ProcessRunner`; tests inject scripted runners so probes, package
/// installs, and elevation handoffs are observable without spawning
/// anything.
pub trait CommandRunner {
    /// Runs to completion and captures output.
    fn run(&self, command: &mut Command) -> Result<CommandOutput>;

    /// Fire-and-forget spawn; the child owns its own lifetime. Used only
    /// for the elevation handoff.
    fn spawn_detached(&self, command: &mut Command) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &mut Command) -> Result<CommandOutput> {
        let output = command
            .output()
            .with_context(|| format!("failed to start: {}", render_command(command)))?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&self, command: &mut Command) -> Result<()> {
        command
            .spawn()
            .map(drop)
            .with_context(|| format!("failed to spawn: {}", render_command(command)))
    }
}

/// Runs a command and turns a non-zero exit into an error carrying the
/// captured output, in the shape the rest of the crate expects.
pub fn run_checked(
    runner: &dyn CommandRunner,
    command: &mut Command,
    context_message: &str,
) -> Result<CommandOutput> {
    let output = runner
        .run(command)
        .with_context(|| context_message.to_string())?;
    if output.success {
        return Ok(output);
    }
    Err(anyhow!(
        "{context_message}: stdout='{}' stderr='{}'",
        output.stdout.trim(),
        output.stderr.trim()
    ))
}

pub fn render_command(command: &Command) -> String {
    let mut line = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}
