use std::cell::RefCell;
use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use flxsetup_core::SetupError;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

/// Rich output only on a real terminal that has not opted out.
pub fn output_style(plain_flag: bool) -> OutputStyle {
    if plain_flag || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

#[derive(Copy, Clone, Debug)]
pub struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub fn new(style: OutputStyle) -> Self {
        Self { style }
    }

    pub fn step(&self, message: &str) {
        match self.style {
            OutputStyle::Plain => println!("-> {message}"),
            OutputStyle::Rich => {
                println!("{} {message}", colorize(step_style(), "->"))
            }
        }
    }

    pub fn success(&self, message: &str) {
        match self.style {
            OutputStyle::Plain => println!("ok: {message}"),
            OutputStyle::Rich => println!("{} {message}", colorize(success_style(), "ok:")),
        }
    }

    pub fn warn(&self, message: &str) {
        match self.style {
            OutputStyle::Plain => eprintln!("warning: {message}"),
            OutputStyle::Rich => {
                eprintln!("{} {message}", colorize(warn_style(), "warning:"))
            }
        }
    }

    /// Indeterminate spinner for the long steps (download, package install).
    /// A no-op handle in plain mode.
    pub fn start_spinner(&self, label: &str) -> Spinner {
        if self.style != OutputStyle::Rich {
            return Spinner { bar: None };
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Spinner { bar: Some(bar) }
    }

    pub fn print_failure(&self, err: &anyhow::Error) {
        match self.style {
            OutputStyle::Plain => eprintln!("error: {err:#}"),
            OutputStyle::Rich => eprintln!("{} {err:#}", colorize(error_style(), "error:")),
        }
        if let Some(remediation) = err
            .downcast_ref::<SetupError>()
            .and_then(SetupError::remediation)
        {
            match self.style {
                OutputStyle::Plain => eprintln!("hint: {remediation}"),
                OutputStyle::Rich => {
                    eprintln!("{} {remediation}", colorize(hint_style(), "hint:"))
                }
            }
        }
    }
}

pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Reporter backed by the terminal renderer: prints each step and keeps a
/// spinner alive until the next step starts or the flow finishes.
pub struct ProgressReporter {
    renderer: TerminalRenderer,
    active: RefCell<Option<Spinner>>,
}

impl ProgressReporter {
    pub fn new(renderer: TerminalRenderer) -> Self {
        Self {
            renderer,
            active: RefCell::new(None),
        }
    }

    fn clear_active(&self) {
        if let Some(spinner) = self.active.borrow_mut().take() {
            spinner.finish();
        }
    }

    pub fn finish(&self) {
        self.clear_active();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.clear_active();
    }
}

impl crate::flows::Reporter for ProgressReporter {
    fn step(&self, message: &str) {
        self.clear_active();
        self.renderer.step(message);
        *self.active.borrow_mut() = Some(self.renderer.start_spinner(message));
    }

    fn pause(&self) {
        self.clear_active();
    }
}

fn step_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn success_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightGreen.into()))
        .effects(Effects::BOLD)
}

fn warn_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightYellow.into()))
        .effects(Effects::BOLD)
}

fn error_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn hint_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
