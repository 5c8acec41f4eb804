use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Interaction seam for the two questions the installer ever asks. Flows
/// hold a `&mut dyn Prompt` so unattended runs and tests answer without a
/// terminal.
pub trait Prompt {
    /// Picks one option by index. `default` is returned on an empty answer.
    fn choose(&mut self, question: &str, options: &[String], default: usize) -> Result<usize>;

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;
}

/// Reads answers from stdin.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn choose(&mut self, question: &str, options: &[String], default: usize) -> Result<usize> {
        println!("{question}");
        for (index, option) in options.iter().enumerate() {
            let marker = if index == default { "*" } else { " " };
            println!("  {marker} {}) {option}", index + 1);
        }
        loop {
            print!("choice [{}]: ", default + 1);
            io::stdout().flush().context("failed to flush stdout")?;
            let answer = read_line()?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(number) if number >= 1 && number <= options.len() => return Ok(number - 1),
                _ => println!("enter a number between 1 and {}", options.len()),
            }
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{question} {hint} ");
        io::stdout().flush().context("failed to flush stdout")?;
        let answer = read_line()?.to_ascii_lowercase();
        Ok(match answer.as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}

/// Answers every question with its default. Used for `--yes` runs and for
/// elevated children, which must never block on a console they may not
/// have.
pub struct Unattended;

impl Prompt for Unattended {
    fn choose(&mut self, _question: &str, _options: &[String], default: usize) -> Result<usize> {
        Ok(default)
    }

    fn confirm(&mut self, _question: &str, default: bool) -> Result<bool> {
        Ok(default)
    }
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}
