//! Cron command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;
use std::process::{Command, Stdio};

/// Daily at 20:00.
const DEFAULT_SCHEDULE: &str = "0 20 * * *";

#[derive(Args)]
pub struct CronArgs {
    /// Print the cron line instead of installing it
    #[arg(long)]
    pub print: bool,

    /// Cron schedule expression
    #[arg(long, value_name = "EXPR", default_value = DEFAULT_SCHEDULE)]
    pub schedule: String,
}

pub fn run(args: CronArgs) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to resolve figsync executable path")?;
    let command = format!("{} run", exe.display());
    let line = cron_line(&args.schedule, &command);

    if args.print {
        println!("{}", line);
        return Ok(());
    }

    let current = read_crontab()?;
    match append_cron_entry(&current, &command, &line) {
        None => {
            tracing::info!("Cron job already exists for {}", exe.display());
            println!("Cron job already installed");
        }
        Some(updated) => {
            write_crontab(&updated)?;
            tracing::info!("Cron job set up: {}", line);
            println!("Installed: {}", line);
        }
    }
    Ok(())
}

pub fn cron_line(schedule: &str, command: &str) -> String {
    format!("{} {}", schedule.trim(), command)
}

/// Append `line` to `crontab` unless an entry already runs `command`.
pub fn append_cron_entry(crontab: &str, command: &str, line: &str) -> Option<String> {
    if crontab.lines().any(|existing| existing.contains(command)) {
        return None;
    }
    let mut updated = crontab.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');
    Some(updated)
}

fn read_crontab() -> Result<String> {
    let output = Command::new("crontab")
        .arg("-l")
        .stderr(Stdio::null())
        .output()
        .context("Failed to run `crontab -l`")?;
    // A user without a crontab gets a non-zero exit; treat it as empty.
    if !output.status.success() {
        return Ok(String::new());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn write_crontab(content: &str) -> Result<()> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .spawn()
        .context("Failed to run `crontab -`")?;
    child
        .stdin
        .take()
        .context("crontab stdin unavailable")?
        .write_all(content.as_bytes())
        .context("Failed to write crontab")?;
    let status = child.wait().context("Failed to wait for crontab")?;
    if !status.success() {
        anyhow::bail!("crontab exited with {}", status);
    }
    Ok(())
}
