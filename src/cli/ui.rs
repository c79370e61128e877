use colored::*;
use console::Term;
use dialoguer::{ theme::ColorfulTheme, Confirm, Input };
use indicatif::{ ProgressBar, ProgressStyle };
use std::path::Path;
use std::time::Duration;
use textwrap::wrap;

use mira::{ Artifact, ErrorSeverity, RunLog };

/// UI theme for consistent appearance
pub fn get_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Print a section header
pub fn print_header(title: &str) {
    let title = format!(" {} ", title);
    println!("\n{}\n", title.bold().white().on_blue());
}

/// Print text with proper wrapping
pub fn print_text(text: &str) {
    let width = Term::stdout().size().1 as usize;
    let mut in_code = false;
    for line in text.lines() {
        if line.starts_with("```") {
            in_code = !in_code;
            println!("{}", line.dimmed());
        } else if in_code || line.starts_with('-') || line.starts_with('|') {
            println!("{}", line);
        } else if line.starts_with('#') {
            println!("{}", line.bold());
        } else if line.is_empty() {
            println!();
        } else {
            for wrapped_line in wrap(line, width.saturating_sub(10).max(20)) {
                println!("{}", wrapped_line);
            }
        }
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "ERROR:".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "WARNING:".yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "SUCCESS:".green().bold(), message);
}

/// Print information
pub fn print_info(message: &str) {
    println!("{} {}", "INFO:".blue().bold(), message);
}

/// Print a formatted result
pub fn print_result(label: &str, value: &str) {
    println!("{}: {}", label.bold(), value);
}

/// Display a spinner while waiting for an operation to complete
pub fn spinner_with_message(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Ask for a required text value
pub fn prompt_text(prompt: &str) -> std::io::Result<String> {
    Input::<String>::with_theme(&get_theme())
        .with_prompt(prompt)
        .interact_text()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

pub fn confirm_action(prompt: &str) -> std::io::Result<bool> {
    Confirm::with_theme(&get_theme())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Summarise the stages, errors and degraded stages of a run
pub fn print_run_log(log: &RunLog) {
    let stages = log
        .stages()
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(" → ");
    print_result("Stages", &stages);

    for record in &log.errors {
        let message = format!("[{}] {}", record.stage, record.message);
        match record.severity {
            ErrorSeverity::Warning => print_warning(&message),
            _ => print_error(&message),
        }
    }

    if !log.degraded_stages.is_empty() {
        let degraded = log.degraded_stages
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ");
        print_warning(&format!("Stages that fell back to default content: {}", degraded));
    }
}

/// Print artifact headline figures
pub fn print_artifact_summary(artifact: &Artifact) {
    print_result("Title", &artifact.title);
    print_result("Components", &artifact.components.len().to_string());
    if let Some(score) = artifact.quality_score {
        print_result("Quality score", &format!("{}/10", score));
    }
}

/// Render an artifact in the requested format
pub fn render_artifact(artifact: &Artifact, format: &str) -> anyhow::Result<String> {
    match format.to_lowercase().as_str() {
        "markdown" | "md" => Ok(artifact.to_markdown()),
        "json" => Ok(artifact.to_json()?),
        other => Err(anyhow::anyhow!("Unknown output format: {}", other)),
    }
}

/// Write to a file, or print to the terminal when no path is given
pub fn emit(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, text)?;
            print_success(&format!("Written to {}", path.display()));
        }
        None => print_text(text),
    }
    Ok(())
}
