use std::path::Path;

use anyhow::Result;
use clap::Parser;
use log::{ info, warn };

use mira::MiraConfig;

mod cli;
use cli::commands::exam::ExamArgs;
use cli::commands::lesson::LessonArgs;
use cli::{ MiraCli, Commands };

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may come from a local .env file
    dotenv::dotenv().ok();

    // Parse the command line arguments
    let cli = MiraCli::parse();

    // Setup logging
    setup_logging(&cli.log_level);

    let config = load_config(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Lesson {
            subject,
            topic,
            grade,
            subtopics,
            requirements,
            source,
            corpus,
            review,
            focus,
            format,
            output,
            interactive,
        } => {
            cli::commands::lesson::execute(config, LessonArgs {
                subject,
                topic,
                grade,
                subtopics,
                requirements,
                source,
                corpus,
                review,
                focus,
                format,
                output,
                interactive,
            }).await
        }
        Commands::Summarize { input, subject, grade, topic, format, output } => {
            cli::commands::summarize::execute(
                &config,
                &input,
                &subject,
                &grade,
                topic.as_deref(),
                &format,
                output.as_deref()
            ).await
        }
        Commands::Exam {
            subject,
            topic,
            grade,
            difficulty,
            types,
            duration,
            marks,
            remarks,
            corpus,
            format,
            output,
        } => {
            cli::commands::exam::execute(config, ExamArgs {
                subject,
                topic,
                grade,
                difficulty,
                types,
                duration,
                marks,
                remarks,
                corpus,
                format,
                output,
            }).await
        }
        Commands::Render { input, output } => {
            cli::commands::render::execute(&input, output.as_deref())
        }
    };

    if let Err(e) = &result {
        cli::ui::print_error(&format!("{:#}", e));
    }
    result
}

fn load_config(path: Option<&Path>) -> Result<MiraConfig> {
    match path {
        Some(path) => {
            let config = MiraConfig::from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            let default_path = Path::new("mira.yaml");
            if default_path.exists() {
                match MiraConfig::from_file(default_path) {
                    Ok(config) => {
                        info!("Loaded configuration from mira.yaml");
                        return Ok(config);
                    }
                    Err(e) => warn!("Ignoring mira.yaml: {}", e),
                }
            }
            Ok(MiraConfig::default())
        }
    }
}

fn setup_logging(log_level: &str) {
    // Set up the logger based on the log level
    let level = match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new().filter_level(level).init();

    info!("Logger initialized with level: {}", log_level);
}
