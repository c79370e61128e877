use anyhow::{ Context, Result };
use std::fs;
use std::path::Path;
use std::sync::Arc;

use mira::{ MiraConfig, OpenAiGateway, PromptTemplates, Summarizer, SummaryRequest };

use crate::cli::ui;

/// Summarisation command
pub async fn execute(
    config: &MiraConfig,
    input_path: &Path,
    subject: &str,
    grade: &str,
    topic: Option<&str>,
    format: &str,
    output_path: Option<&Path>
) -> Result<()> {
    ui::print_header("Summarising Material");

    let text = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    ui::print_info(&format!("Loaded {} characters from {}", text.len(), input_path.display()));

    config.llm.get_api_key().context("An LLM API key is required to summarise")?;
    let gateway = OpenAiGateway::new(config.llm.clone(), config.pipeline.llm_timeout())?;
    let templates = Arc::new(PromptTemplates::with_overrides(&config.prompt_templates));
    let summarizer = Summarizer::new(Arc::new(gateway), templates, &config.pipeline);

    let request = SummaryRequest {
        subject: subject.to_string(),
        grade: grade.to_string(),
        topic: topic.unwrap_or_default().to_string(),
        text,
    };

    let spinner = ui::spinner_with_message("Summarising...");
    let result = summarizer.summarize(request).await;
    spinner.finish_and_clear();
    let artifact = result?;

    let rendered = ui::render_artifact(&artifact, format)?;
    ui::emit(&rendered, output_path)?;

    ui::print_success("Summary generated");
    Ok(())
}
