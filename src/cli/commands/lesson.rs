use anyhow::{ anyhow, Context, Result };
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use mira::{
    CancellationFlag,
    EnrichmentFocus,
    InMemoryRetrieval,
    LessonRequest,
    MiraConfig,
    NoopRetrieval,
    OpenAiGateway,
    PipelineBuilder,
    RetrievalProvider,
};

use crate::cli::ui;

/// Arguments of the `lesson` command
pub struct LessonArgs {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub grade: Option<String>,
    pub subtopics: String,
    pub requirements: String,
    pub source: Option<PathBuf>,
    pub corpus: Option<PathBuf>,
    pub review: bool,
    pub focus: Option<String>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub interactive: bool,
}

fn resolve(value: Option<String>, prompt: &str, interactive: bool) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ if interactive => Ok(ui::prompt_text(prompt)?),
        other => Ok(other.unwrap_or_default()),
    }
}

/// Lesson generation command
pub async fn execute(config: MiraConfig, args: LessonArgs) -> Result<()> {
    ui::print_header("Generating Lesson");

    let subject = resolve(args.subject, "Subject", args.interactive)?;
    let topic = resolve(args.topic, "Topic", args.interactive)?;
    let grade = resolve(args.grade, "Grade", args.interactive)?;

    let review = args.review ||
        config.pipeline.quality_review ||
        (args.interactive && ui::confirm_action("Run quality review and refinement?")?);

    let focus = match &args.focus {
        Some(focus) => focus.parse::<EnrichmentFocus>().map_err(|e| anyhow!(e))?,
        None => config.pipeline.enrichment_focus,
    };

    let source_context = match &args.source {
        Some(path) => {
            ui::print_info(&format!("Loading source document {}", path.display()));
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read source document {}", path.display()))?
        }
        None => String::new(),
    };

    let retrieval: Arc<dyn RetrievalProvider> = match &args.corpus {
        Some(path) => Arc::new(InMemoryRetrieval::from_corpus_file(path)?),
        None if !source_context.is_empty() => Arc::new(InMemoryRetrieval::new()),
        None => Arc::new(NoopRetrieval),
    };

    config.llm.get_api_key().context("An LLM API key is required to generate lessons")?;
    let gateway = OpenAiGateway::new(config.llm.clone(), config.pipeline.llm_timeout())?;

    let cancellation = CancellationFlag::new();
    let orchestrator = PipelineBuilder::new(config, Arc::new(gateway))
        .with_retrieval(retrieval)
        .with_quality_review(review)
        .with_enrichment_focus(focus)
        .with_cancellation(cancellation.clone())
        .build()?;

    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let request = LessonRequest::new(&subject, &topic, &grade)
        .with_subtopics(&args.subtopics)
        .with_special_requirements(&args.requirements)
        .with_source_context(&source_context);

    let spinner = ui::spinner_with_message(&format!("Generating lesson on {}...", topic));
    let result = orchestrator.run_with_report(request).await;
    spinner.finish_and_clear();

    let run = result?;
    ui::print_run_log(&run.log);
    ui::print_artifact_summary(&run.artifact);

    let rendered = ui::render_artifact(&run.artifact, &args.format)?;
    ui::emit(&rendered, args.output.as_deref())?;

    ui::print_success("Lesson generated");
    Ok(())
}
