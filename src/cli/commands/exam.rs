use anyhow::{ anyhow, Context, Result };
use std::path::PathBuf;
use std::sync::Arc;

use mira::{
    Difficulty,
    ExamPaperGenerator,
    ExamRequest,
    InMemoryRetrieval,
    MiraConfig,
    NoopRetrieval,
    OpenAiGateway,
    QuestionType,
    RetrievalProvider,
};

use crate::cli::ui;

/// Arguments of the `exam` command
pub struct ExamArgs {
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub difficulty: String,
    pub types: String,
    pub duration: u32,
    pub marks: u32,
    pub remarks: String,
    pub corpus: Option<PathBuf>,
    pub format: String,
    pub output: Option<PathBuf>,
}

fn parse_types(types: &str) -> Result<Vec<QuestionType>> {
    types
        .split(',')
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.parse::<QuestionType>().map_err(|e| anyhow!(e)))
        .collect()
}

/// Exam paper command
pub async fn execute(config: MiraConfig, args: ExamArgs) -> Result<()> {
    ui::print_header("Generating Exam Paper");

    let difficulty = args.difficulty.parse::<Difficulty>().map_err(|e| anyhow!(e))?;
    let question_types = parse_types(&args.types)?;

    let retrieval: Arc<dyn RetrievalProvider> = match &args.corpus {
        Some(path) => Arc::new(InMemoryRetrieval::from_corpus_file(path)?),
        None => Arc::new(NoopRetrieval),
    };

    config.llm.get_api_key().context("An LLM API key is required to generate exam papers")?;
    let gateway = OpenAiGateway::new(config.llm.clone(), config.pipeline.llm_timeout())?;
    let generator = ExamPaperGenerator::new(&config, Arc::new(gateway), retrieval)?;

    let request = ExamRequest::new(&args.subject, &args.topic, &args.grade)
        .with_difficulty(difficulty)
        .with_question_types(&question_types)
        .with_duration(args.duration)
        .with_total_marks(args.marks)
        .with_special_remarks(&args.remarks);

    let spinner = ui::spinner_with_message(&format!("Writing exam paper on {}...", args.topic));
    let result = generator.generate(request).await;
    spinner.finish_and_clear();

    let paper = result?;
    ui::print_run_log(&paper.log);
    ui::print_result("Planned questions", &paper.distribution.total().to_string());
    if !paper.validation.curriculum_aligned {
        ui::print_warning(&format!("Topic may be outside the curriculum: {}", paper.validation.explanation));
    }
    ui::print_artifact_summary(&paper.artifact);

    let rendered = ui::render_artifact(&paper.artifact, &args.format)?;
    ui::emit(&rendered, args.output.as_deref())?;

    ui::print_success("Exam paper generated");
    Ok(())
}
