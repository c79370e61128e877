use clap::{ Parser, Subcommand };
use std::path::PathBuf;

pub mod commands;
pub mod ui;

#[derive(Parser)]
#[command(
    name = "mira",
    about = "Multi-agent lesson, exam paper and summary generator",
    version,
    author,
    long_about = None
)]
pub struct MiraCli {
    /// Sets the log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a lesson for a subject, topic and grade
    Lesson {
        /// Subject, e.g. "Mathematics"
        #[arg(short, long)]
        subject: Option<String>,

        /// Lesson topic
        #[arg(short, long)]
        topic: Option<String>,

        /// Grade or class, e.g. "10"
        #[arg(short, long)]
        grade: Option<String>,

        /// Comma-separated subtopics
        #[arg(long, default_value = "")]
        subtopics: String,

        /// Special requirements for the lesson
        #[arg(long, default_value = "")]
        requirements: String,

        /// Text file used as the source document
        #[arg(long)]
        source: Option<PathBuf>,

        /// JSON retrieval corpus keyed by collection name
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Run the quality review and refinement stages
        #[arg(long, default_value = "false")]
        review: bool,

        /// Enrichment focus (numerical, problem-solving)
        #[arg(long)]
        focus: Option<String>,

        /// Output format (markdown, json)
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Output file for the lesson
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prompt for missing fields
        #[arg(short, long, default_value = "false")]
        interactive: bool,
    },

    /// Summarise a text file for students
    Summarize {
        /// Text file to summarise
        #[arg(short, long)]
        input: PathBuf,

        /// Subject of the material
        #[arg(short, long)]
        subject: String,

        /// Grade or class
        #[arg(short, long)]
        grade: String,

        /// Title topic; defaults to the subject
        #[arg(short, long)]
        topic: Option<String>,

        /// Output format (markdown, json)
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Output file for the summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an exam paper for a subject, topic and grade
    Exam {
        /// Subject, e.g. "Mathematics"
        #[arg(short, long)]
        subject: String,

        /// Exam topic
        #[arg(short, long)]
        topic: String,

        /// Grade or class, e.g. "10"
        #[arg(short, long)]
        grade: String,

        /// Difficulty (easy, medium, hard, mixed)
        #[arg(short, long, default_value = "medium")]
        difficulty: String,

        /// Comma-separated question types (mcq, short_answer, long_answer, numerical)
        #[arg(long, default_value = "mcq")]
        types: String,

        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: u32,

        /// Maximum marks
        #[arg(long, default_value = "100")]
        marks: u32,

        /// Special remarks for the question writers
        #[arg(long, default_value = "")]
        remarks: String,

        /// JSON retrieval corpus keyed by collection name
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output format (markdown, json)
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Output file for the paper
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a JSON artifact as markdown
    Render {
        /// Path to a JSON artifact
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the markdown
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
