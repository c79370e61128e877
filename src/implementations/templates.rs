use std::collections::HashMap;

use crate::errors::{MiraError, MiraResult};
use crate::models::common::EnrichmentFocus;
use crate::models::exam::QuestionType;

pub const CURRICULUM_SYSTEM: &str = "curriculum_system";
pub const CURRICULUM_ANALYSIS: &str = "curriculum_analysis";
pub const CONTENT_SYSTEM: &str = "content_system";
pub const CONTENT_CREATION: &str = "content_creation";
pub const QUALITY_SYSTEM: &str = "quality_system";
pub const QUALITY_EVALUATION: &str = "quality_evaluation";
pub const REFINEMENT_SYSTEM: &str = "refinement_system";
pub const REFINE_COMPONENT: &str = "refine_component";
pub const SUMMARY_TOPICS: &str = "summary_topics";
pub const SUMMARY_EXAMPLES: &str = "summary_examples";
pub const SUMMARY_FORMAT: &str = "summary_format";
pub const EXAM_VALIDATION: &str = "exam_validation";
pub const EXAM_DISTRIBUTION: &str = "exam_distribution";
pub const EXAM_HEADER: &str = "exam_header";
pub const EXAM_DEFAULT_HEADER: &str = "exam_default_header";

/// Name of the section template for a question type, e.g. `exam_section_mcq`
pub fn exam_section_template(question_type: QuestionType) -> String {
    format!("exam_section_{}", question_type.as_str())
}

/// Name of a focus-specific enrichment template, e.g. `enrich_component_numerical`
pub fn enrichment_template(kind: &str, focus: EnrichmentFocus) -> String {
    format!("{}_{}", kind, focus.template_suffix())
}

pub const ENRICHMENT_SYSTEM: &str = "enrichment_system";
pub const ENRICH_COMPONENT: &str = "enrich_component";
pub const ENRICH_STRATEGIES: &str = "enrich_strategies";
pub const ENRICH_ASSESSMENT: &str = "enrich_assessment";

/// Prompt templates with `{{placeholder}}` parameters. Built-in templates can
/// be overridden by name from configuration.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    templates: HashMap<String, String>,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let templates = DEFAULT_TEMPLATES.iter()
            .map(|(name, body)| (name.to_string(), body.trim().to_string()))
            .collect();
        Self { templates }
    }
}

impl PromptTemplates {
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut templates = Self::default();
        for (name, body) in overrides {
            templates.templates.insert(name.clone(), body.clone());
        }
        templates
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.templates.get(name)
    }

    /// Render a template with the given parameters
    pub fn render(&self, name: &str, params: &HashMap<String, String>) -> MiraResult<String> {
        let template = self
            .get(name)
            .ok_or_else(|| MiraError::Template(format!("Template not found: {}", name)))?;

        let mut result = template.clone();
        for (key, value) in params {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        Ok(result)
    }
}

/// Build a template parameter map from pairs
pub fn params<const N: usize>(pairs: [(&str, String); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        CURRICULUM_SYSTEM,
        r#"
You are an expert curriculum designer with specialised knowledge of CBSE educational standards and NCERT guidelines. You analyse curriculum requirements for a topic, define measurable learning objectives, identify key concepts and skills, and determine scope and sequence for a single lesson. Always answer with one JSON object.
"#,
    ),
    (
        CURRICULUM_ANALYSIS,
        r#"
I need a curriculum analysis for a lesson on {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students.

Special requirements: {{special_requirements}}

Context from curriculum materials:
{{context}}

Return a JSON object with exactly these keys:
- "learning_objectives": 3-5 measurable objectives
- "key_concepts": concepts that must be covered
- "essential_skills": skills students should develop
- "standards_alignment": curriculum standards and outcomes this lesson aligns with
- "prerequisites": what students should already understand
- "scope": one sentence describing the scope of a single lesson
- "sequence": concepts in teaching order, basic to advanced
- "potential_misconceptions": difficulties students commonly run into

Every key except "scope" is an array of strings.
"#,
    ),
    (
        CONTENT_SYSTEM,
        r#"
You are an expert educational content creator with specialised knowledge of the CBSE curriculum and NCERT textbooks. You write clear explanations, worked examples with step-by-step solutions, practice activities and exam-oriented summaries. Always answer with one JSON object.
"#,
    ),
    (
        CONTENT_CREATION,
        r#"
Create educational content for a lesson on {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students.

Learning Objectives:
{{objectives}}

Key Concepts to Cover:
{{concepts}}

Suggested Sequence:
{{sequence}}

Context from curriculum materials:
{{context}}

Return a JSON object with exactly these keys, each a markdown string:
{
  "introduction": "objectives and basic definitions for {{topic}}",
  "core_content": "detailed explanation of each key concept and subtopic",
  "examples": "2-3 worked examples with step-by-step solutions",
  "practice_activities": "practice problems and activities",
  "summary": "important formulas and concepts, and a link to upcoming topics"
}
"#,
    ),
    (
        "enrichment_system_numerical",
        r#"
You are an expert in numerical problem-solving and CBSE assessment patterns. You enrich lesson material with worked numerical problems, application-based questions and board-exam style practice.
"#,
    ),
    (
        "enrichment_system_problem_solving",
        r#"
You are an expert in problem-solving methodologies and critical thinking. You design structured problem-solving frameworks, step-by-step strategies and exercises that build analytical skills.
"#,
    ),
    (
        "enrich_component_numerical",
        r#"
Enhance the following {{component_type}} for a lesson on {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students by adding numerical problems and application-based questions.

Learning Objectives:
{{objectives}}

Original Content:
{{content}}

Context for problem creation:
{{context}}

Keep the original material, then add:
- 3-5 numerical problems with step-by-step solutions
- application-based questions tied to real-world scenarios
- practice problems without solutions

Return only the enhanced markdown content.
"#,
    ),
    (
        "enrich_component_problem_solving",
        r#"
Enhance the following {{component_type}} for a lesson on {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students with problem-solving techniques.

Learning Objectives:
{{objectives}}

Original Content:
{{content}}

Context:
{{context}}

Keep the original material, then add explicit problem-solving strategies, guided questions that build critical thinking, and a short reflection prompt.

Return only the enhanced markdown content.
"#,
    ),
    (
        "enrich_strategies_numerical",
        r#"
Create a "Numerical Problem-Solving Strategies" section for {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students.

Learning Objectives:
{{objectives}}

Context:
{{context}}

Include a step-by-step method for this topic, 5-7 exam-style numerical problems with complete solutions, a formula sheet, common mistakes and quick calculation techniques.
"#,
    ),
    (
        "enrich_strategies_problem_solving",
        r#"
Create a "Problem-Solving Techniques" section for {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students.

Learning Objectives:
{{objectives}}

Context:
{{context}}

Include a general framework for approaching problems in this topic, topic-specific strategies with worked illustrations, and common pitfalls.
"#,
    ),
    (
        "enrich_assessment_numerical",
        r#"
Create a "Numerical Assessment" section for {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students.

Learning Objectives:
{{objectives}}

Context:
{{context}}

Follow a board-exam question paper pattern: 1-mark, 2-mark, 3-mark and 5-mark questions, with a step-wise marking scheme and model answers.
"#,
    ),
    (
        "enrich_assessment_problem_solving",
        r#"
Create a "Problem-Based Assessment" section for {{topic}} (subtopics: {{subtopics}}) in {{subject}} for grade {{grade}} students.

Learning Objectives:
{{objectives}}

Context:
{{context}}

Include open-ended problems of increasing difficulty, a rubric for each, and model approaches.
"#,
    ),
    (
        QUALITY_SYSTEM,
        r#"
You are an expert educational evaluator who assesses lesson quality from the perspective of a student meeting these concepts for the first time. You score lessons against a fixed rubric and give concrete recommendations. Always answer with one JSON object.
"#,
    ),
    (
        QUALITY_EVALUATION,
        r#"
As a grade {{grade}} student learning about {{topic}} in {{subject}} for the first time, evaluate this lesson.

Learning Objectives:
{{objectives}}

Lesson Content:
{{lesson}}

Score each criterion from 1 to 5: {{criteria}}.

Return a JSON object with:
- one key per criterion, each {"score": n, "strengths": [..], "areas_for_improvement": [..], "recommendations": [..]}
- "overall_summary": a short paragraph
- "quality_score": an aggregate score from 1 to 10
"#,
    ),
    (
        REFINEMENT_SYSTEM,
        r#"
You are an expert educational content refiner. You improve lesson components by addressing reviewer feedback while keeping their purpose and structure.
"#,
    ),
    (
        REFINE_COMPONENT,
        r#"
Refine the following {{component_type}} for a lesson on {{topic}} in {{subject}} for grade {{grade}} students based on quality feedback.

Learning Objectives:
{{objectives}}

Original Content:
{{content}}

Feedback (overall):
{{feedback}}

Specific Feedback for this component:
{{component_feedback}}

Return only the refined markdown content.
"#,
    ),
    (
        SUMMARY_TOPICS,
        r#"
You are an academic analyst. Given the following educational content, identify the main topics and subtopics as well as key definitions and terminology.

- Output a bullet list of topics and subtopics in the order they appear.
- Highlight important definitions or concepts in bold.
- Do not simplify technical information.

Content:
{{text}}
"#,
    ),
    (
        SUMMARY_EXAMPLES,
        r#"
You are an assistant teacher. Extract all examples or problems present in the given content and provide brief model solutions.

- Do not invent examples, only extract what is present.
- Keep solutions short and concept-oriented.

Content:
{{text}}
"#,
    ),
    (
        SUMMARY_FORMAT,
        r#"
You are a pedagogy expert. Given the topics, definitions and examples below, create a structured summary that a grade {{grade}} student of {{subject}} can understand and remember.

- Use headings and subheadings.
- Highlight definitions and keywords in bold.
- Use bullet points and short paragraphs.

Topics & Definitions:
{{topics}}

Examples & Solutions:
{{examples}}
"#,
    ),
    (
        EXAM_VALIDATION,
        r#"
You are a CBSE curriculum expert. Validate if the given topic is part of the CBSE curriculum for the specified grade and subject.

Curriculum Context: {{context}}

Respond with a JSON object containing:
- "valid": true/false
- "curriculum_aligned": true/false
- "suggestion": string (if not valid, suggest the correct topic)
- "explanation": string (brief explanation)
"#,
    ),
    (
        EXAM_DISTRIBUTION,
        r#"
You are a CBSE exam planning expert. Calculate the optimal distribution of questions for a {{duration}}-minute exam with {{total_marks}} total marks.

Question types requested: {{question_types}}
Grade: {{grade}}
Subject: {{subject}}

Standard CBSE marking scheme:
- MCQ: 1 mark each (1-2 minutes per question)
- Short Answer: 2-3 marks each (3-5 minutes per question)
- Long Answer: 5-8 marks each (8-12 minutes per question)
- Numerical: 3-5 marks each (5-8 minutes per question)

Respond with only a JSON object containing the number of questions for each type:
{"mcq": 0, "short_answer": 0, "long_answer": 0, "numerical": 0}
"#,
    ),
    (
        EXAM_HEADER,
        r#"
Generate a professional CBSE exam paper header in the standard format.

Requirements:
- Grade: {{grade}}
- Subject: {{subject}}
- Topic: {{topic}}
- Duration: {{duration}} minutes
- Total Marks: {{total_marks}}

Include:
1. CBSE board name
2. Class and subject
3. Time allowed and maximum marks
4. General instructions section

Use **bold** text where appropriate.
"#,
    ),
    (
        EXAM_DEFAULT_HEADER,
        r#"
**CENTRAL BOARD OF SECONDARY EDUCATION**

**CLASS {{grade}} - {{subject_upper}}**
**Topic: {{topic}}**

**Time Allowed: {{duration}} minutes**
**Maximum Marks: {{total_marks}}**

**GENERAL INSTRUCTIONS:**
- All questions are compulsory
- Read the questions carefully before answering
- Write your answers clearly and legibly
- Marks are indicated against each question
"#,
    ),
    (
        "exam_section_mcq",
        r#"
You are an expert CBSE question paper creator. Generate multiple choice questions for Grade {{grade}} {{subject}}.

Requirements:
- Topic: {{topic}}
- Difficulty: {{difficulty}}
- Total duration: {{duration}} minutes
- Special requirements: {{remarks}}

Generate MCQs with clear, concise questions, four options (A, B, C, D) and the mark allocation.

Format each question as:
Q1. [Question text] [1 mark]
(A) Option 1
(B) Option 2
(C) Option 3
(D) Option 4

Generate {{count}} MCQs.
"#,
    ),
    (
        "exam_section_short_answer",
        r#"
You are an expert CBSE question paper creator. Generate short answer questions for Grade {{grade}} {{subject}}.

Requirements:
- Topic: {{topic}}
- Difficulty: {{difficulty}}
- Total duration: {{duration}} minutes
- Special requirements: {{remarks}}

Each question should expect an answer of 2-3 sentences and carry 2-3 marks.

Format each question as:
Q1. [Question text] [2 marks]

Generate {{count}} short answer questions.
"#,
    ),
    (
        "exam_section_long_answer",
        r#"
You are an expert CBSE question paper creator. Generate long answer questions for Grade {{grade}} {{subject}}.

Requirements:
- Topic: {{topic}}
- Difficulty: {{difficulty}}
- Total duration: {{duration}} minutes
- Special requirements: {{remarks}}

Each question should need a detailed explanation or a step-by-step solution and carry 5-8 marks.

Format each question as:
Q1. [Question text] [5 marks]

Generate {{count}} long answer questions.
"#,
    ),
    (
        "exam_section_numerical",
        r#"
You are an expert CBSE question paper creator. Generate numerical questions for Grade {{grade}} {{subject}}.

Requirements:
- Topic: {{topic}}
- Difficulty: {{difficulty}}
- Total duration: {{duration}} minutes
- Special requirements: {{remarks}}

Each question needs a clear problem statement with specific numerical data, asks for a step-by-step solution and carries 3-5 marks. Use $...$ for inline and $$...$$ for block mathematics.

Format each question as:
Q1. [Question text with numerical data] [4 marks]

Generate {{count}} numerical questions.
"#,
    ),
];
