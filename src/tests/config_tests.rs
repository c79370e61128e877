#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use crate::config::MiraConfig;
    use crate::errors::MiraError;
    use crate::implementations::config::{ConfigError, LlmApiConfig};
    use crate::implementations::templates::{
        enrichment_template,
        params,
        PromptTemplates,
        CURRICULUM_ANALYSIS,
        ENRICH_COMPONENT,
    };
    use crate::models::common::EnrichmentFocus;

    #[test]
    fn test_default_config_is_valid() {
        let config = MiraConfig::default();

        assert!(config.validate().is_ok());
        assert!(!config.pipeline.quality_review);
        assert_eq!(config.pipeline.enrichment_focus, EnrichmentFocus::NumericalProblems);
        assert_eq!(config.pipeline.llm_timeout().as_secs(), 120);
        assert_eq!(config.retrieval.question_bank_k, 3);
        assert_eq!(config.retrieval.exam_validation_k, 3);
        assert_eq!(config.pipeline.exam_temperature, 0.3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MiraConfig::default();
        config.pipeline.summary_temperature = -0.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { field, .. }) if field == "summary_temperature"));

        let mut config = MiraConfig::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());

        let mut config = MiraConfig::default();
        config.pipeline.max_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let path = std::env::temp_dir().join(format!("mira-config-{}.yaml", std::process::id()));
        fs::write(
            &path,
            "pipeline:\n  quality_review: true\n  enrichment_focus: problem_solving\nretrieval:\n  source_k: 8\nprompt_templates:\n  curriculum_system: Be brief.\n"
        ).expect("temp dir is writable");

        let config = MiraConfig::from_file(&path);
        let _ = fs::remove_file(&path);
        let config = config.expect("partial config parses");

        assert!(config.pipeline.quality_review);
        assert_eq!(config.pipeline.enrichment_focus, EnrichmentFocus::ProblemSolving);
        assert_eq!(config.pipeline.model, "gpt-4o-mini");
        assert_eq!(config.retrieval.source_k, 8);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.prompt_templates["curriculum_system"], "Be brief.");
    }

    #[test]
    fn test_missing_config_file_is_read_error() {
        let result = MiraConfig::from_file(std::path::Path::new("/nonexistent/mira.yaml"));
        assert!(matches!(result, Err(ConfigError::FileReadError(_))));
    }

    #[test]
    fn test_configured_api_key_wins() {
        let config = LlmApiConfig { api_key: Some("sk-test".to_string()), ..Default::default() };

        let (provider, key) = config.get_api_key().expect("key is configured");
        assert_eq!(provider, "configured");
        assert_eq!(key, "sk-test");
        assert_eq!(config.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_templates_render_and_override() {
        let templates = PromptTemplates::default();
        let rendered = templates
            .render(
                CURRICULUM_ANALYSIS,
                &params([
                    ("topic", "Light".to_string()),
                    ("subtopics", "Reflection".to_string()),
                    ("subject", "Physics".to_string()),
                    ("grade", "10".to_string()),
                    ("special_requirements", "None".to_string()),
                    ("context", "No additional context available.".to_string()),
                ])
            )
            .expect("built-in template exists");
        assert!(rendered.starts_with("I need a curriculum analysis for a lesson on Light"));
        assert!(!rendered.contains("{{"));

        let overrides = HashMap::from([(CURRICULUM_ANALYSIS.to_string(), "Topic: {{topic}}".to_string())]);
        let templates = PromptTemplates::with_overrides(&overrides);
        let rendered = templates.render(CURRICULUM_ANALYSIS, &params([("topic", "Light".to_string())]));
        assert_eq!(rendered.ok().as_deref(), Some("Topic: Light"));

        assert!(matches!(templates.render("no_such_template", &params([])), Err(MiraError::Template(_))));
    }

    #[test]
    fn test_every_enrichment_template_exists() {
        let templates = PromptTemplates::default();
        for focus in [EnrichmentFocus::NumericalProblems, EnrichmentFocus::ProblemSolving] {
            for kind in ["enrichment_system", ENRICH_COMPONENT, "enrich_strategies", "enrich_assessment"] {
                let name = enrichment_template(kind, focus);
                assert!(templates.get(&name).is_some(), "missing template {}", name);
            }
        }
        assert_eq!("problem-solving".parse::<EnrichmentFocus>(), Ok(EnrichmentFocus::ProblemSolving));
        assert!("creative".parse::<EnrichmentFocus>().is_err());
    }
}
