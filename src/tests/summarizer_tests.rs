#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::test;

    use crate::config::PipelineOptions;
    use crate::errors::{MiraError, MiraResult};
    use crate::implementations::summarizer::Summarizer;
    use crate::implementations::templates::PromptTemplates;
    use crate::models::common::{PipelineStage, Role};
    use crate::models::summary::SummaryRequest;
    use crate::tests::support::ScriptedGateway;

    const MATERIAL: &str = "Chapter 6: Life Processes. Nutrition, respiration and transport keep organisms alive. \
        Example: Why is diffusion insufficient for oxygen supply in multicellular organisms?";

    fn setup() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn summarizer(gateway: Arc<ScriptedGateway>) -> Summarizer {
        Summarizer::new(gateway, Arc::new(PromptTemplates::default()), &PipelineOptions::default())
    }

    fn request() -> SummaryRequest {
        SummaryRequest {
            subject: "Biology".to_string(),
            grade: "10".to_string(),
            topic: "Life Processes".to_string(),
            text: MATERIAL.to_string(),
        }
    }

    #[test]
    async fn test_summary_chain_makes_three_calls() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(
            ScriptedGateway::default()
                .respond_when("identify the main topics", "- **Nutrition**\n- **Respiration**")
                .respond_when("Extract all examples", "Diffusion is too slow over large distances.")
                .respond_when("create a structured summary", "## Life Processes\n\nStructured summary")
        );

        let artifact = summarizer(gateway.clone()).summarize(request()).await?;

        assert_eq!(artifact.title, "Life Processes - Biology Summary for 10");
        assert_eq!(artifact.components.len(), 1);
        assert_eq!(artifact.components[0].component_type, "Summary");
        assert_eq!(artifact.components[0].order, 1);
        assert_eq!(artifact.components[0].content, "## Life Processes\n\nStructured summary");

        let calls = gateway.calls_for(PipelineStage::Summarize);
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.messages.len() == 1 && c.messages[0].role == Role::System));
        assert!(calls.iter().take(2).all(|c| c.prompt().contains(MATERIAL) && c.max_tokens == 1500));

        let format_call = &calls[2];
        assert_eq!(format_call.max_tokens, 3000);
        assert!(format_call.prompt().contains("- **Nutrition**"));
        assert!(format_call.prompt().contains("Diffusion is too slow"));
        assert!(!format_call.prompt().contains(MATERIAL));
        Ok(())
    }

    #[test]
    async fn test_silent_model_assembles_default_summary() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(ScriptedGateway::silent());

        let output = summarizer(gateway).summarize_parts(&request().validated()?).await?;

        assert_eq!(output.topics_and_terminology, "- **Life Processes**");
        assert_eq!(output.examples_and_problems, "No worked examples were found in the material.");
        assert!(output.summary.contains("### Topics and Terminology"));
        assert!(output.summary.contains("### Examples and Problems"));
        Ok(())
    }

    #[test]
    async fn test_blank_topic_uses_subject() -> MiraResult<()> {
        setup();
        let mut request = request();
        request.topic = "  ".to_string();

        let artifact = summarizer(Arc::new(ScriptedGateway::silent())).summarize(request).await?;

        assert_eq!(artifact.title, "Biology - Biology Summary for 10");
        assert_eq!(artifact.metadata.topic, "Biology");
        Ok(())
    }

    #[test]
    async fn test_missing_input_rejected_without_calls() {
        setup();
        let gateway = Arc::new(ScriptedGateway::silent());
        let summarizer = summarizer(gateway.clone());

        let mut empty_text = request();
        empty_text.text = "\n".to_string();
        assert!(matches!(summarizer.summarize(empty_text).await, Err(MiraError::Configuration(_))));

        let mut no_grade = request();
        no_grade.grade = String::new();
        assert!(matches!(summarizer.summarize(no_grade).await, Err(MiraError::Configuration(_))));

        assert_eq!(gateway.call_count(), 0);
    }
}
