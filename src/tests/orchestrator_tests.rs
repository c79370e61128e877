#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use log::info;
    use tokio::test;

    use crate::config::MiraConfig;
    use crate::errors::{ErrorSeverity, MiraError, MiraResult};
    use crate::implementations::memory_retrieval::{InMemoryRetrieval, NoopRetrieval};
    use crate::implementations::orchestrator::{
        run_stage,
        source_collection_name,
        CancellationFlag,
        PipelineBuilder,
        PipelineOrchestrator,
    };
    use crate::models::artifact::Artifact;
    use crate::models::common::{EnrichmentFocus, PipelineStage};
    use crate::models::curriculum::LessonRequest;
    use crate::models::run_log::RunLog;
    use crate::tests::support::{
        maths_corpus,
        RecordingRetrieval,
        RetrievalEvent,
        ScriptedGateway,
        StalledRetrieval,
        ENRICH_EXAMPLES_MARKER,
        QUALITY_JSON,
    };
    use crate::traits::agent::Agent;
    use crate::traits::retrieval_provider::RetrievalProvider;

    const BASE_TYPES: [&str; 5] = ["Introduction", "Core Content", "Examples", "Practice Activities", "Summary"];

    fn setup() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn quadratic_request() -> LessonRequest {
        LessonRequest::new("Mathematics", "Quadratic Equations", "10").with_subtopics(
            "Factorisation, Quadratic formula"
        )
    }

    fn pipeline(gateway: Arc<ScriptedGateway>, retrieval: Arc<dyn RetrievalProvider>) -> PipelineOrchestrator {
        PipelineBuilder::new(MiraConfig::default(), gateway)
            .with_retrieval(retrieval)
            .build()
            .expect("default configuration is valid")
    }

    fn component_types(artifact: &Artifact) -> Vec<String> {
        artifact.components
            .iter()
            .map(|c| c.component_type.clone())
            .collect()
    }

    fn orders(artifact: &Artifact) -> Vec<i32> {
        artifact.components
            .iter()
            .map(|c| c.order)
            .collect()
    }

    #[test]
    async fn test_quadratic_lesson_end_to_end() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(ScriptedGateway::lesson());
        let orchestrator = pipeline(gateway.clone(), Arc::new(NoopRetrieval));

        let run = orchestrator.run_with_report(quadratic_request()).await?;
        let artifact = run.artifact;
        info!("Generated {} with {} components", artifact.title, artifact.components.len());

        assert_eq!(artifact.title, "Quadratic Equations - Mathematics Lesson for 10");
        assert_eq!(artifact.components.len(), 7);
        assert_eq!(orders(&artifact), vec![1, 2, 3, 4, 5, 6, 7]);

        let types = component_types(&artifact);
        assert_eq!(&types[..5], &BASE_TYPES);
        assert_eq!(types[5], "Numerical Problem-Solving Strategies");
        assert_eq!(types[6], "Numerical Assessment");
        assert!(artifact.components.iter().all(|c| c.content == "Enriched content"));

        let metadata = &artifact.metadata;
        assert_eq!(metadata.subtopics, vec!["Factorisation", "Quadratic formula"]);
        assert_eq!(metadata.learning_objectives.len(), 2);
        assert_eq!(metadata.target_skills, vec!["Factorising trinomials", "Completing the square"]);
        assert_eq!(metadata.standards_alignment, vec!["CBSE Class 10 Chapter 4"]);
        assert_eq!(metadata.prerequisites, vec!["Linear equations", "Polynomials"]);
        assert!(artifact.quality_score.is_none());

        assert_eq!(run.log.stages(), vec![
            PipelineStage::Init,
            PipelineStage::RetrieveContext,
            PipelineStage::Curriculum,
            PipelineStage::Content,
            PipelineStage::Enrich,
            PipelineStage::Finalize,
            PipelineStage::Done
        ]);
        assert!(run.log.errors.is_empty());
        assert!(run.log.degraded_stages.is_empty());

        // one curriculum, one content, five rewrites and two appended sections
        assert_eq!(gateway.calls_for(PipelineStage::Curriculum).len(), 1);
        assert_eq!(gateway.calls_for(PipelineStage::Content).len(), 1);
        assert_eq!(gateway.calls_for(PipelineStage::Enrich).len(), 7);
        Ok(())
    }

    #[test]
    async fn test_silent_model_still_produces_artifact() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(ScriptedGateway::silent());
        let orchestrator = pipeline(gateway, Arc::new(NoopRetrieval));

        let run = orchestrator.run_with_report(LessonRequest::new("Biology", "Photosynthesis", "7")).await?;
        let artifact = &run.artifact;

        assert_eq!(artifact.components.len(), 7);
        assert!(artifact.components.iter().all(|c| !c.content.trim().is_empty()));
        assert_eq!(artifact.components[0].content, "Introduction to Photosynthesis");
        assert_eq!(artifact.components[5].content, "Numerical Problem-Solving Strategies for Photosynthesis");
        assert_eq!(artifact.metadata.learning_objectives, vec!["Understand Photosynthesis"]);
        assert_eq!(artifact.metadata.target_skills, vec!["Understanding of Photosynthesis"]);

        assert!(run.log.degraded_stages.contains(&PipelineStage::Curriculum));
        assert!(run.log.degraded_stages.contains(&PipelineStage::Content));
        let enrich_warning = run.log.errors
            .iter()
            .find(|e| e.stage == PipelineStage::Enrich)
            .expect("failed transforms are reported");
        assert_eq!(enrich_warning.severity, ErrorSeverity::Warning);
        assert!(enrich_warning.message.starts_with("5 "));
        Ok(())
    }

    #[test]
    async fn test_retrieval_does_not_change_artifact_shape() -> MiraResult<()> {
        setup();
        let without = pipeline(Arc::new(ScriptedGateway::lesson()), Arc::new(NoopRetrieval))
            .run(quadratic_request()).await?;
        let with = pipeline(
            Arc::new(ScriptedGateway::lesson()),
            Arc::new(InMemoryRetrieval::from_collections(maths_corpus()))
        )
            .run(quadratic_request()).await?;

        assert_eq!(component_types(&without), component_types(&with));
        assert_eq!(orders(&without), orders(&with));
        Ok(())
    }

    #[test]
    async fn test_repeated_runs_keep_component_order() -> MiraResult<()> {
        setup();
        let orchestrator = pipeline(Arc::new(ScriptedGateway::lesson()), Arc::new(NoopRetrieval));

        let first = orchestrator.run(quadratic_request()).await?;
        let second = orchestrator.run(quadratic_request()).await?;

        assert_eq!(component_types(&first), component_types(&second));
        assert_eq!(first.to_markdown(), second.to_markdown());
        Ok(())
    }

    #[test]
    async fn test_blank_required_field_rejected_before_any_call() {
        setup();
        let gateway = Arc::new(ScriptedGateway::lesson());
        let retrieval = Arc::new(RecordingRetrieval::with_collections(maths_corpus()));
        let orchestrator = pipeline(gateway.clone(), retrieval.clone());

        let request = LessonRequest::new("", "Quadratic Equations", "10").with_source_context("Some text");
        let result = orchestrator.run(request).await;
        assert!(matches!(result, Err(MiraError::Configuration(_))));

        let result = orchestrator.run(LessonRequest::new("Mathematics", "   ", "10")).await;
        assert!(matches!(result, Err(MiraError::Configuration(_))));

        assert_eq!(gateway.call_count(), 0);
        assert!(retrieval.events().is_empty());
    }

    #[test]
    async fn test_failed_transform_keeps_original_content() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(ScriptedGateway::lesson().fail_when(ENRICH_EXAMPLES_MARKER));
        let orchestrator = pipeline(gateway, Arc::new(NoopRetrieval));

        let run = orchestrator.run_with_report(quadratic_request()).await?;
        let components = &run.artifact.components;

        assert_eq!(components.len(), 7);
        assert_eq!(orders(&run.artifact), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(components[2].component_type, "Examples");
        assert_eq!(components[2].content, "Solve x^2 - 5x + 6 = 0. Factorising gives (x - 2)(x - 3) = 0.");
        for (i, component) in components.iter().enumerate().filter(|(i, _)| *i != 2) {
            assert_eq!(component.content, "Enriched content", "component {} should be enriched", i);
        }

        assert_eq!(run.log.errors.len(), 1);
        assert_eq!(run.log.errors[0].stage, PipelineStage::Enrich);
        assert!(run.log.errors[0].message.starts_with("1 "));
        Ok(())
    }

    #[test]
    async fn test_agents_search_their_collections_with_filters() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(ScriptedGateway::lesson());
        let retrieval = Arc::new(RecordingRetrieval::with_collections(maths_corpus()));
        let orchestrator = pipeline(gateway.clone(), retrieval.clone());

        orchestrator.run(quadratic_request()).await?;

        let expected = [
            ("curriculum", "curriculum", 5),
            ("content", "ncert", 5),
            ("question_bank", "question_bank", 3),
        ];
        for (collection, source_type, expected_k) in expected {
            let Some(RetrievalEvent::Search { k, filter, .. }) = retrieval.search_for(collection) else {
                panic!("no search against {}", collection);
            };
            assert_eq!(k, expected_k);
            assert_eq!(filter.get("source_type"), Some(source_type));
            assert_eq!(filter.get("class"), Some("10"));
            assert_eq!(filter.get("subject"), Some("Mathematics"));
        }

        let curriculum_prompt = gateway.calls_for(PipelineStage::Curriculum)[0].prompt().to_string();
        assert!(curriculum_prompt.contains("Curriculum database context"));
        assert!(curriculum_prompt.contains("solution by factorisation and formula"));

        let enrich_prompt = gateway.calls_for(PipelineStage::Enrich)[0].prompt().to_string();
        assert!(enrich_prompt.contains("2x^2 - 7x + 3 = 0"));
        Ok(())
    }

    #[test]
    async fn test_source_document_indexed_before_search() -> MiraResult<()> {
        setup();
        let source = "Chlorophyll absorbs light in the leaves.\n\n\
            Quadratic equations appear when projectile height is modelled over time.\n\n\
            The water cycle moves water between oceans and the sky.";
        let gateway = Arc::new(ScriptedGateway::lesson());
        let retrieval = Arc::new(RecordingRetrieval::new());
        let orchestrator = pipeline(gateway.clone(), retrieval.clone());

        orchestrator.run(quadratic_request().with_source_context(source)).await?;

        let events = retrieval.events();
        let collection = source_collection_name(source);
        assert!(matches!(&events[0], RetrievalEvent::Index { collection: c, count } if *c == collection && *count > 0));
        let RetrievalEvent::Search { collection: searched, k, filter, .. } = &events[1] else {
            panic!("source search should follow indexing, got {:?}", events[1]);
        };
        assert_eq!(searched, &collection);
        assert_eq!(*k, 5);
        assert!(filter.is_empty());

        let curriculum_prompt = gateway.calls_for(PipelineStage::Curriculum)[0].prompt().to_string();
        assert!(curriculum_prompt.contains("Source document context"));
        assert!(curriculum_prompt.contains("projectile height"));
        Ok(())
    }

    #[test]
    async fn test_source_document_without_indexing_uses_leading_chunks() -> MiraResult<()> {
        setup();
        let source = "Photosynthesis converts light energy into chemical energy.";

        let gateway = Arc::new(ScriptedGateway::lesson());
        let orchestrator = pipeline(gateway.clone(), Arc::new(NoopRetrieval));
        orchestrator.run(quadratic_request().with_source_context(source)).await?;
        let prompt = gateway.calls_for(PipelineStage::Curriculum)[0].prompt().to_string();
        assert!(prompt.contains(source));

        let gateway = Arc::new(ScriptedGateway::lesson());
        let retrieval = Arc::new(RecordingRetrieval::new().read_only());
        let orchestrator = pipeline(gateway.clone(), retrieval.clone());
        orchestrator.run(quadratic_request().with_source_context(source)).await?;

        let collection = source_collection_name(source);
        assert!(matches!(&retrieval.events()[0], RetrievalEvent::Index { count: 0, .. }));
        assert!(retrieval.search_for(&collection).is_none());
        let prompt = gateway.calls_for(PipelineStage::Curriculum)[0].prompt().to_string();
        assert!(prompt.contains(source));
        Ok(())
    }

    #[test]
    async fn test_source_collection_dropped_after_run() -> MiraResult<()> {
        setup();
        let retrieval = Arc::new(InMemoryRetrieval::from_collections(maths_corpus()));
        let orchestrator = pipeline(Arc::new(ScriptedGateway::lesson()), retrieval.clone());

        let sources = [
            "Projectile height follows a quadratic in time.",
            "The area of a rectangular garden gives a quadratic in its width.",
            "Compound interest over two years is quadratic in the rate.",
        ];
        for source in sources {
            orchestrator.run(quadratic_request().with_source_context(source)).await?;
            assert_eq!(retrieval.collection_len(&source_collection_name(source)).await, 0);
        }
        assert_eq!(retrieval.collection_count().await, 3);
        assert_eq!(retrieval.collection_len("question_bank").await, 1);
        Ok(())
    }

    #[test]
    async fn test_source_collection_dropped_after_search() -> MiraResult<()> {
        setup();
        let source = "Quadratic equations appear when projectile height is modelled over time.";
        let retrieval = Arc::new(RecordingRetrieval::new());
        let orchestrator = pipeline(Arc::new(ScriptedGateway::lesson()), retrieval.clone());

        orchestrator.run(quadratic_request().with_source_context(source)).await?;

        let collection = source_collection_name(source);
        let events = retrieval.events();
        assert!(matches!(&events[1], RetrievalEvent::Search { collection: c, .. } if *c == collection));
        assert_eq!(events[2], RetrievalEvent::Drop { collection: collection.clone() });
        assert_eq!(retrieval.collection_len(&collection).await, 0);
        Ok(())
    }

    #[test]
    async fn test_stalled_retrieval_times_out_without_changing_shape() -> MiraResult<()> {
        setup();
        let source = "Quadratic equations appear when projectile height is modelled over time.";
        let mut config = MiraConfig::default();
        config.pipeline.retrieval_timeout_secs = 1;
        let gateway = Arc::new(ScriptedGateway::lesson());
        let orchestrator = PipelineBuilder::new(config, gateway.clone())
            .with_retrieval(Arc::new(StalledRetrieval { stall: Duration::from_secs(30) }))
            .build()?;

        let run = orchestrator.run_with_report(quadratic_request().with_source_context(source)).await?;

        let types = component_types(&run.artifact);
        assert_eq!(&types[..5], &BASE_TYPES);
        assert_eq!(orders(&run.artifact), vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(
            run.log.errors
                .iter()
                .any(|e| e.stage == PipelineStage::RetrieveContext && e.message == "Indexing timed out")
        );

        // stalled searches leave only the leading source chunks as context
        let curriculum_prompt = gateway.calls_for(PipelineStage::Curriculum)[0].prompt().to_string();
        assert!(!curriculum_prompt.contains("Curriculum database context"));
        assert!(curriculum_prompt.contains("projectile height"));
        let enrich_prompt = gateway.calls_for(PipelineStage::Enrich)[0].prompt().to_string();
        assert!(!enrich_prompt.contains("Question bank context"));
        Ok(())
    }

    #[test]
    async fn test_enrichment_keeps_order_when_rewrites_finish_out_of_order() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(
            ScriptedGateway::lesson()
                .delay_when("following introduction for", Duration::from_millis(300))
                .delay_when("following core content for", Duration::from_millis(200))
                .delay_when(ENRICH_EXAMPLES_MARKER, Duration::from_millis(100))
                .respond_when("following introduction for", "Slow introduction")
                .respond_when("following summary for", "Fast summary")
        );
        let orchestrator = pipeline(gateway, Arc::new(NoopRetrieval));

        let artifact = orchestrator.run(quadratic_request()).await?;

        let types = component_types(&artifact);
        assert_eq!(&types[..5], &BASE_TYPES);
        assert_eq!(types[5], "Numerical Problem-Solving Strategies");
        assert_eq!(types[6], "Numerical Assessment");
        assert_eq!(orders(&artifact), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(artifact.components[0].content, "Slow introduction");
        assert_eq!(artifact.components[4].content, "Fast summary");
        Ok(())
    }

    #[test]
    async fn test_quality_review_refines_mentioned_components() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(
            ScriptedGateway::lesson()
                .respond(PipelineStage::QualityReview, QUALITY_JSON)
                .respond(PipelineStage::Refine, "Refined examples")
        );
        let orchestrator = PipelineBuilder::new(MiraConfig::default(), gateway.clone())
            .with_quality_review(true)
            .build()?;
        assert!(orchestrator.has_quality_review());

        let run = orchestrator.run_with_report(quadratic_request()).await?;
        let artifact = &run.artifact;

        assert_eq!(artifact.quality_score, Some(8.5));
        assert_eq!(artifact.feedback, vec![
            "Problem Exposure: Add more solved examples".to_string(),
            "Overall: Solid lesson overall".to_string()
        ]);
        assert_eq!(artifact.components.len(), 7);
        assert_eq!(artifact.components[2].content, "Refined examples");
        assert!(
            artifact.components
                .iter()
                .filter(|c| c.component_type != "Examples")
                .all(|c| c.content == "Enriched content")
        );

        assert_eq!(gateway.calls_for(PipelineStage::QualityReview).len(), 1);
        assert_eq!(gateway.calls_for(PipelineStage::Refine).len(), 1);
        let stages = run.log.stages();
        assert!(stages.contains(&PipelineStage::QualityReview));
        assert!(stages.contains(&PipelineStage::Refine));
        Ok(())
    }

    #[test]
    async fn test_quality_review_disabled_by_default() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(ScriptedGateway::lesson().respond(PipelineStage::QualityReview, QUALITY_JSON));
        let orchestrator = pipeline(gateway.clone(), Arc::new(NoopRetrieval));
        assert!(!orchestrator.has_quality_review());

        let artifact = orchestrator.run(quadratic_request()).await?;

        assert!(artifact.quality_score.is_none());
        assert!(artifact.feedback.is_empty());
        assert!(gateway.calls_for(PipelineStage::QualityReview).is_empty());
        Ok(())
    }

    #[test]
    async fn test_problem_solving_focus_appends_its_sections() -> MiraResult<()> {
        setup();
        let orchestrator = PipelineBuilder::new(MiraConfig::default(), Arc::new(ScriptedGateway::silent()))
            .with_enrichment_focus(EnrichmentFocus::ProblemSolving)
            .build()?;

        let artifact = orchestrator.run(LessonRequest::new("Physics", "Motion", "9")).await?;

        assert_eq!(artifact.components[5].component_type, "Problem-Solving Techniques");
        assert_eq!(artifact.components[5].order, 6);
        assert_eq!(artifact.components[6].component_type, "Problem-Based Assessment");
        assert_eq!(artifact.components[6].content, "Problem-Based Assessment for Motion");
        Ok(())
    }

    #[test]
    async fn test_cancelled_run_stops_at_stage_boundary() {
        setup();
        let gateway = Arc::new(ScriptedGateway::lesson());
        let flag = CancellationFlag::new();
        let orchestrator = PipelineBuilder::new(MiraConfig::default(), gateway.clone())
            .with_cancellation(flag.clone())
            .build()
            .expect("default configuration is valid");

        flag.cancel();
        let result = orchestrator.run(quadratic_request()).await;

        match result {
            Err(MiraError::Cancelled { stage }) => assert_eq!(stage, "Context Retrieval"),
            other => panic!("expected cancellation, got {:?}", other.map(|a| a.title)),
        }
        assert_eq!(gateway.call_count(), 0);
    }

    #[test]
    async fn test_artifact_json_round_trip() -> MiraResult<()> {
        setup();
        let gateway = Arc::new(
            ScriptedGateway::lesson()
                .respond(PipelineStage::QualityReview, QUALITY_JSON)
                .respond(PipelineStage::Refine, "Refined examples")
        );
        let orchestrator = PipelineBuilder::new(MiraConfig::default(), gateway).with_quality_review(true).build()?;
        let artifact = orchestrator.run(quadratic_request()).await?;

        let decoded = Artifact::from_json(&artifact.to_json()?)?;
        assert_eq!(decoded, artifact);
        Ok(())
    }

    #[test]
    async fn test_invalid_configuration_fails_build() {
        setup();
        let mut config = MiraConfig::default();
        config.pipeline.content_temperature = 2.5;

        let result = PipelineBuilder::new(config, Arc::new(ScriptedGateway::silent())).build();
        assert!(matches!(result, Err(MiraError::Config(_))));
    }

    struct FailingAgent {
        error: fn() -> MiraError,
    }

    #[async_trait]
    impl Agent for FailingAgent {
        type Input = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "Failing"
        }

        fn stage(&self) -> PipelineStage {
            PipelineStage::Content
        }

        async fn process(&self, _input: &String) -> MiraResult<String> {
            Err((self.error)())
        }

        fn fallback(&self, input: &String) -> String {
            format!("fallback for {}", input)
        }
    }

    #[test]
    async fn test_recoverable_stage_failure_uses_fallback() -> MiraResult<()> {
        setup();
        let agent = FailingAgent { error: || MiraError::Transport("connection reset".to_string()) };
        let mut log = RunLog::default();

        let output = run_stage(&agent, &"Motion".to_string(), &mut log).await?;

        assert_eq!(output, "fallback for Motion");
        assert_eq!(log.errors.len(), 1);
        assert_eq!(log.errors[0].severity, ErrorSeverity::Warning);
        assert_eq!(log.degraded_stages, vec![PipelineStage::Content]);
        Ok(())
    }

    #[test]
    async fn test_fatal_stage_failure_propagates() {
        setup();
        let agent = FailingAgent { error: || MiraError::Configuration("bad".to_string()) };
        let mut log = RunLog::default();

        let result = run_stage(&agent, &"Motion".to_string(), &mut log).await;

        assert!(matches!(result, Err(MiraError::Configuration(_))));
        assert!(log.errors.is_empty());
        assert!(log.degraded_stages.is_empty());
    }
}
