//! Compile-time checks that the public types can cross task boundaries.

use static_assertions::assert_impl_all;

use research_pipeline::{
    AgenticRag, CritiqueResult, DocumentReviewer, PipelineError, RagOutcome, ResearchPipeline,
    ResearchReport, RetryingProvider, ScriptedProvider, StaticRetriever, SyntheticRetriever,
    UsageTracker, WorkflowState,
};

assert_impl_all!(ResearchPipeline: Send, Sync);
assert_impl_all!(AgenticRag: Send, Sync);
assert_impl_all!(DocumentReviewer: Send, Sync);
assert_impl_all!(WorkflowState: Send, Sync, Clone);
assert_impl_all!(ResearchReport: Send, Sync);
assert_impl_all!(RagOutcome: Send, Sync);
assert_impl_all!(CritiqueResult: Send, Sync);
assert_impl_all!(PipelineError: Send, Sync, std::error::Error);
assert_impl_all!(ScriptedProvider: Send, Sync);
assert_impl_all!(UsageTracker<ScriptedProvider>: Send, Sync);
assert_impl_all!(RetryingProvider<ScriptedProvider>: Send, Sync);
assert_impl_all!(StaticRetriever: Send, Sync);
assert_impl_all!(SyntheticRetriever: Send, Sync);

#[tokio::test]
async fn test_pipeline_runs_on_spawned_task() {
    use std::sync::Arc;

    let llm = Arc::new(ScriptedProvider::from_texts([
        r#"["a"]"#,
        "- fact [1]",
        "Report [1]\n[1] A - https://example.com/a",
    ]));
    let pipeline = ResearchPipeline::new(llm, Arc::new(SyntheticRetriever));

    let report = tokio::spawn(async move { pipeline.run("spawned").await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.citations.len(), 1);
}
