//! End-to-end labeling runs against an in-memory index.

mod common;

use common::{records, test_config, MockIndex, StaticMapping, UnreachableMapping};
use ineo_labeling::pipeline::RecordSource;
use ineo_labeling::{InputRecord, LabelingError, LabelingOrchestrator};
use std::sync::atomic::Ordering;
use std::sync::Arc;

const MAPPING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<datasets default="false">
    <provider name="Meertens Institute - Research Collections">
        <profile>clarin.eu:cr1:p_1440426460262</profile>
    </provider>
    <provider name="The Language Archive">
        <level>0</level>
    </provider>
    <provider name="DANS">
        <default>true</default>
    </provider>
    <root name="CLARIN Partners">
        <default>true</default>
    </root>
</datasets>
"#;

fn mixed_records() -> Vec<InputRecord> {
    vec![
        InputRecord::new("meertens-match", "Meertens Institute - Research Collections")
            .with_profile("clarin.eu:cr1:p_1440426460262"),
        InputRecord::new("meertens-other", "Meertens Institute - Research Collections")
            .with_profile("clarin.eu:cr1:p_0"),
        InputRecord::new("tla-top", "The Language Archive").with_level("0"),
        InputRecord::new("tla-deep", "The Language Archive").with_level(3),
        InputRecord::new("dans", "DANS"),
        InputRecord::new("clarin", "CLARIN Partners"),
        InputRecord::new("unknown", "Somebody Else"),
        InputRecord {
            id: Some("no-provider".to_string()),
            ..InputRecord::default()
        },
    ]
}

#[tokio::test]
async fn test_full_run_labels_and_reports() {
    let index = Arc::new(MockIndex::with_docs(mixed_records()));
    let orchestrator = LabelingOrchestrator::new(
        test_config(3, 4),
        index.clone(),
        Arc::new(StaticMapping::new(MAPPING)),
    );

    let summary = orchestrator.run().await.expect("run should succeed");

    assert_eq!(summary.records_seen, 8);
    assert_eq!(summary.labeled_true, 4);
    assert_eq!(summary.labeled_false, 3);
    assert_eq!(summary.resolution_failures.len(), 1);
    assert_eq!(summary.resolution_failures[0].id, "no-provider");
    assert_eq!(summary.updates_succeeded, 7);
    assert!(summary.update_failures.is_empty());
    assert!(!summary.dry_run);

    assert_eq!(index.flag("meertens-match"), Some(true));
    assert_eq!(index.flag("meertens-other"), Some(false));
    assert_eq!(index.flag("tla-top"), Some(true));
    assert_eq!(index.flag("tla-deep"), Some(false));
    assert_eq!(index.flag("dans"), Some(true));
    assert_eq!(index.flag("clarin"), Some(true));
    assert_eq!(index.flag("unknown"), Some(false));
    assert_eq!(index.flag("no-provider"), None);
}

#[tokio::test]
async fn test_pagination_covers_num_found_exactly() {
    let index = Arc::new(MockIndex::with_docs(records("doc", "DANS", 25_000)));
    let source = RecordSource::new(index.clone(), 10_000, 4);

    let fetched = source.fetch_all("*:*").await.unwrap();

    assert_eq!(fetched.len(), 25_000);
    assert_eq!(
        index.page_requests(),
        vec![(0, 10_000), (10_000, 10_000), (20_000, 10_000)]
    );
    // One zero-row count request plus three pages
    assert_eq!(index.selects.lock().len(), 4);
    assert_eq!(index.selects.lock()[0], (0, 0));
}

#[tokio::test]
async fn test_empty_index_issues_only_count_request() {
    let index = Arc::new(MockIndex::with_docs(Vec::new()));
    let orchestrator = LabelingOrchestrator::new(
        test_config(10, 2),
        index.clone(),
        Arc::new(StaticMapping::new(MAPPING)),
    );

    let summary = orchestrator.run().await.unwrap();
    assert_eq!(summary.records_seen, 0);
    assert_eq!(index.selects.lock().len(), 1);
    assert_eq!(index.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_page_aborts_run_without_updates() {
    let index = Arc::new(MockIndex::with_docs(records("doc", "DANS", 25)).failing_page(10));
    let orchestrator = LabelingOrchestrator::new(
        test_config(10, 2),
        index.clone(),
        Arc::new(StaticMapping::new(MAPPING)),
    );

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, LabelingError::Fetch(_)));
    assert!(err.is_fatal());
    assert_eq!(index.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_mapping_failures_are_fatal_before_fetch() {
    let index = Arc::new(MockIndex::with_docs(records("doc", "DANS", 5)));

    let unreachable = LabelingOrchestrator::new(
        test_config(10, 2),
        index.clone(),
        Arc::new(UnreachableMapping),
    );
    assert!(matches!(
        unreachable.run().await.unwrap_err(),
        LabelingError::MappingFetch { .. }
    ));

    let malformed = LabelingOrchestrator::new(
        test_config(10, 2),
        index.clone(),
        Arc::new(StaticMapping::new(
            r#"<datasets><provider name="DANS"><level>high</level></provider></datasets>"#,
        )),
    );
    assert!(matches!(
        malformed.run().await.unwrap_err(),
        LabelingError::MappingParse(_)
    ));

    assert!(index.selects.lock().is_empty());
}

#[tokio::test]
async fn test_update_failures_are_reported_not_fatal() {
    let index = Arc::new(
        MockIndex::with_docs(records("doc", "DANS", 20))
            .failing_update("doc-3")
            .failing_update("doc-17"),
    );
    let orchestrator = LabelingOrchestrator::new(
        test_config(6, 3),
        index.clone(),
        Arc::new(StaticMapping::new(MAPPING)),
    );

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.updates_succeeded, 18);
    let mut failed: Vec<String> = summary.update_failures.iter().map(|f| f.id.clone()).collect();
    failed.sort();
    assert_eq!(failed, vec!["doc-17".to_string(), "doc-3".to_string()]);
    assert!(summary.update_failures[0].cause.contains("HTTP 500"));
    assert!(summary.has_record_failures());
    assert_eq!(index.update_calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_wrongly_typed_document_is_a_record_failure() {
    let docs: Vec<InputRecord> = serde_json::from_value(serde_json::json!([
        { "id": "dans-1", "dataProvider": "DANS" },
        { "id": "multi", "dataProvider": ["DANS", "CLARIN Partners"] },
        { "id": "dans-2", "dataProvider": "DANS", "_hierarchyWeight": "2" },
    ]))
    .unwrap();
    let index = Arc::new(MockIndex::with_docs(docs));
    let orchestrator = LabelingOrchestrator::new(
        test_config(10, 2),
        index.clone(),
        Arc::new(StaticMapping::new(MAPPING)),
    );

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.records_seen, 3);
    assert_eq!(summary.labeled_true, 2);
    assert_eq!(summary.resolution_failures.len(), 1);
    assert_eq!(summary.resolution_failures[0].id, "multi");
    assert!(summary.resolution_failures[0].cause.contains("dataProvider"));
    assert_eq!(index.flag("dans-1"), Some(true));
    assert_eq!(index.flag("dans-2"), Some(true));
    assert_eq!(index.flag("multi"), None);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let index = Arc::new(MockIndex::with_docs(mixed_records()));
    let mut config = test_config(5, 2);
    config.dry_run = true;

    let summary = LabelingOrchestrator::new(config, index.clone(), Arc::new(StaticMapping::new(MAPPING)))
        .run()
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.labeled_true, 4);
    assert_eq!(summary.updates_succeeded, 0);
    assert_eq!(index.update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let index = Arc::new(MockIndex::with_docs(mixed_records()));
    let mapping = Arc::new(StaticMapping::new(MAPPING));

    let first = LabelingOrchestrator::new(test_config(2, 4), index.clone(), mapping.clone())
        .run()
        .await
        .unwrap();
    let first_flags = index.flags.lock().clone();

    let second = LabelingOrchestrator::new(test_config(7, 1), index.clone(), mapping.clone())
        .run()
        .await
        .unwrap();
    let second_flags = index.flags.lock().clone();

    assert_eq!(first_flags, second_flags);
    assert_eq!(first.labeled_true, second.labeled_true);
    assert_eq!(first.labeled_false, second.labeled_false);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(mapping.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_custom_flag_field_and_commit_window() {
    let index = Arc::new(MockIndex::with_docs(records("doc", "DANS", 1)));
    let mut config = test_config(10, 1);
    config.index.flag_field = "in_scope".to_string();
    config.index.commit_within_ms = 5_000;

    let summary = LabelingOrchestrator::new(config, index.clone(), Arc::new(StaticMapping::new(MAPPING)))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.updates_succeeded, 1);
    let applied = index.applied.lock();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].id, "doc-0");
    assert_eq!(applied[0].field, "in_scope");
    assert_eq!(applied[0].commit_within_ms, 5_000);
    assert!(applied[0].value);
}

#[test]
fn test_summary_serializes_for_reporting() {
    let index = Arc::new(MockIndex::with_docs(mixed_records()));
    let orchestrator =
        LabelingOrchestrator::new(test_config(4, 2), index, Arc::new(StaticMapping::new(MAPPING)));
    let summary = tokio_test::block_on(orchestrator.run()).unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["records_seen"], 8);
    assert_eq!(json["resolution_failures"][0]["id"], "no-provider");
}
