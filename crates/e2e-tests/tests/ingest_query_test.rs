//! End-to-end ingest -> index -> query tests for docsearch.

use pretty_assertions::assert_eq;

use docsearch_types::Metadata;
use e2e_tests::{doc_metadata, random_text, TestHarness, TEST_DIM};

const RUNBOOK: &str = "Restart the ingestion worker and confirm the queue drains";
const FINANCE: &str = "Quarterly budget review covers travel and hardware spending";
const SECURITY: &str = "Rotate database credentials every ninety days";

fn seed(harness: &TestHarness) {
    for (text, title) in [
        (RUNBOOK, "Ops Runbook"),
        (FINANCE, "Budget"),
        (SECURITY, "Security Policy"),
    ] {
        let added = harness
            .pipeline
            .ingest(text, doc_metadata("pdf", title), 500, 100)
            .unwrap();
        assert_eq!(added, 1);
    }
}

#[test]
fn test_exact_text_ranks_first() {
    let harness = TestHarness::new();
    seed(&harness);

    let hits = harness.retrieval.query(SECURITY, 3).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.text, SECURITY);
    assert_eq!(hits[0].title(), "Security Policy");
    assert_eq!(hits[0].source(), "pdf");
    assert!((hits[0].score - 1.0).abs() < 1e-5);

    let ranks: Vec<usize> = hits.iter().map(|h| h.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_top_k_is_bounded_by_index_size() {
    let harness = TestHarness::new();
    seed(&harness);

    assert_eq!(harness.retrieval.query("budget", 1).unwrap().len(), 1);
    assert_eq!(harness.retrieval.query("budget", 50).unwrap().len(), 3);
}

#[test]
fn test_empty_ingest_touches_nothing() {
    let harness = TestHarness::new();

    assert_eq!(harness.pipeline.ingest("", Metadata::new(), 500, 100).unwrap(), 0);
    assert!(!harness.index.status().unwrap().has_index);
    assert!(!harness.index_path.exists());
    assert!(harness.retrieval.query("anything", 5).unwrap().is_empty());
}

#[test]
fn test_long_document_is_chunked() {
    let harness = TestHarness::with_batch_size(3);
    let text = random_text(400);
    let expected = docsearch_ingest::split(&text, 200, 50).unwrap().len();

    let added = harness
        .pipeline
        .ingest(&text, doc_metadata("wiki", "Notes"), 200, 50)
        .unwrap();
    assert_eq!(added, expected);

    let status = harness.index.status().unwrap();
    assert_eq!(status.record_count, expected);
    assert_eq!(status.dimension, Some(TEST_DIM));

    // Metadata reaches every chunk
    let titles_ok = harness
        .index
        .read(|index| {
            index
                .unwrap()
                .records()
                .iter()
                .all(|r| r.chunk.meta("title") == Some("Notes"))
        })
        .unwrap();
    assert!(titles_ok);
}

#[test]
fn test_missing_metadata_falls_back_to_defaults() {
    let harness = TestHarness::new();
    harness
        .pipeline
        .ingest(RUNBOOK, Metadata::new(), 500, 100)
        .unwrap();

    let hit = &harness.retrieval.query(RUNBOOK, 1).unwrap()[0];
    assert_eq!(hit.title(), "Unknown Document");
    assert_eq!(hit.source(), "unknown");
    assert_eq!(hit.file_name(), "Unknown File");
}

#[tokio::test]
async fn test_async_query_path() {
    let harness = TestHarness::new();
    seed(&harness);

    let hits = harness.retrieval.query_async(RUNBOOK, 2).await.unwrap();
    assert_eq!(hits[0].chunk.text, RUNBOOK);
    assert_eq!(hits.len(), 2);
}
