//! End-to-end persistence tests: a saved index answers identically after reload.

use pretty_assertions::assert_eq;

use docsearch_retrieval::RetrievalService;
use docsearch_types::RecordId;
use docsearch_vector::{SharedIndex, VectorError};
use e2e_tests::{doc_metadata, random_text, TestHarness};

#[test]
fn test_reopened_index_gives_identical_results() {
    let harness = TestHarness::new();
    for i in 0..5 {
        harness
            .pipeline
            .ingest(&random_text(60), doc_metadata("pdf", &format!("Doc {}", i)), 120, 20)
            .unwrap();
    }

    let query = random_text(8);
    let before = harness.retrieval.query(&query, 5).unwrap();

    let reopened = SharedIndex::open(&harness.index_path).unwrap();
    let service = RetrievalService::new(harness.embedder.clone(), reopened.clone());
    let after = service.query(&query, 5).unwrap();

    assert_eq!(before, after);
    assert_eq!(
        reopened.status().unwrap(),
        harness.index.status().unwrap()
    );
}

#[test]
fn test_ids_keep_growing_across_restarts() {
    let harness = TestHarness::new();
    harness
        .pipeline
        .ingest("first run", doc_metadata("text", "One"), 500, 100)
        .unwrap();

    let reopened = SharedIndex::open(&harness.index_path).unwrap();
    let ids = reopened
        .append(
            harness.index.status().unwrap().dimension.unwrap(),
            vec![(
                vec![0.5; e2e_tests::TEST_DIM],
                docsearch_types::Chunk::new("second run", Default::default(), 0),
            )],
        )
        .unwrap();
    assert_eq!(ids, vec![RecordId(2)]);
}

#[test]
fn test_missing_artifact_reported() {
    let harness = TestHarness::new();
    harness
        .pipeline
        .ingest("something", doc_metadata("text", "One"), 500, 100)
        .unwrap();
    std::fs::remove_file(harness.index_path.join(docsearch_vector::VECTORS_FILE)).unwrap();

    assert!(matches!(
        harness.index.reload(),
        Err(VectorError::IndexNotFound(_))
    ));
    // In-memory copy is still intact
    assert_eq!(harness.index.status().unwrap().record_count, 1);

    harness.index.flush().unwrap();
    assert!(harness.index.reload().is_ok());
}
