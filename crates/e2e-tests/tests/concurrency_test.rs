//! Concurrent queries while ingestion writes to the same index.

use std::thread;

use e2e_tests::{doc_metadata, random_text, TestHarness};

#[test]
fn test_queries_during_ingestion() {
    let harness = TestHarness::with_batch_size(4);
    harness
        .pipeline
        .ingest("seed document", doc_metadata("text", "Seed"), 500, 100)
        .unwrap();

    // Every ingest below adds exactly 3 chunks (90 chars, window 30, no overlap)
    let docs: Vec<String> = (0..10)
        .map(|_| {
            let mut text = random_text(40);
            text.truncate(90);
            while text.chars().count() < 90 {
                text.push('x');
            }
            text
        })
        .collect();

    thread::scope(|s| {
        s.spawn(|| {
            for doc in &docs {
                let added = harness
                    .pipeline
                    .ingest(doc, doc_metadata("text", "Bulk"), 30, 0)
                    .unwrap();
                assert_eq!(added, 3);
            }
        });

        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..25 {
                    let count = harness.index.status().unwrap().record_count;
                    assert_eq!((count - 1) % 3, 0);

                    let hits = harness.retrieval.query("seed document", 2).unwrap();
                    assert!(!hits.is_empty());
                    assert!(hits.len() <= 2);
                }
            });
        }
    });

    assert_eq!(harness.index.status().unwrap().record_count, 31);
}
