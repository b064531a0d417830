//! Full embedding runs against the in-memory store.

use std::sync::Arc;

use biokg_core::{EmbeddingConfig, IngestConfig, RawRecord};
use biokg_embeddings::{EmbeddingError, EmbeddingOrchestrator, EmbeddingStage};
use biokg_graph::{GraphIngestor, GraphStore, InMemoryGraphStore};

async fn loaded_store(ids: &[&str]) -> Arc<InMemoryGraphStore> {
    let store = Arc::new(InMemoryGraphStore::new());
    let ingestor = GraphIngestor::new(store.clone(), IngestConfig::default());
    let records: Vec<RawRecord> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| RawRecord::from_pairs(i as u64 + 2, [("id", *id), ("category", "biolink:Gene")]))
        .collect();
    ingestor.load_entities(&records).await.unwrap();
    store
}

fn config(dimension: usize) -> EmbeddingConfig {
    EmbeddingConfig {
        dimension,
        random_seed: Some(42),
        ..EmbeddingConfig::default()
    }
}

fn read_rows(path: &std::path::Path) -> (Vec<String>, Vec<(String, String)>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string())
        })
        .collect();
    (header, rows)
}

#[tokio::test]
async fn export_has_one_row_per_entity_with_configured_length() {
    let store = loaded_store(&["A", "B", "C"]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.csv");

    let mut orchestrator = EmbeddingOrchestrator::new(store, config(16));
    let report = orchestrator.run(&path).await.unwrap();

    assert!(!report.dropped_stale);
    assert_eq!(report.projection.node_count, 3);
    assert_eq!(report.compute.node_properties_written, 3);
    assert_eq!(report.export.rows, 3);

    let (header, rows) = read_rows(&path);
    assert_eq!(header, vec!["id", "fastrp_vector"]);
    let ids: Vec<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    for (_, vector) in &rows {
        assert_eq!(biokg_core::parse_vector(vector, 16).unwrap().len(), 16);
    }
}

#[tokio::test]
async fn second_run_drops_stale_projection_and_overwrites() {
    let store = loaded_store(&["A", "B"]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.csv");

    let mut first = EmbeddingOrchestrator::new(store.clone(), config(4));
    first.run(&path).await.unwrap();
    let (_, first_rows) = read_rows(&path);

    let mut second = EmbeddingOrchestrator::new(store, config(4));
    let report = second.run(&path).await.unwrap();
    let (_, second_rows) = read_rows(&path);

    assert!(report.dropped_stale);
    assert_eq!(first_rows, second_rows);
}

#[tokio::test]
async fn nodes_without_the_property_are_not_exported() {
    let store = loaded_store(&["A", "B"]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.csv");

    let mut orchestrator = EmbeddingOrchestrator::new(store.clone(), config(4));
    orchestrator.drop_projection().await.unwrap();
    orchestrator.project().await.unwrap();
    orchestrator.estimate().await.unwrap();
    orchestrator.compute().await.unwrap();

    let late = RawRecord::from_pairs(9, [("id", "Z")]);
    GraphIngestor::new(store.clone(), IngestConfig::default())
        .load_entities(&[late])
        .await
        .unwrap();
    assert_eq!(store.count_nodes().await.unwrap(), 3);

    let summary = orchestrator.export(&path).await.unwrap();
    assert_eq!(summary.rows, 2);
}

#[tokio::test]
async fn dimension_mismatch_aborts_export() {
    let store = loaded_store(&["A"]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.csv");

    let mut writer = EmbeddingOrchestrator::new(store.clone(), config(4));
    writer.run(&path).await.unwrap();

    let reader = EmbeddingOrchestrator::new(store, config(8));
    let err = reader.export(dir.path().join("other.csv")).await.unwrap_err();
    assert!(matches!(err, EmbeddingError::InconsistentExport { .. }));
    assert_eq!(err.stage(), Some(EmbeddingStage::Export));
}

#[tokio::test]
async fn export_spans_pages_and_leaves_no_staging_file() {
    let ids = ["E", "C", "A", "D", "B"];
    let store = loaded_store(&ids).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.csv");

    let config = EmbeddingConfig {
        export_page_size: 2,
        ..config(4)
    };
    let report = EmbeddingOrchestrator::new(store, config)
        .run(&path)
        .await
        .unwrap();

    assert_eq!(report.export.rows, 5);
    let (_, rows) = read_rows(&path);
    let exported: Vec<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(exported, vec!["A", "B", "C", "D", "E"]);
    assert!(!biokg_embeddings::partial_path(&path).exists());
}

#[tokio::test]
async fn failed_export_keeps_previous_file() {
    let store = loaded_store(&["A", "B"]).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.csv");

    let mut orchestrator = EmbeddingOrchestrator::new(store.clone(), config(4));
    orchestrator.run(&path).await.unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mismatched = EmbeddingOrchestrator::new(store, config(8));
    assert!(mismatched.export(&path).await.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert!(!biokg_embeddings::partial_path(&path).exists());
}
