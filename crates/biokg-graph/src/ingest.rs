//! Graph Ingestor: clear, entity load and relation load stages.
//!
//! Decoding and endpoint problems are per-record faults. They are collected
//! into a [`LoadReport`] and never abort a load. Store failures abort the
//! stage immediately with a [`GraphError`]; nothing written so far is rolled
//! back, so a failed load must be followed by a fresh clear.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use biokg_core::{
    decode_entity, decode_relation, read_records, DecodeFault, EntityDraft, IngestConfig,
    RawRecord, RelationDraft,
};

use crate::error::{GraphError, GraphResult};
use crate::store::{EdgeWrite, GraphStatus, GraphStore, NodeWrite};

/// Whether the operator agreed to wipe a non-empty store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeConfirmation {
    Unconfirmed,
    Confirmed,
}

impl From<bool> for WipeConfirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Unconfirmed
        }
    }
}

/// What the clear stage removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub nodes_removed: u64,
    pub relationships_removed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadStage {
    Entities,
    Relations,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entities => write!(f, "entity load"),
            Self::Relations => write!(f, "relation load"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointRole {
    Subject,
    Object,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "subject"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// One endpoint of a relation that names no stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEndpoint {
    pub role: EndpointRole,
    pub id: String,
}

/// A per-record problem collected during a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestFault {
    /// The record could not be decoded, or repeats an id.
    Decode(DecodeFault),
    /// The relation was not created because an endpoint is absent.
    EndpointMissing {
        position: u64,
        relation_id: String,
        missing: Vec<MissingEndpoint>,
    },
}

impl IngestFault {
    pub fn position(&self) -> u64 {
        match self {
            Self::Decode(fault) => fault.position,
            Self::EndpointMissing { position, .. } => *position,
        }
    }

    /// The id a reader should look up to fix this fault.
    pub fn offending_id(&self) -> String {
        match self {
            Self::Decode(fault) => fault
                .id
                .clone()
                .unwrap_or_else(|| format!("line {}", fault.position)),
            Self::EndpointMissing { missing, .. } => missing
                .iter()
                .map(|m| m.id.as_str())
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

impl fmt::Display for IngestFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(fault) => write!(f, "{}", fault),
            Self::EndpointMissing {
                position,
                relation_id,
                missing,
            } => {
                write!(f, "relation at line {} ('{}'): unknown ", position, relation_id)?;
                for (i, endpoint) in missing.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} '{}'", endpoint.role, endpoint.id)?;
                }
                Ok(())
            }
        }
    }
}

/// Outcome of one load stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub stage: LoadStage,
    /// Records read from the source.
    pub records: usize,
    /// Nodes or relationships the store reported as created.
    pub created: u64,
    /// Collected faults, ordered by source position.
    pub faults: Vec<IngestFault>,
}

impl LoadReport {
    fn new(stage: LoadStage, records: usize) -> Self {
        Self {
            stage,
            records,
            created: 0,
            faults: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn fault_count(&self) -> usize {
        self.faults.len()
    }

    /// Counts plus the offending ids of the first `preview` faults.
    pub fn summary(&self, preview: usize) -> String {
        let mut out = format!(
            "{}: {} records, {} created, {} faults",
            self.stage,
            self.records,
            self.created,
            self.faults.len()
        );
        if !self.faults.is_empty() && preview > 0 {
            let ids: Vec<String> = self
                .faults
                .iter()
                .take(preview)
                .map(IngestFault::offending_id)
                .collect();
            out.push_str(&format!(" (first: {}", ids.join(", ")));
            if self.faults.len() > preview {
                out.push_str(", ...");
            }
            out.push(')');
        }
        out
    }

    fn finish(mut self, preview: usize) -> Self {
        self.faults.sort_by_key(IngestFault::position);
        if self.is_clean() {
            info!("{}", self.summary(0));
        } else {
            warn!("{}", self.summary(preview));
        }
        self
    }
}

/// Outcome of clear → entities → relations → status.
#[derive(Debug, Clone)]
pub struct ReloadReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub cleared: ClearReport,
    pub entities: LoadReport,
    pub relations: LoadReport,
    pub status: GraphStatus,
}

impl ReloadReport {
    pub fn is_clean(&self) -> bool {
        self.entities.is_clean() && self.relations.is_clean()
    }
}

/// Writes decoded entities and relations into a [`GraphStore`].
pub struct GraphIngestor {
    store: Arc<dyn GraphStore>,
    config: IngestConfig,
}

impl GraphIngestor {
    pub fn new(store: Arc<dyn GraphStore>, config: IngestConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Remove everything from the store.
    ///
    /// A non-empty store is only wiped with [`WipeConfirmation::Confirmed`].
    pub async fn clear(&self, confirmation: WipeConfirmation) -> GraphResult<ClearReport> {
        let before = self.store.status().await?;
        if before.is_empty() {
            info!("Store already empty, nothing to clear");
            return Ok(ClearReport::default());
        }
        if confirmation != WipeConfirmation::Confirmed {
            return Err(GraphError::WipeNotConfirmed {
                nodes: before.nodes,
                relationships: before.relationships,
            });
        }
        self.store.clear().await?;
        info!(
            "Cleared {} nodes and {} relationships",
            before.nodes, before.relationships
        );
        Ok(ClearReport {
            nodes_removed: before.nodes,
            relationships_removed: before.relationships,
        })
    }

    pub async fn status(&self) -> GraphResult<GraphStatus> {
        self.store.status().await
    }

    pub async fn load_entities_from_path(&self, path: impl AsRef<Path>) -> GraphResult<LoadReport> {
        let path = path.as_ref();
        info!("Loading entities from {}", path.display());
        let records = read_records(path)?;
        self.load_entities(&records).await
    }

    /// Decode and create one node per distinct entity id.
    ///
    /// Ids repeated within `records`, or already present in the store, are
    /// reported as duplicates and not created.
    pub async fn load_entities(&self, records: &[RawRecord]) -> GraphResult<LoadReport> {
        let mut report = LoadReport::new(LoadStage::Entities, records.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
        let mut drafts: Vec<EntityDraft> = Vec::with_capacity(records.len());

        for record in records {
            match decode_entity(record) {
                Ok(draft) if !seen.insert(draft.id.clone()) => {
                    report.faults.push(IngestFault::Decode(DecodeFault::duplicate_id(
                        draft.position,
                        &draft.id,
                    )));
                }
                Ok(draft) => drafts.push(draft),
                Err(fault) => report.faults.push(IngestFault::Decode(fault)),
            }
        }

        for (index, batch) in drafts.chunks(self.config.batch_size).enumerate() {
            let ids: Vec<String> = batch.iter().map(|d| d.id.clone()).collect();
            let absent: HashSet<String> = self
                .store
                .find_missing_ids(&ids)
                .await?
                .into_iter()
                .collect();

            let mut writes = Vec::with_capacity(batch.len());
            for draft in batch {
                if !absent.contains(&draft.id) {
                    report.faults.push(IngestFault::Decode(DecodeFault::duplicate_id(
                        draft.position,
                        &draft.id,
                    )));
                    continue;
                }
                writes.push(NodeWrite {
                    labels: draft.labels(self.config.label_all_categories),
                    properties: draft.properties(),
                });
            }

            let created = self.store.create_entities(&writes).await?;
            debug!(batch = index, created, "entity batch committed");
            report.created += created;
        }

        Ok(report.finish(self.config.fault_preview))
    }

    pub async fn load_relations_from_path(
        &self,
        path: impl AsRef<Path>,
    ) -> GraphResult<LoadReport> {
        let path = path.as_ref();
        info!("Loading relations from {}", path.display());
        let records = read_records(path)?;
        self.load_relations(&records).await
    }

    /// Decode relations and create those whose endpoints both exist.
    pub async fn load_relations(&self, records: &[RawRecord]) -> GraphResult<LoadReport> {
        let mut report = LoadReport::new(LoadStage::Relations, records.len());
        let mut drafts: Vec<RelationDraft> = Vec::with_capacity(records.len());

        for record in records {
            match decode_relation(record) {
                Ok(draft) => drafts.push(draft),
                Err(fault) => report.faults.push(IngestFault::Decode(fault)),
            }
        }

        for (index, batch) in drafts.chunks(self.config.batch_size).enumerate() {
            let mut endpoints: Vec<String> = Vec::with_capacity(batch.len() * 2);
            let mut queued: HashSet<&str> = HashSet::with_capacity(batch.len() * 2);
            for draft in batch {
                for id in [&draft.subject, &draft.object] {
                    if queued.insert(id.as_str()) {
                        endpoints.push(id.clone());
                    }
                }
            }
            let absent: HashSet<String> = self
                .store
                .find_missing_ids(&endpoints)
                .await?
                .into_iter()
                .collect();

            let mut writes = Vec::with_capacity(batch.len());
            for draft in batch {
                let missing: Vec<MissingEndpoint> = [
                    (EndpointRole::Subject, &draft.subject),
                    (EndpointRole::Object, &draft.object),
                ]
                .into_iter()
                .filter(|(_, id)| absent.contains(id.as_str()))
                .map(|(role, id)| MissingEndpoint {
                    role,
                    id: id.clone(),
                })
                .collect();

                if !missing.is_empty() {
                    report.faults.push(IngestFault::EndpointMissing {
                        position: draft.position,
                        relation_id: draft.display_id(),
                        missing,
                    });
                    continue;
                }
                writes.push(EdgeWrite {
                    subject: draft.subject.clone(),
                    object: draft.object.clone(),
                    edge_type: draft.predicate.clone(),
                    properties: draft.properties(),
                });
            }

            let created = self.store.create_relations(&writes).await?;
            if created != writes.len() as u64 {
                warn!(
                    batch = index,
                    expected = writes.len(),
                    created,
                    "store created fewer relationships than requested; another writer may be active"
                );
            }
            debug!(batch = index, created, "relation batch committed");
            report.created += created;
        }

        Ok(report.finish(self.config.fault_preview))
    }

    /// Clear, load entities, load relations and report the final status.
    pub async fn reload(
        &self,
        nodes_path: impl AsRef<Path>,
        edges_path: impl AsRef<Path>,
        confirmation: WipeConfirmation,
    ) -> GraphResult<ReloadReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting graph reload");

        let cleared = self.clear(confirmation).await?;
        let entities = self.load_entities_from_path(nodes_path).await?;
        let relations = self.load_relations_from_path(edges_path).await?;
        let status = self.store.status().await?;
        info!(%run_id, nodes = status.nodes, relationships = status.relationships, "Graph reload finished");

        Ok(ReloadReport {
            run_id,
            started_at,
            cleared,
            entities,
            relations,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use biokg_core::DecodeFaultKind;

    use crate::store::{InMemoryGraphStore, StoreOperation};

    fn ingestor(store: &Arc<InMemoryGraphStore>, batch_size: usize) -> GraphIngestor {
        let config = IngestConfig {
            batch_size,
            ..IngestConfig::default()
        };
        GraphIngestor::new(store.clone(), config)
    }

    fn entity(line: u64, id: &str) -> RawRecord {
        RawRecord::from_pairs(line, [("id", id), ("category", "biolink:Gene")])
    }

    fn relation(line: u64, subject: &str, object: &str) -> RawRecord {
        RawRecord::from_pairs(
            line,
            [
                ("subject", subject),
                ("object", object),
                ("predicate", "biolink:interacts_with"),
            ],
        )
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_one_load() {
        let store = Arc::new(InMemoryGraphStore::new());
        let report = ingestor(&store, 2)
            .load_entities(&[entity(2, "A"), entity(3, "B"), entity(4, "A")])
            .await
            .unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.fault_count(), 1);
        match &report.faults[0] {
            IngestFault::Decode(fault) => {
                assert_eq!(fault.position, 4);
                assert_eq!(fault.kind, DecodeFaultKind::DuplicateId);
            }
            other => panic!("unexpected fault {other}"),
        }
    }

    #[tokio::test]
    async fn test_id_already_in_store_is_duplicate() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingest = ingestor(&store, 10);
        ingest.load_entities(&[entity(2, "A")]).await.unwrap();
        let report = ingest.load_entities(&[entity(2, "A")]).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(store.count_nodes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_id_is_fault_not_abort() {
        let store = Arc::new(InMemoryGraphStore::new());
        let blank = RawRecord::from_pairs(3, [("id", " "), ("name", "nameless")]);
        let report = ingestor(&store, 10)
            .load_entities(&[entity(2, "A"), blank])
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.faults[0].position(), 3);
        assert_eq!(report.faults[0].offending_id(), "line 3");
    }

    #[tokio::test]
    async fn test_labels_follow_category_setting() {
        let store = Arc::new(InMemoryGraphStore::new());
        let config = IngestConfig {
            label_all_categories: true,
            ..IngestConfig::default()
        };
        let record = RawRecord::from_pairs(
            2,
            [
                ("id", "A"),
                ("category", "biolink:Gene"),
                ("all_categories", "biolink:GeneǂBiologicalEntity"),
            ],
        );
        GraphIngestor::new(store.clone(), config)
            .load_entities(&[record])
            .await
            .unwrap();
        assert_eq!(
            store.labels_of("A").unwrap(),
            vec!["biolink:Gene", "BiologicalEntity"]
        );
    }

    #[tokio::test]
    async fn test_both_missing_endpoints_in_one_fault() {
        let store = Arc::new(InMemoryGraphStore::new());
        let report = ingestor(&store, 10)
            .load_relations(&[relation(2, "X", "Y")])
            .await
            .unwrap();
        assert_eq!(report.fault_count(), 1);
        assert_eq!(report.faults[0].offending_id(), "X+Y");
        let text = report.faults[0].to_string();
        assert!(text.contains("subject 'X'"));
        assert!(text.contains("object 'Y'"));
    }

    #[tokio::test]
    async fn test_edge_type_is_predicate() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingest = ingestor(&store, 10);
        ingest
            .load_entities(&[entity(2, "A"), entity(3, "B")])
            .await
            .unwrap();
        ingest.load_relations(&[relation(2, "A", "B")]).await.unwrap();
        assert_eq!(
            store.edges(),
            vec![(
                "A".to_string(),
                "biolink:interacts_with".to_string(),
                "B".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingest = ingestor(&store, 10);
        ingest.load_entities(&[entity(2, "A")]).await.unwrap();

        let err = ingest.clear(WipeConfirmation::Unconfirmed).await.unwrap_err();
        assert!(matches!(err, GraphError::WipeNotConfirmed { nodes: 1, .. }));
        assert_eq!(store.count_nodes().await.unwrap(), 1);

        let report = ingest.clear(WipeConfirmation::Confirmed).await.unwrap();
        assert_eq!(report.nodes_removed, 1);
        assert!(ingest.status().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_empty_store_needs_no_confirmation() {
        let store = Arc::new(InMemoryGraphStore::new());
        let report = ingestor(&store, 10)
            .clear(WipeConfirmation::Unconfirmed)
            .await
            .unwrap();
        assert_eq!(report, ClearReport::default());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_load() {
        let store = Arc::new(InMemoryGraphStore::new());
        store.fail_on(StoreOperation::CreateEntities);
        let err = ingestor(&store, 10)
            .load_entities(&[entity(2, "A")])
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some(StoreOperation::CreateEntities));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_logged_summary_uses_configured_preview() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = Arc::new(InMemoryGraphStore::new());
        let config = IngestConfig {
            fault_preview: 1,
            ..IngestConfig::default()
        };
        GraphIngestor::new(store, config)
            .load_entities(&[entity(2, "A"), entity(3, "A"), entity(4, "B"), entity(5, "B")])
            .await
            .unwrap();

        let text = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(text.contains("2 faults (first: A, ...)"), "{text}");
    }

    #[test]
    fn test_summary_preview() {
        let report = LoadReport {
            stage: LoadStage::Entities,
            records: 10,
            created: 7,
            faults: (0..3)
                .map(|i| IngestFault::Decode(DecodeFault::duplicate_id(i + 2, &format!("E{}", i))))
                .collect(),
        };
        assert_eq!(
            report.summary(2),
            "entity load: 10 records, 7 created, 3 faults (first: E0, E1, ...)"
        );
        assert_eq!(
            report.summary(0),
            "entity load: 10 records, 7 created, 3 faults"
        );
    }
}
