//! In-memory [`GraphStore`] for tests.
//!
//! Mirrors the Cypher store's observable behavior: relations whose endpoints
//! are absent are skipped rather than rejected, dropping a missing projection
//! is not an error, and embeddings land on node properties. Vectors are
//! deterministic per `(seed, id)` so exports can be compared across runs.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use tracing::debug;

use super::cypher::json_vector;
use super::{
    ComputeSummary, EdgeWrite, EmbeddingParams, GraphStore, MemoryEstimate, NodeEmbedding,
    NodeWrite, ProjectionSummary, StoreOperation,
};
use crate::error::{GraphError, GraphResult};

#[derive(Debug, Clone)]
struct StoredNode {
    labels: Vec<String>,
    properties: Map<String, Value>,
}

impl StoredNode {
    fn id(&self) -> Option<&str> {
        self.properties.get("id").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
struct StoredEdge {
    subject: String,
    object: String,
    edge_type: String,
    properties: Map<String, Value>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<StoredNode>,
    edges: Vec<StoredEdge>,
    projections: HashMap<String, ProjectionSummary>,
}

impl Inner {
    fn has_id(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id() == Some(id))
    }
}

/// Process-local graph. Not persisted.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<Inner>,
    failing: RwLock<HashSet<StoreOperation>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail with a store error.
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failing.write().insert(operation);
    }

    /// Undo [`fail_on`](Self::fail_on).
    pub fn recover(&self, operation: StoreOperation) {
        self.failing.write().remove(&operation);
    }

    /// Labels of the first node with this id.
    pub fn labels_of(&self, id: &str) -> Option<Vec<String>> {
        self.inner
            .read()
            .nodes
            .iter()
            .find(|n| n.id() == Some(id))
            .map(|n| n.labels.clone())
    }

    /// Properties of the first node with this id.
    pub fn node_properties(&self, id: &str) -> Option<Map<String, Value>> {
        self.inner
            .read()
            .nodes
            .iter()
            .find(|n| n.id() == Some(id))
            .map(|n| n.properties.clone())
    }

    /// `(subject, type, object)` of every stored relationship, in insertion order.
    pub fn edges(&self) -> Vec<(String, String, String)> {
        self.inner
            .read()
            .edges
            .iter()
            .map(|e| (e.subject.clone(), e.edge_type.clone(), e.object.clone()))
            .collect()
    }

    /// Properties of the first relationship between `subject` and `object`.
    pub fn edge_properties(&self, subject: &str, object: &str) -> Option<Map<String, Value>> {
        self.inner
            .read()
            .edges
            .iter()
            .find(|e| e.subject == subject && e.object == object)
            .map(|e| e.properties.clone())
    }

    fn check(&self, operation: StoreOperation) -> GraphResult<()> {
        if self.failing.read().contains(&operation) {
            return Err(GraphError::Store {
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

/// FNV-1a, used to derive a per-node seed.
fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn stub_vector(id: &str, params: &EmbeddingParams) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.random_seed.unwrap_or(0) ^ fnv1a(id));
    (0..params.dimension)
        .map(|_| rng.gen_range(-1.0..=1.0))
        .collect()
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn count_nodes(&self) -> GraphResult<u64> {
        self.check(StoreOperation::CountNodes)?;
        Ok(self.inner.read().nodes.len() as u64)
    }

    async fn count_relationships(&self) -> GraphResult<u64> {
        self.check(StoreOperation::CountRelationships)?;
        Ok(self.inner.read().edges.len() as u64)
    }

    async fn clear(&self) -> GraphResult<()> {
        self.check(StoreOperation::Clear)?;
        let mut inner = self.inner.write();
        inner.nodes.clear();
        inner.edges.clear();
        Ok(())
    }

    async fn find_missing_ids(&self, ids: &[String]) -> GraphResult<Vec<String>> {
        self.check(StoreOperation::FindMissingIds)?;
        let inner = self.inner.read();
        Ok(ids.iter().filter(|id| !inner.has_id(id)).cloned().collect())
    }

    async fn create_entities(&self, nodes: &[NodeWrite]) -> GraphResult<u64> {
        self.check(StoreOperation::CreateEntities)?;
        let mut inner = self.inner.write();
        inner.nodes.extend(nodes.iter().map(|n| StoredNode {
            labels: n.labels.clone(),
            properties: n.properties.clone(),
        }));
        Ok(nodes.len() as u64)
    }

    async fn create_relations(&self, edges: &[EdgeWrite]) -> GraphResult<u64> {
        self.check(StoreOperation::CreateRelations)?;
        let mut inner = self.inner.write();
        let mut created = 0;
        for edge in edges {
            if !(inner.has_id(&edge.subject) && inner.has_id(&edge.object)) {
                debug!(subject = %edge.subject, object = %edge.object, "endpoint absent, skipping");
                continue;
            }
            inner.edges.push(StoredEdge {
                subject: edge.subject.clone(),
                object: edge.object.clone(),
                edge_type: edge.edge_type.clone(),
                properties: edge.properties.clone(),
            });
            created += 1;
        }
        Ok(created)
    }

    async fn projection_exists(&self, name: &str) -> GraphResult<bool> {
        self.check(StoreOperation::ProjectionExists)?;
        Ok(self.inner.read().projections.contains_key(name))
    }

    async fn drop_projection(&self, name: &str) -> GraphResult<bool> {
        self.check(StoreOperation::DropProjection)?;
        Ok(self.inner.write().projections.remove(name).is_some())
    }

    async fn project(&self, name: &str) -> GraphResult<ProjectionSummary> {
        self.check(StoreOperation::Project)?;
        let mut inner = self.inner.write();
        if inner.projections.contains_key(name) {
            return Err(GraphError::ProjectionExists(name.to_string()));
        }
        let summary = ProjectionSummary {
            name: name.to_string(),
            node_count: inner.nodes.len() as u64,
            relationship_count: inner.edges.len() as u64,
        };
        inner.projections.insert(name.to_string(), summary.clone());
        Ok(summary)
    }

    async fn estimate_embedding_memory(
        &self,
        projection: &str,
        params: &EmbeddingParams,
    ) -> GraphResult<MemoryEstimate> {
        self.check(StoreOperation::EstimateMemory)?;
        let inner = self.inner.read();
        let summary = inner
            .projections
            .get(projection)
            .ok_or_else(|| GraphError::ProjectionNotFound(projection.to_string()))?;
        let bytes = summary.node_count * params.dimension as u64 * 8;
        Ok(MemoryEstimate {
            required_memory: format!("{} Bytes", bytes),
            bytes_min: bytes,
            bytes_max: bytes,
        })
    }

    async fn compute_embeddings(
        &self,
        projection: &str,
        params: &EmbeddingParams,
    ) -> GraphResult<ComputeSummary> {
        self.check(StoreOperation::ComputeEmbeddings)?;
        let mut inner = self.inner.write();
        if !inner.projections.contains_key(projection) {
            return Err(GraphError::ProjectionNotFound(projection.to_string()));
        }
        let mut written = 0;
        for node in inner.nodes.iter_mut() {
            let Some(id) = node.id().map(str::to_string) else {
                continue;
            };
            let vector = stub_vector(&id, params);
            node.properties
                .insert(params.write_property.clone(), Value::from(vector));
            written += 1;
        }
        Ok(ComputeSummary {
            node_properties_written: written,
            compute_millis: 0,
        })
    }

    async fn embeddings_page(
        &self,
        property: &str,
        skip: u64,
        limit: usize,
    ) -> GraphResult<Vec<NodeEmbedding>> {
        let op = StoreOperation::StreamEmbeddings;
        self.check(op)?;
        let inner = self.inner.read();
        let mut embedded: Vec<(String, &Value)> = inner
            .nodes
            .iter()
            .filter_map(|node| {
                let vector = node.properties.get(property)?;
                let id = node.id()?.to_string();
                Some((id, vector))
            })
            .collect();
        embedded.sort_by(|a, b| a.0.cmp(&b.0));
        embedded
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit)
            .map(|(id, vector)| {
                let what = format!("property '{}' on '{}'", property, id);
                let vector = json_vector(vector, op, &what)?;
                Ok(NodeEmbedding { id, vector })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(id: &str) -> NodeWrite {
        let mut properties = Map::new();
        properties.insert("id".into(), json!(id));
        NodeWrite {
            labels: vec!["biolink:Gene".into()],
            properties,
        }
    }

    fn edge(subject: &str, object: &str) -> EdgeWrite {
        EdgeWrite {
            subject: subject.into(),
            object: object.into(),
            edge_type: "biolink:interacts_with".into(),
            properties: Map::new(),
        }
    }

    fn params(seed: Option<u64>) -> EmbeddingParams {
        EmbeddingParams {
            dimension: 4,
            write_property: "fastrp_vector".into(),
            random_seed: seed,
        }
    }

    #[tokio::test]
    async fn test_relations_skip_absent_endpoints() {
        let store = InMemoryGraphStore::new();
        store.create_entities(&[node("A"), node("B")]).await.unwrap();
        let created = store
            .create_relations(&[edge("A", "B"), edge("A", "Z")])
            .await
            .unwrap();
        assert_eq!(created, 1);
        assert_eq!(store.count_relationships().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_ids_keeps_input_order() {
        let store = InMemoryGraphStore::new();
        store.create_entities(&[node("B")]).await.unwrap();
        let ids = vec!["C".to_string(), "B".to_string(), "A".to_string()];
        assert_eq!(store.find_missing_ids(&ids).await.unwrap(), vec!["C", "A"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryGraphStore::new();
        store.fail_on(StoreOperation::CountNodes);
        let err = store.count_nodes().await.unwrap_err();
        assert_eq!(err.operation(), Some(StoreOperation::CountNodes));
        store.recover(StoreOperation::CountNodes);
        assert_eq!(store.count_nodes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_projection_lifecycle() {
        let store = InMemoryGraphStore::new();
        store.create_entities(&[node("A")]).await.unwrap();
        assert!(!store.drop_projection("p").await.unwrap());
        store.project("p").await.unwrap();
        assert!(matches!(
            store.project("p").await,
            Err(GraphError::ProjectionExists(_))
        ));
        assert!(store.drop_projection("p").await.unwrap());
        assert!(!store.projection_exists("p").await.unwrap());
    }

    #[tokio::test]
    async fn test_compute_requires_projection() {
        let store = InMemoryGraphStore::new();
        let err = store.compute_embeddings("p", &params(None)).await.unwrap_err();
        assert!(matches!(err, GraphError::ProjectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_seeded_vectors_are_stable() {
        let store = InMemoryGraphStore::new();
        store.create_entities(&[node("A"), node("B")]).await.unwrap();
        store.project("p").await.unwrap();
        store.compute_embeddings("p", &params(Some(9))).await.unwrap();
        let first = store.embeddings_page("fastrp_vector", 0, 10).await.unwrap();
        store.compute_embeddings("p", &params(Some(9))).await.unwrap();
        let second = store.embeddings_page("fastrp_vector", 0, 10).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].vector.len(), 4);
        assert_ne!(first[0].vector, first[1].vector);
    }

    #[tokio::test]
    async fn test_non_numeric_component_is_unexpected_response() {
        let store = InMemoryGraphStore::new();
        let mut bad = node("A");
        bad.properties
            .insert("fastrp_vector".into(), json!([0.5, "x"]));
        store.create_entities(&[bad]).await.unwrap();
        let err = store.embeddings_page("fastrp_vector", 0, 10).await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnexpectedResponse {
                operation: StoreOperation::StreamEmbeddings,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_embedding_pages_are_ordered_by_id() {
        let store = InMemoryGraphStore::new();
        store
            .create_entities(&[node("C"), node("A"), node("B")])
            .await
            .unwrap();
        store.project("p").await.unwrap();
        store.compute_embeddings("p", &params(Some(1))).await.unwrap();

        let first = store.embeddings_page("fastrp_vector", 0, 2).await.unwrap();
        let second = store.embeddings_page("fastrp_vector", 2, 2).await.unwrap();
        let ids: Vec<&str> = first.iter().chain(&second).map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert!(store
            .embeddings_page("fastrp_vector", 3, 2)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fnv1a_known_value() {
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
    }
}
