//! Graph store capability.
//!
//! [`GraphStore`] is the set of typed operations the pipeline needs from the
//! property-graph database. Each call is one transaction: it either completes
//! or fails as a whole, and callers never see partial results.
//!
//! | Implementation | Backend |
//! |----------------|---------|
//! | [`CypherGraphStore`] | any [`CypherExecutor`], e.g. [`HttpCypherClient`] for Neo4j + APOC + GDS |
//! | [`InMemoryGraphStore`] | process memory, tests only |
//!
//! Stores are passed into components as `Arc<dyn GraphStore>`. Nothing holds
//! a process-wide connection.

mod cypher;
mod http;
mod memory;

pub use cypher::{queries, CypherExecutor, CypherGraphStore, Row};
pub use http::HttpCypherClient;
pub use memory::InMemoryGraphStore;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GraphResult;

/// Store operations, used to name the failing step in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreOperation {
    CountNodes,
    CountRelationships,
    Clear,
    FindMissingIds,
    CreateEntities,
    CreateRelations,
    ProjectionExists,
    DropProjection,
    Project,
    EstimateMemory,
    ComputeEmbeddings,
    StreamEmbeddings,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CountNodes => "count nodes",
            Self::CountRelationships => "count relationships",
            Self::Clear => "clear",
            Self::FindMissingIds => "find missing ids",
            Self::CreateEntities => "create entities",
            Self::CreateRelations => "create relations",
            Self::ProjectionExists => "projection exists",
            Self::DropProjection => "drop projection",
            Self::Project => "project",
            Self::EstimateMemory => "estimate memory",
            Self::ComputeEmbeddings => "compute embeddings",
            Self::StreamEmbeddings => "stream embeddings",
        };
        f.write_str(name)
    }
}

/// One node to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeWrite {
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

/// One relationship to create between two existing nodes, addressed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeWrite {
    pub subject: String,
    pub object: String,
    /// Relationship type.
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: Map<String, Value>,
}

/// Node and relationship totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatus {
    pub nodes: u64,
    pub relationships: u64,
}

impl GraphStatus {
    pub fn is_empty(&self) -> bool {
        self.nodes == 0 && self.relationships == 0
    }
}

impl fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nodes: {}\nRelationships: {}", self.nodes, self.relationships)
    }
}

/// Parameters of the embedding computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingParams {
    pub dimension: usize,
    pub write_property: String,
    pub random_seed: Option<u64>,
}

/// Result of creating a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub name: String,
    pub node_count: u64,
    pub relationship_count: u64,
}

/// Memory the embedding computation is expected to need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEstimate {
    /// Human-readable range as reported by the store, e.g. `"[1 MiB ... 2 MiB]"`.
    pub required_memory: String,
    pub bytes_min: u64,
    pub bytes_max: u64,
}

/// Result of writing embeddings onto nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeSummary {
    pub node_properties_written: u64,
    pub compute_millis: u64,
}

/// An entity id with its stored vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEmbedding {
    pub id: String,
    pub vector: Vec<f64>,
}

/// Typed operations on the property-graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn count_nodes(&self) -> GraphResult<u64>;

    async fn count_relationships(&self) -> GraphResult<u64>;

    /// Remove every node and relationship.
    async fn clear(&self) -> GraphResult<()>;

    /// The subset of `ids` with no node carrying that `id`, in input order.
    async fn find_missing_ids(&self, ids: &[String]) -> GraphResult<Vec<String>>;

    /// Create one node per write. Returns the number created.
    async fn create_entities(&self, nodes: &[NodeWrite]) -> GraphResult<u64>;

    /// Create one relationship per write. Both endpoints must exist.
    /// Returns the number created.
    async fn create_relations(&self, edges: &[EdgeWrite]) -> GraphResult<u64>;

    async fn projection_exists(&self, name: &str) -> GraphResult<bool>;

    /// Drop a projection. Returns `false` when none existed.
    async fn drop_projection(&self, name: &str) -> GraphResult<bool>;

    /// Project all nodes and relationships, every type directed.
    async fn project(&self, name: &str) -> GraphResult<ProjectionSummary>;

    async fn estimate_embedding_memory(
        &self,
        projection: &str,
        params: &EmbeddingParams,
    ) -> GraphResult<MemoryEstimate>;

    /// Compute embeddings over the projection and write them to
    /// `params.write_property` on every projected node.
    async fn compute_embeddings(
        &self,
        projection: &str,
        params: &EmbeddingParams,
    ) -> GraphResult<ComputeSummary>;

    /// One page of the nodes that carry `property`, ordered by `id`: at most
    /// `limit` rows after skipping the first `skip`.
    async fn embeddings_page(
        &self,
        property: &str,
        skip: u64,
        limit: usize,
    ) -> GraphResult<Vec<NodeEmbedding>>;

    /// Node and relationship totals.
    async fn status(&self) -> GraphResult<GraphStatus> {
        Ok(GraphStatus {
            nodes: self.count_nodes().await?,
            relationships: self.count_relationships().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let status = GraphStatus {
            nodes: 3,
            relationships: 2,
        };
        assert_eq!(status.to_string(), "Nodes: 3\nRelationships: 2");
        assert!(!status.is_empty());
        assert!(GraphStatus::default().is_empty());
    }

    #[test]
    fn test_edge_write_serializes_type_field() {
        let edge = EdgeWrite {
            subject: "A".into(),
            object: "B".into(),
            edge_type: "biolink:treats".into(),
            properties: Map::new(),
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "biolink:treats");
        assert!(json.get("edge_type").is_none());
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(StoreOperation::DropProjection.to_string(), "drop projection");
        assert_eq!(StoreOperation::CreateRelations.to_string(), "create relations");
    }
}
