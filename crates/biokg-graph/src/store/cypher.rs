//! [`GraphStore`] over parameterized Cypher.
//!
//! Query text is constant. Every value (ids, labels, relationship types,
//! projection names, property names) travels as a bound parameter, so the
//! shape of a query never depends on the data. Dynamic labels and types go
//! through APOC; projection and embedding go through GDS.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{
    ComputeSummary, EdgeWrite, EmbeddingParams, GraphStore, MemoryEstimate, NodeEmbedding,
    NodeWrite, ProjectionSummary, StoreOperation,
};
use crate::error::{GraphError, GraphResult};

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Raw query capability: run one statement in its own transaction.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    async fn run(
        &self,
        operation: StoreOperation,
        query: &str,
        params: Map<String, Value>,
    ) -> GraphResult<Vec<Row>>;
}

/// Cypher statements issued by [`CypherGraphStore`].
pub mod queries {
    pub const COUNT_NODES: &str = "MATCH (n) RETURN count(n) AS count";

    pub const COUNT_RELATIONSHIPS: &str = "MATCH ()-[r]->() RETURN count(r) AS count";

    pub const CLEAR: &str = "MATCH (n) DETACH DELETE n";

    pub const FIND_MISSING_IDS: &str = "\
UNWIND $ids AS id
OPTIONAL MATCH (n {id: id})
WITH id, n
WHERE n IS NULL
RETURN id";

    pub const CREATE_ENTITIES: &str = "\
UNWIND $rows AS row
CALL apoc.create.node(row.labels, row.properties) YIELD node
RETURN count(node) AS created";

    pub const CREATE_RELATIONS: &str = "\
UNWIND $rows AS row
MATCH (subject {id: row.subject})
MATCH (object {id: row.object})
CALL apoc.create.relationship(subject, row.type, row.properties, object) YIELD rel
RETURN count(rel) AS created";

    pub const PROJECTION_EXISTS: &str =
        "CALL gds.graph.exists($name) YIELD exists RETURN exists";

    pub const DROP_PROJECTION: &str =
        "CALL gds.graph.drop($name, false) YIELD graphName RETURN graphName";

    /// Cypher aggregation projects relationships directed by default. The
    /// optional match keeps isolated nodes in the projection.
    pub const PROJECT: &str = "\
MATCH (source)
OPTIONAL MATCH (source)-->(target)
WITH gds.graph.project($name, source, target) AS g
RETURN g.graphName AS graph_name, g.nodeCount AS node_count, g.relationshipCount AS relationship_count";

    pub const ESTIMATE_MEMORY: &str = "\
CALL gds.fastRP.write.estimate($name, $config)
YIELD requiredMemory, bytesMin, bytesMax
RETURN requiredMemory, bytesMin, bytesMax";

    pub const COMPUTE_EMBEDDINGS: &str = "\
CALL gds.fastRP.write($name, $config)
YIELD nodePropertiesWritten, computeMillis
RETURN nodePropertiesWritten, computeMillis";

    pub const EMBEDDINGS_PAGE: &str = "\
MATCH (n)
WHERE n[$property] IS NOT NULL
RETURN n.id AS id, n[$property] AS vector
ORDER BY id
SKIP $skip LIMIT $limit";
}

/// [`GraphStore`] backed by a [`CypherExecutor`].
pub struct CypherGraphStore<E> {
    executor: E,
}

impl<E: CypherExecutor> CypherGraphStore<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn run(
        &self,
        operation: StoreOperation,
        query: &str,
        params: Map<String, Value>,
    ) -> GraphResult<Vec<Row>> {
        debug!(%operation, "running statement");
        self.executor.run(operation, query, params).await
    }

    async fn single(
        &self,
        operation: StoreOperation,
        query: &str,
        params: Map<String, Value>,
    ) -> GraphResult<Row> {
        self.run(operation, query, params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::UnexpectedResponse {
                operation,
                details: "expected one row, got none".to_string(),
            })
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn embedding_config(params: &EmbeddingParams) -> Value {
    let mut config = json!({
        "embeddingDimension": params.dimension,
        "writeProperty": params.write_property,
    });
    if let Some(seed) = params.random_seed {
        config["randomSeed"] = json!(seed);
    }
    config
}

pub(crate) fn column<'a>(
    row: &'a Row,
    operation: StoreOperation,
    name: &str,
) -> GraphResult<&'a Value> {
    row.get(name).ok_or_else(|| GraphError::UnexpectedResponse {
        operation,
        details: format!("missing column '{}'", name),
    })
}

pub(crate) fn column_u64(row: &Row, operation: StoreOperation, name: &str) -> GraphResult<u64> {
    let value = column(row, operation, name)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .ok_or_else(|| GraphError::UnexpectedResponse {
            operation,
            details: format!("column '{}' is not a count: {}", name, value),
        })
}

pub(crate) fn column_str(row: &Row, operation: StoreOperation, name: &str) -> GraphResult<String> {
    let value = column(row, operation, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GraphError::UnexpectedResponse {
            operation,
            details: format!("column '{}' is not a string: {}", name, value),
        })
}

pub(crate) fn column_vector(
    row: &Row,
    operation: StoreOperation,
    name: &str,
) -> GraphResult<Vec<f64>> {
    let value = column(row, operation, name)?;
    json_vector(value, operation, &format!("column '{}'", name))
}

/// A JSON list of numbers. `what` names the value in errors.
pub(crate) fn json_vector(
    value: &Value,
    operation: StoreOperation,
    what: &str,
) -> GraphResult<Vec<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| GraphError::UnexpectedResponse {
            operation,
            details: format!("{} is not a list", what),
        })?;
    items
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| GraphError::UnexpectedResponse {
                operation,
                details: format!("{} holds a non-numeric component {}", what, v),
            })
        })
        .collect()
}

#[async_trait]
impl<E: CypherExecutor> GraphStore for CypherGraphStore<E> {
    async fn count_nodes(&self) -> GraphResult<u64> {
        let op = StoreOperation::CountNodes;
        let row = self.single(op, queries::COUNT_NODES, Map::new()).await?;
        column_u64(&row, op, "count")
    }

    async fn count_relationships(&self) -> GraphResult<u64> {
        let op = StoreOperation::CountRelationships;
        let row = self
            .single(op, queries::COUNT_RELATIONSHIPS, Map::new())
            .await?;
        column_u64(&row, op, "count")
    }

    async fn clear(&self) -> GraphResult<()> {
        self.run(StoreOperation::Clear, queries::CLEAR, Map::new())
            .await?;
        info!("Database cleared");
        Ok(())
    }

    async fn find_missing_ids(&self, ids: &[String]) -> GraphResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let op = StoreOperation::FindMissingIds;
        let rows = self
            .run(op, queries::FIND_MISSING_IDS, params([("ids", json!(ids))]))
            .await?;
        rows.iter().map(|row| column_str(row, op, "id")).collect()
    }

    async fn create_entities(&self, nodes: &[NodeWrite]) -> GraphResult<u64> {
        if nodes.is_empty() {
            return Ok(0);
        }
        let op = StoreOperation::CreateEntities;
        let rows = serde_json::to_value(nodes)?;
        let row = self
            .single(op, queries::CREATE_ENTITIES, params([("rows", rows)]))
            .await?;
        column_u64(&row, op, "created")
    }

    async fn create_relations(&self, edges: &[EdgeWrite]) -> GraphResult<u64> {
        if edges.is_empty() {
            return Ok(0);
        }
        let op = StoreOperation::CreateRelations;
        let rows = serde_json::to_value(edges)?;
        let row = self
            .single(op, queries::CREATE_RELATIONS, params([("rows", rows)]))
            .await?;
        column_u64(&row, op, "created")
    }

    async fn projection_exists(&self, name: &str) -> GraphResult<bool> {
        let op = StoreOperation::ProjectionExists;
        let row = self
            .single(op, queries::PROJECTION_EXISTS, params([("name", json!(name))]))
            .await?;
        column(&row, op, "exists")?
            .as_bool()
            .ok_or_else(|| GraphError::UnexpectedResponse {
                operation: op,
                details: "column 'exists' is not a boolean".to_string(),
            })
    }

    async fn drop_projection(&self, name: &str) -> GraphResult<bool> {
        let rows = self
            .run(
                StoreOperation::DropProjection,
                queries::DROP_PROJECTION,
                params([("name", json!(name))]),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn project(&self, name: &str) -> GraphResult<ProjectionSummary> {
        let op = StoreOperation::Project;
        let row = self
            .single(op, queries::PROJECT, params([("name", json!(name))]))
            .await?;
        Ok(ProjectionSummary {
            name: column_str(&row, op, "graph_name")?,
            node_count: column_u64(&row, op, "node_count")?,
            relationship_count: column_u64(&row, op, "relationship_count")?,
        })
    }

    async fn estimate_embedding_memory(
        &self,
        projection: &str,
        embedding: &EmbeddingParams,
    ) -> GraphResult<MemoryEstimate> {
        let op = StoreOperation::EstimateMemory;
        let row = self
            .single(
                op,
                queries::ESTIMATE_MEMORY,
                params([
                    ("name", json!(projection)),
                    ("config", embedding_config(embedding)),
                ]),
            )
            .await?;
        Ok(MemoryEstimate {
            required_memory: column_str(&row, op, "requiredMemory")?,
            bytes_min: column_u64(&row, op, "bytesMin")?,
            bytes_max: column_u64(&row, op, "bytesMax")?,
        })
    }

    async fn compute_embeddings(
        &self,
        projection: &str,
        embedding: &EmbeddingParams,
    ) -> GraphResult<ComputeSummary> {
        let op = StoreOperation::ComputeEmbeddings;
        let row = self
            .single(
                op,
                queries::COMPUTE_EMBEDDINGS,
                params([
                    ("name", json!(projection)),
                    ("config", embedding_config(embedding)),
                ]),
            )
            .await?;
        Ok(ComputeSummary {
            node_properties_written: column_u64(&row, op, "nodePropertiesWritten")?,
            compute_millis: column_u64(&row, op, "computeMillis")?,
        })
    }

    async fn embeddings_page(
        &self,
        property: &str,
        skip: u64,
        limit: usize,
    ) -> GraphResult<Vec<NodeEmbedding>> {
        let op = StoreOperation::StreamEmbeddings;
        let rows = self
            .run(
                op,
                queries::EMBEDDINGS_PAGE,
                params([
                    ("property", json!(property)),
                    ("skip", json!(skip)),
                    ("limit", json!(limit)),
                ]),
            )
            .await?;
        rows.iter()
            .map(|row| {
                Ok(NodeEmbedding {
                    id: column_str(row, op, "id")?,
                    vector: column_vector(row, op, "vector")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Executor that records statements and replays canned rows.
    #[derive(Default)]
    struct ScriptedExecutor {
        calls: Mutex<Vec<(StoreOperation, String, Map<String, Value>)>>,
        responses: Mutex<VecDeque<Vec<Row>>>,
    }

    impl ScriptedExecutor {
        fn respond(self, rows: Vec<Value>) -> Self {
            let rows = rows
                .into_iter()
                .map(|v| v.as_object().cloned().expect("row must be an object"))
                .collect();
            self.responses.lock().push_back(rows);
            self
        }
    }

    #[async_trait]
    impl CypherExecutor for ScriptedExecutor {
        async fn run(
            &self,
            operation: StoreOperation,
            query: &str,
            params: Map<String, Value>,
        ) -> GraphResult<Vec<Row>> {
            self.calls
                .lock()
                .push((operation, query.to_string(), params));
            Ok(self.responses.lock().pop_front().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_count_nodes_reads_count_column() {
        let store = CypherGraphStore::new(ScriptedExecutor::default().respond(vec![json!({"count": 3})]));
        assert_eq!(store.count_nodes().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_count_row_is_unexpected_response() {
        let store = CypherGraphStore::new(ScriptedExecutor::default());
        let err = store.count_relationships().await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnexpectedResponse {
                operation: StoreOperation::CountRelationships,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_entity_values_are_bound_not_interpolated() {
        let hostile = "x'}) DETACH DELETE n //";
        let store = CypherGraphStore::new(
            ScriptedExecutor::default().respond(vec![json!({"created": 1})]),
        );
        let mut properties = Map::new();
        properties.insert("id".into(), json!(hostile));
        let created = store
            .create_entities(&[NodeWrite {
                labels: vec!["biolink:Drug".into()],
                properties,
            }])
            .await
            .unwrap();
        assert_eq!(created, 1);

        let calls = store.executor().calls.lock();
        let (op, query, params) = &calls[0];
        assert_eq!(*op, StoreOperation::CreateEntities);
        assert_eq!(query, queries::CREATE_ENTITIES);
        assert!(!query.contains(hostile));
        assert_eq!(params["rows"][0]["properties"]["id"], hostile);
        assert_eq!(params["rows"][0]["labels"][0], "biolink:Drug");
    }

    #[tokio::test]
    async fn test_relations_bind_type_parameter() {
        let store = CypherGraphStore::new(
            ScriptedExecutor::default().respond(vec![json!({"created": 1})]),
        );
        store
            .create_relations(&[EdgeWrite {
                subject: "A".into(),
                object: "B".into(),
                edge_type: "biolink:treats".into(),
                properties: Map::new(),
            }])
            .await
            .unwrap();
        let calls = store.executor().calls.lock();
        assert_eq!(calls[0].2["rows"][0]["type"], "biolink:treats");
        assert_eq!(calls[0].2["rows"][0]["subject"], "A");
    }

    #[tokio::test]
    async fn test_empty_batches_skip_the_store() {
        let store = CypherGraphStore::new(ScriptedExecutor::default());
        assert_eq!(store.create_entities(&[]).await.unwrap(), 0);
        assert_eq!(store.create_relations(&[]).await.unwrap(), 0);
        assert!(store.find_missing_ids(&[]).await.unwrap().is_empty());
        assert!(store.executor().calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_drop_missing_projection_returns_false() {
        let store = CypherGraphStore::new(ScriptedExecutor::default().respond(vec![]));
        assert!(!store.drop_projection("projection").await.unwrap());
        let calls = store.executor().calls.lock();
        assert_eq!(calls[0].2["name"], "projection");
    }

    #[tokio::test]
    async fn test_compute_passes_config_map() {
        let store = CypherGraphStore::new(ScriptedExecutor::default().respond(vec![
            json!({"nodePropertiesWritten": 3, "computeMillis": 12}),
        ]));
        let summary = store
            .compute_embeddings(
                "projection",
                &EmbeddingParams {
                    dimension: 128,
                    write_property: "fastrp_vector".into(),
                    random_seed: Some(7),
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.node_properties_written, 3);

        let calls = store.executor().calls.lock();
        let config = &calls[0].2["config"];
        assert_eq!(config["embeddingDimension"], 128);
        assert_eq!(config["writeProperty"], "fastrp_vector");
        assert_eq!(config["randomSeed"], 7);
    }

    #[tokio::test]
    async fn test_estimate_reads_memory_columns() {
        let store = CypherGraphStore::new(ScriptedExecutor::default().respond(vec![json!({
            "requiredMemory": "[1 MiB ... 2 MiB]",
            "bytesMin": 1048576,
            "bytesMax": 2097152
        })]));
        let estimate = store
            .estimate_embedding_memory(
                "projection",
                &EmbeddingParams {
                    dimension: 128,
                    write_property: "fastrp_vector".into(),
                    random_seed: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(estimate.required_memory, "[1 MiB ... 2 MiB]");
        assert_eq!(estimate.bytes_max, 2_097_152);
    }

    #[tokio::test]
    async fn test_embeddings_page_decodes_vectors() {
        let store = CypherGraphStore::new(ScriptedExecutor::default().respond(vec![
            json!({"id": "A", "vector": [1.0, 0.0]}),
            json!({"id": "B", "vector": [0, 1]}),
        ]));
        let embeddings = store.embeddings_page("fastrp_vector", 20, 10).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[1].vector, vec![0.0, 1.0]);
        let calls = store.executor().calls.lock();
        assert_eq!(calls[0].2["property"], "fastrp_vector");
        assert_eq!(calls[0].2["skip"], 20);
        assert_eq!(calls[0].2["limit"], 10);
    }

    #[tokio::test]
    async fn test_stream_rejects_non_numeric_component() {
        let store = CypherGraphStore::new(
            ScriptedExecutor::default().respond(vec![json!({"id": "A", "vector": ["x"]})]),
        );
        assert!(store.embeddings_page("fastrp_vector", 0, 10).await.is_err());
    }
}
