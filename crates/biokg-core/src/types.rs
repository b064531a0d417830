//! Data model shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded entity row, ready to become one graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDraft {
    /// Line of the source record.
    #[serde(skip)]
    pub position: u64,
    pub id: String,
    pub name: Option<String>,
    /// Primary type, used as the node's storage label.
    pub category: Option<String>,
    pub all_names: Vec<String>,
    pub all_categories: Vec<String>,
    pub iri: Option<String>,
    pub description: Option<String>,
    pub equivalent_curies: Vec<String>,
    pub publications: Vec<String>,
    pub label: Option<String>,
}

impl EntityDraft {
    /// Storage labels for the node.
    ///
    /// Always the primary `category`; with `include_all` every entry of
    /// `all_categories` follows it, without repeats.
    pub fn labels(&self, include_all: bool) -> Vec<String> {
        let mut labels: Vec<String> = self.category.iter().cloned().collect();
        if include_all {
            for category in &self.all_categories {
                if !labels.contains(category) {
                    labels.push(category.clone());
                }
            }
        }
        labels
    }

    /// Node properties as a JSON map. Absent scalar fields are omitted.
    pub fn properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert("id".into(), Value::from(self.id.clone()));
        insert_opt(&mut props, "name", &self.name);
        insert_opt(&mut props, "category", &self.category);
        props.insert("all_names".into(), Value::from(self.all_names.clone()));
        props.insert(
            "all_categories".into(),
            Value::from(self.all_categories.clone()),
        );
        insert_opt(&mut props, "iri", &self.iri);
        insert_opt(&mut props, "description", &self.description);
        props.insert(
            "equivalent_curies".into(),
            Value::from(self.equivalent_curies.clone()),
        );
        props.insert(
            "publications".into(),
            Value::from(self.publications.clone()),
        );
        insert_opt(&mut props, "label", &self.label);
        props
    }
}

/// A decoded relation row. Endpoints are entity ids, resolved at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDraft {
    #[serde(skip)]
    pub position: u64,
    pub id: Option<String>,
    pub subject: String,
    pub object: String,
    /// Edge type in the store.
    pub predicate: String,
    /// Relation curie (e.g. `RO:0002606`), kept as an attribute.
    pub relation: Option<String>,
    /// Provenance: knowledge sources and/or publications.
    pub knowledge_source: Vec<String>,
    pub label: Option<String>,
}

impl RelationDraft {
    /// Edge properties as a JSON map.
    pub fn properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        insert_opt(&mut props, "id", &self.id);
        insert_opt(&mut props, "relation", &self.relation);
        props.insert(
            "knowledge_source".into(),
            Value::from(self.knowledge_source.clone()),
        );
        insert_opt(&mut props, "label", &self.label);
        props
    }

    /// Identifier used in fault reports: the relation id, else `subject->object`.
    pub fn display_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{}->{}", self.subject, self.object))
    }
}

/// One labelled pair from the ground-truth table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthPair {
    pub source: String,
    pub target: String,
    /// 1 when the relation holds, 0 otherwise.
    pub y: u8,
}

fn insert_opt(props: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), Value::from(v.clone()));
    }
}
