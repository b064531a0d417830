//! Record Decoder.
//!
//! Turns one raw CSV row (column name to string) into an [`EntityDraft`] or a
//! [`RelationDraft`]. A row that lacks a required column yields a
//! [`DecodeFault`] carrying the row's line and the missing column; the caller
//! collects it and moves on to the next row.

use std::collections::HashMap;

use crate::error::{DecodeFault, DecodeFaultKind};
use crate::multi_value::{split_multi, split_multi_set};
use crate::types::{EntityDraft, GroundTruthPair, RelationDraft};

/// Node file columns.
pub mod node_columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const CATEGORY: &str = "category";
    pub const ALL_NAMES: &str = "all_names";
    pub const ALL_CATEGORIES: &str = "all_categories";
    pub const IRI: &str = "iri";
    pub const DESCRIPTION: &str = "description";
    pub const EQUIVALENT_CURIES: &str = "equivalent_curies";
    pub const PUBLICATIONS: &str = "publications";
    pub const LABEL: &str = "label";
}

/// Edge file columns.
pub mod edge_columns {
    pub const ID: &str = "id";
    pub const SUBJECT: &str = "subject";
    pub const OBJECT: &str = "object";
    pub const PREDICATE: &str = "predicate";
    pub const RELATION: &str = "relation";
    pub const KNOWLEDGE_SOURCE: &str = "knowledge_source";
    pub const PUBLICATIONS: &str = "publications";
    pub const LABEL: &str = "label";
}

/// Ground-truth file columns.
pub mod ground_truth_columns {
    pub const SOURCE: &str = "source";
    pub const TARGET: &str = "target";
    pub const Y: &str = "y";
}

/// One raw delimited record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line in the source file (the header is line 1).
    pub position: u64,
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(position: u64, fields: HashMap<String, String>) -> Self {
        Self { position, fields }
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<'a, I>(position: u64, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { position, fields }
    }

    /// Value of a column, `None` when absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn owned(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    fn multi(&self, column: &str) -> Vec<String> {
        self.fields
            .get(column)
            .map(|v| split_multi(v))
            .unwrap_or_default()
    }

    fn multi_set(&self, column: &str) -> Vec<String> {
        self.fields
            .get(column)
            .map(|v| split_multi_set(v))
            .unwrap_or_default()
    }

    fn require(&self, column: &str, id: Option<&str>) -> Result<String, DecodeFault> {
        self.owned(column)
            .ok_or_else(|| DecodeFault::missing_field(self.position, id, column))
    }
}

/// Decode a node row.
pub fn decode_entity(record: &RawRecord) -> Result<EntityDraft, DecodeFault> {
    use node_columns::*;

    let id = record.require(ID, None)?;

    Ok(EntityDraft {
        position: record.position,
        name: record.owned(NAME),
        category: record.owned(CATEGORY),
        all_names: record.multi(ALL_NAMES),
        all_categories: record.multi_set(ALL_CATEGORIES),
        iri: record.owned(IRI),
        description: record.owned(DESCRIPTION),
        equivalent_curies: record.multi_set(EQUIVALENT_CURIES),
        publications: record.multi_set(PUBLICATIONS),
        label: record.owned(LABEL),
        id,
    })
}

/// Decode an edge row.
///
/// Provenance comes from `knowledge_source`, `publications`, or both merged.
pub fn decode_relation(record: &RawRecord) -> Result<RelationDraft, DecodeFault> {
    use edge_columns::*;

    let id = record.owned(ID);
    let subject = record.require(SUBJECT, id.as_deref())?;
    let object = record.require(OBJECT, id.as_deref())?;
    let predicate = record.require(PREDICATE, id.as_deref())?;

    let mut knowledge_source = record.multi_set(KNOWLEDGE_SOURCE);
    for publication in record.multi_set(PUBLICATIONS) {
        if !knowledge_source.contains(&publication) {
            knowledge_source.push(publication);
        }
    }

    Ok(RelationDraft {
        position: record.position,
        id,
        subject,
        object,
        predicate,
        relation: record.owned(RELATION),
        knowledge_source,
        label: record.owned(LABEL),
    })
}

/// Decode a ground-truth row.
pub fn decode_ground_truth(record: &RawRecord) -> Result<GroundTruthPair, DecodeFault> {
    use ground_truth_columns::*;

    let source = record.require(SOURCE, None)?;
    let target = record.require(TARGET, Some(&source))?;
    let raw_y = record.require(Y, Some(&source))?;
    let y = parse_label(&raw_y).ok_or_else(|| DecodeFault {
        position: record.position,
        id: Some(source.clone()),
        kind: DecodeFaultKind::InvalidLabel { value: raw_y.clone() },
    })?;

    Ok(GroundTruthPair { source, target, y })
}

fn parse_label(raw: &str) -> Option<u8> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(1),
        "0" | "0.0" | "false" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entity_full_row() {
        let record = RawRecord::from_pairs(
            2,
            [
                ("id", "MONDO:0005148"),
                ("name", "type 2 diabetes mellitus"),
                ("category", "biolink:Disease"),
                ("all_names", "T2DǂNIDDM"),
                ("all_categories", "biolink:Diseaseǂbiolink:DiseaseOrPhenotypicFeature"),
                ("iri", "http://purl.obolibrary.org/obo/MONDO_0005148"),
                ("description", "A diabetes that has material basis in..."),
                ("equivalent_curies", "DOID:9352ǂUMLS:C0011860"),
                ("publications", ""),
                ("label", "Disease"),
            ],
        );

        let entity = decode_entity(&record).expect("valid row");
        assert_eq!(entity.position, 2);
        assert_eq!(entity.id, "MONDO:0005148");
        assert_eq!(entity.category.as_deref(), Some("biolink:Disease"));
        assert_eq!(entity.all_names, vec!["T2D", "NIDDM"]);
        assert_eq!(entity.all_categories.len(), 2);
        assert_eq!(entity.equivalent_curies, vec!["DOID:9352", "UMLS:C0011860"]);
        assert!(entity.publications.is_empty());
        assert_eq!(entity.label.as_deref(), Some("Disease"));
    }

    #[test]
    fn test_decode_entity_missing_id() {
        let record = RawRecord::from_pairs(9, [("name", "orphan")]);
        let fault = decode_entity(&record).unwrap_err();
        assert_eq!(fault.position, 9);
        assert_eq!(
            fault.kind,
            DecodeFaultKind::MissingField {
                field: "id".into()
            }
        );
    }

    #[test]
    fn test_decode_entity_blank_id_is_missing() {
        let record = RawRecord::from_pairs(3, [("id", "   ")]);
        assert!(decode_entity(&record).is_err());
    }

    #[test]
    fn test_decode_entity_only_id() {
        let record = RawRecord::from_pairs(4, [("id", "A")]);
        let entity = decode_entity(&record).unwrap();
        assert!(entity.category.is_none());
        assert!(entity.all_names.is_empty());
    }

    #[test]
    fn test_decode_relation() {
        let record = RawRecord::from_pairs(
            5,
            [
                ("id", "e1"),
                ("subject", "CHEBI:15365"),
                ("object", "MONDO:0005148"),
                ("predicate", "biolink:treats"),
                ("relation", "RO:0002606"),
                ("knowledge_source", "infores:semmeddbǂinfores:ctd"),
                ("label", "treats"),
            ],
        );
        let rel = decode_relation(&record).unwrap();
        assert_eq!(rel.subject, "CHEBI:15365");
        assert_eq!(rel.predicate, "biolink:treats");
        assert_eq!(rel.knowledge_source, vec!["infores:semmeddb", "infores:ctd"]);
    }

    #[test]
    fn test_decode_relation_accepts_publications_column() {
        let record = RawRecord::from_pairs(
            5,
            [
                ("subject", "A"),
                ("object", "B"),
                ("predicate", "biolink:related_to"),
                ("publications", "PMID:1ǂPMID:2"),
            ],
        );
        let rel = decode_relation(&record).unwrap();
        assert_eq!(rel.knowledge_source, vec!["PMID:1", "PMID:2"]);
        assert!(rel.id.is_none());
    }

    #[test]
    fn test_decode_relation_missing_predicate_names_field_and_id() {
        let record = RawRecord::from_pairs(6, [("id", "e7"), ("subject", "A"), ("object", "B")]);
        let fault = decode_relation(&record).unwrap_err();
        assert_eq!(fault.position, 6);
        assert_eq!(fault.id.as_deref(), Some("e7"));
        assert_eq!(
            fault.kind,
            DecodeFaultKind::MissingField {
                field: "predicate".into()
            }
        );
    }

    #[test]
    fn test_decode_relation_missing_subject_reported_before_object() {
        let record = RawRecord::from_pairs(6, [("predicate", "p")]);
        let fault = decode_relation(&record).unwrap_err();
        assert_eq!(
            fault.kind,
            DecodeFaultKind::MissingField {
                field: "subject".into()
            }
        );
    }

    #[test]
    fn test_decode_ground_truth_labels() {
        for (raw, expected) in [("1", 1u8), ("0", 0), ("1.0", 1), ("False", 0)] {
            let record =
                RawRecord::from_pairs(2, [("source", "A"), ("target", "B"), ("y", raw)]);
            assert_eq!(decode_ground_truth(&record).unwrap().y, expected, "raw={}", raw);
        }
    }

    #[test]
    fn test_decode_ground_truth_rejects_other_labels() {
        let record = RawRecord::from_pairs(2, [("source", "A"), ("target", "B"), ("y", "2")]);
        let fault = decode_ground_truth(&record).unwrap_err();
        assert!(matches!(fault.kind, DecodeFaultKind::InvalidLabel { .. }));
    }
}
