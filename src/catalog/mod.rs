//! # Structure Catalog
//!
//! Structures are well-log spreadsheets grouped by field. The catalog is built by
//! scanning a `structures/` folder (one sub-folder per field) or loaded from a
//! prebuilt `index.json`, and held in a [`CatalogStore`] keyed by field and
//! structure name.

pub(crate) mod scan;
pub(crate) mod store;

pub use scan::extract_structure;
pub use scan::load_index;
pub use scan::scan_structures;
pub use scan::CatalogOptions;
pub use store::CatalogStore;

use crate::metadata::ColumnStatistics;
use crate::metadata::ColumnType;
use crate::metadata::StructureMetadata;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by catalog lookups and loading.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("index.json not found under '{0}'")]
    IndexNotFound(String),

    #[error("Unknown structure '{structure_name}' in field '{field_name}'")]
    UnknownStructure {
        field_name: String,
        structure_name: String,
    },

    #[error("Invalid structure file path '{0}'")]
    InvalidPath(String),

    #[error("Update cannot rename structure '{structure_name}' in field '{field_name}'")]
    KeyChanged {
        field_name: String,
        structure_name: String,
    },
}

/// All fields and their structures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub fields: Vec<FieldRecord>,
    pub total_fields: usize,
    pub total_structures: usize,
}

impl Catalog {
    /// Builds a catalog from fields, computing the totals.
    pub fn from_fields(fields: Vec<FieldRecord>) -> Self {
        let total_structures = fields.iter().map(|field| field.structures.len()).sum();
        Self {
            total_fields: fields.len(),
            total_structures,
            fields,
        }
    }

    /// Iterates every structure of every field.
    pub fn structures(&self) -> impl Iterator<Item = &StructureRecord> {
        self.fields.iter().flat_map(|field| field.structures.iter())
    }
}

/// A field and the structures found in it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRecord {
    pub field_name: String,
    pub structures_count: usize,
    pub structures: Vec<StructureRecord>,
}

/// Composite key of a structure.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructureKey {
    pub field_name: String,
    pub structure_name: String,
}

impl StructureKey {
    pub fn new(field_name: &str, structure_name: &str) -> Self {
        Self {
            field_name: field_name.to_owned(),
            structure_name: structure_name.to_owned(),
        }
    }
}

/// One structure file and whatever metadata is known about it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureRecord {
    pub structure_name: String,
    pub field_name: String,
    /// Web path of the file, `/structures/<folder>/<file>`
    pub file_path: String,
    pub wells_count: usize,
    pub wells: Vec<String>,
    pub total_records: usize,
    pub columns: Vec<String>,
    pub intervals: Vec<String>,
    pub data_types: BTreeMap<String, ColumnType>,
    pub statistics: BTreeMap<String, ColumnStatistics>,
}

impl StructureRecord {
    pub fn key(&self) -> StructureKey {
        StructureKey::new(&self.field_name, &self.structure_name)
    }

    /// True until metadata has been extracted: no wells and no columns are known.
    pub fn needs_metadata(&self) -> bool {
        self.wells.is_empty() && self.columns.is_empty()
    }

    /// Copies extracted metadata into the record.
    pub fn merge_metadata(&mut self, metadata: StructureMetadata) {
        self.wells_count = metadata.wells.len();
        self.wells = metadata.wells;
        self.columns = metadata.columns;
        self.intervals = metadata.intervals.into_iter().collect();
        self.total_records = metadata.total_records;
        self.data_types = metadata.data_types;
        self.statistics = metadata.statistics;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(field_name: &str, structure_name: &str) -> StructureRecord {
        StructureRecord {
            structure_name: structure_name.to_owned(),
            field_name: field_name.to_owned(),
            file_path: format!("/structures/{}/{}.xlsx", field_name.to_lowercase(), structure_name),
            ..Default::default()
        }
    }

    #[test]
    fn merge_metadata() {
        let mut structure = record("Adera", "ABAB");
        assert!(structure.needs_metadata());

        structure.merge_metadata(StructureMetadata {
            columns: vec!["WELL".to_owned(), "GR".to_owned()],
            wells: vec!["ABAB-001".to_owned(), "ABAB-002".to_owned()],
            intervals: BTreeSet::from(["A".to_owned()]),
            total_records: 10,
            data_types: BTreeMap::from([("GR".to_owned(), ColumnType::Number)]),
            ..Default::default()
        });
        assert!(!structure.needs_metadata());
        assert_eq!(structure.wells_count, 2);
        assert_eq!(structure.intervals, vec!["A"]);
        assert_eq!(structure.total_records, 10);
        assert_eq!(structure.data_types["GR"], ColumnType::Number);
        assert_eq!(structure.key(), StructureKey::new("Adera", "ABAB"));
    }

    #[test]
    fn catalog_totals() {
        let catalog = Catalog::from_fields(vec![
            FieldRecord {
                field_name: "Adera".to_owned(),
                structures_count: 2,
                structures: vec![record("Adera", "ABAB"), record("Adera", "BNG")],
            },
            FieldRecord {
                field_name: "Limau".to_owned(),
                structures_count: 1,
                structures: vec![record("Limau", "KTB")],
            },
        ]);
        assert_eq!(catalog.total_fields, 2);
        assert_eq!(catalog.total_structures, 3);
        assert_eq!(catalog.structures().map(|it| it.structure_name.as_str()).collect::<Vec<_>>(), vec!["ABAB", "BNG", "KTB"]);
    }

    #[test]
    fn lenient_index_records() {
        let json = r#"{"fields": [{"field_name": "Adera", "structures": [{"structure_name": "ABAB", "field_name": "Adera", "wells": ["A-1"], "extra": true}]}]}"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let structure = &catalog.fields[0].structures[0];
        assert_eq!(structure.wells, vec!["A-1"]);
        assert_eq!(structure.total_records, 0);
        assert_eq!(catalog.total_fields, 0);
    }
}
