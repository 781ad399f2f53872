use crate::catalog::Catalog;
use crate::catalog::CatalogError;
use crate::catalog::StructureKey;
use crate::catalog::StructureRecord;
use crate::error::WellSheetError;
use crate::metadata::StructureMetadata;
use std::collections::BTreeMap;

/// Structure records keyed by (field name, structure name).
///
/// All changes go through this container, so a record is never mutated behind the
/// caller's back. Iteration follows key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogStore {
    records: BTreeMap<StructureKey, StructureRecord>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every structure of a catalog. Later duplicates replace earlier ones.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut store = Self::new();
        for record in catalog.structures() {
            store.insert(record.clone());
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts or replaces a record, returning the previous one.
    pub fn insert(&mut self, record: StructureRecord) -> Option<StructureRecord> {
        self.records.insert(record.key(), record)
    }

    pub fn get(&self, key: &StructureKey) -> Option<&StructureRecord> {
        self.records.get(key)
    }

    /// Applies a change to an existing record. A change that renames the field or the
    /// structure is rejected and leaves the record as it was.
    pub fn update<F>(&mut self, key: &StructureKey, change: F) -> Result<&StructureRecord, WellSheetError>
    where
        F: FnOnce(&mut StructureRecord),
    {
        let record = self.records.get_mut(key).ok_or_else(|| unknown(key))?;
        let mut changed = record.clone();
        change(&mut changed);
        if changed.key() != *key {
            Err(CatalogError::KeyChanged {
                field_name: key.field_name.to_owned(),
                structure_name: key.structure_name.to_owned(),
            })?;
        }
        *record = changed;
        Ok(record)
    }

    /// Copies extracted metadata into an existing record.
    pub fn merge_metadata(&mut self, key: &StructureKey, metadata: StructureMetadata) -> Result<&StructureRecord, WellSheetError> {
        let record = self.update(key, |record| record.merge_metadata(metadata))?;
        tracing::debug!(
            field = %key.field_name,
            structure = %key.structure_name,
            wells = record.wells_count,
            "Merged structure metadata"
        );
        Ok(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StructureKey, &StructureRecord)> {
        self.records.iter()
    }

    /// Serializes the records, in key order, as a JSON array.
    pub fn to_json(&self) -> Result<String, WellSheetError> {
        let records: Vec<&StructureRecord> = self.records.values().collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Restores a store from a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, WellSheetError> {
        let records: Vec<StructureRecord> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        Ok(store)
    }
}

fn unknown(key: &StructureKey) -> CatalogError {
    CatalogError::UnknownStructure {
        field_name: key.field_name.to_owned(),
        structure_name: key.structure_name.to_owned(),
    }
}
