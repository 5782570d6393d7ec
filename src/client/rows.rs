// src/client/rows.rs

//! An id-keyed cache of table rows, the view-state half of the connector.
//!
//! Components load the cache from the persistence layer on mount and merge
//! relay events into it as they arrive. Merging is keyed on the record id and
//! replaces the whole row, so receiving the same update twice, or out of
//! order with a page load, converges on the same state.

use crate::core::events::{ID_FIELD, id_as_string};
use indexmap::IndexMap;
use serde_json::Value;

/// Rows keyed by id, in insertion order so the table renders stably.
#[derive(Debug, Default)]
pub struct RowCache {
    rows: IndexMap<String, Value>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache contents with a freshly fetched row set.
    /// Rows without an id are skipped; the persistence layer owns the schema
    /// and a row it cannot identify cannot be merged into later.
    pub fn load(&mut self, rows: impl IntoIterator<Item = Value>) {
        self.rows.clear();
        for row in rows {
            if let Some(id) = row.get(ID_FIELD).and_then(id_as_string) {
                self.rows.insert(id, row);
            }
        }
    }

    /// Merges one updated record: replaces the row with the same id or
    /// appends a new one. Returns false when the record carries no id.
    pub fn merge(&mut self, record: &Value) -> bool {
        let Some(id) = record.get(ID_FIELD).and_then(id_as_string) else {
            return false;
        };
        self.rows.insert(id, record.clone());
        true
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.rows.get(id)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Value> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
