//! In-memory document store.
//!
//! An explicit object owned by whoever serves documents; there is no global
//! instance. Ids are assigned sequentially from 1. Safe to share across
//! threads (`DashMap` plus an atomic id counter).

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::{NewSpreadsheet, Spreadsheet, SpreadsheetPatch, SpreadsheetSummary};
use crate::error::{Result, TabulaError};

#[derive(Debug)]
pub struct DocumentStore {
    documents: DashMap<u64, Spreadsheet>,
    next_id: AtomicU64,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore {
            documents: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a new document and return it with its assigned id.
    pub fn create(&self, new: NewSpreadsheet) -> Spreadsheet {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let doc = Spreadsheet::from_new(id, new);
        self.documents.insert(id, doc.clone());
        tracing::debug!(id, "created spreadsheet");
        doc
    }

    pub fn get(&self, id: u64) -> Option<Spreadsheet> {
        self.documents.get(&id).map(|entry| entry.value().clone())
    }

    /// Apply a partial update. Unknown ids are an error.
    pub fn update(&self, id: u64, patch: SpreadsheetPatch) -> Result<Spreadsheet> {
        let mut entry = self
            .documents
            .get_mut(&id)
            .ok_or(TabulaError::NotFound(id))?;
        entry.apply_patch(patch);
        tracing::debug!(id, "updated spreadsheet");
        Ok(entry.value().clone())
    }

    /// Id and display name of every document, in id order.
    pub fn list(&self) -> Vec<SpreadsheetSummary> {
        let mut summaries: Vec<_> = self
            .documents
            .iter()
            .map(|entry| entry.value().summary())
            .collect();
        summaries.sort_by_key(|s| s.id);
        summaries
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tabula_engine::engine::{Cell, Grid};

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = DocumentStore::new();
        let a = store.create(NewSpreadsheet::default());
        let b = store.create(NewSpreadsheet {
            name: Some("Budget".into()),
            ..NewSpreadsheet::default()
        });
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.get(2).and_then(|d| d.name), Some("Budget".to_string()));
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_list_uses_default_names() {
        let store = DocumentStore::new();
        store.create(NewSpreadsheet::default());
        store.create(NewSpreadsheet {
            name: Some("Named".into()),
            ..NewSpreadsheet::default()
        });
        let names: Vec<String> = store.list().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Spreadsheet 1", "Named"]);
    }

    #[test]
    fn test_update_merges_patch() {
        let store = DocumentStore::new();
        let doc = store.create(NewSpreadsheet {
            name: Some("Keep".into()),
            ..NewSpreadsheet::default()
        });

        let mut data = Grid::new();
        data.insert("A1".into(), Cell::from_input("9"));
        let updated = store
            .update(
                doc.id,
                SpreadsheetPatch {
                    data: Some(data.clone()),
                    ..SpreadsheetPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Keep"));
        assert_eq!(updated.data, data);
        assert_eq!(store.get(doc.id), Some(updated));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = DocumentStore::new();
        let err = store.update(42, SpreadsheetPatch::default()).unwrap_err();
        assert!(matches!(err, TabulaError::NotFound(42)));
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(DocumentStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create(NewSpreadsheet::default()).id)
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(store.len(), 8);
    }
}
