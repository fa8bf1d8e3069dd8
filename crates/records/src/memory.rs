use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use {async_trait::async_trait, serde_json::Value};

use crate::{
    Error, Result,
    store::{Fields, RecordStore, Row},
};

/// Process-local record store. Rows are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    next_id: AtomicU64,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row in `table`, in insertion order.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned().unwrap_or_default()
    }

    fn next_row_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("rec{n:014}")
    }
}

fn value_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s == needle,
        Value::Null => false,
        other => other.to_string() == needle,
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, table: &str, field: &str, value: &str) -> Result<Option<Row>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.get(table).and_then(|rows| {
            rows.iter()
                .find(|row| row.fields.get(field).is_some_and(|v| value_matches(v, value)))
                .cloned()
        }))
    }

    async fn insert(&self, table: &str, fields: Fields) -> Result<Row> {
        let row = Row {
            id: self.next_row_id(),
            fields,
        };
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Row> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row.id == id))
            .ok_or_else(|| Error::row_not_found(table, id))?;
        row.fields.extend(fields);
        Ok(row.clone())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryRecordStore::new();
        let row = store
            .insert("Senders", fields(&[("ID", json!("ABCDEFGH"))]))
            .await
            .unwrap();
        assert!(row.id.starts_with("rec"));

        let found = store.find("Senders", "ID", "ABCDEFGH").await.unwrap();
        assert_eq!(found.unwrap().id, row.id);
        assert!(store.find("Senders", "ID", "ZZZZZZZZ").await.unwrap().is_none());
        assert!(store.find("Missing", "ID", "ABCDEFGH").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_named_fields() {
        let store = MemoryRecordStore::new();
        let row = store
            .insert("Photos", fields(&[("Width", json!(1)), ("Height", json!(2))]))
            .await
            .unwrap();
        let updated = store
            .update("Photos", &row.id, fields(&[("Width", json!(10))]))
            .await
            .unwrap();
        assert_eq!(updated.fields["Width"], json!(10));
        assert_eq!(updated.fields["Height"], json!(2));
    }

    #[tokio::test]
    async fn update_unknown_row_fails() {
        let store = MemoryRecordStore::new();
        let err = store
            .update("Photos", "recMissing", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RowNotFound { .. }));
    }

    #[tokio::test]
    async fn finds_numeric_values_by_text() {
        let store = MemoryRecordStore::new();
        store
            .insert("Photos", fields(&[("Width", json!(640))]))
            .await
            .unwrap();
        assert!(store.find("Photos", "Width", "640").await.unwrap().is_some());
    }
}
