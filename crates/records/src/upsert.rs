//! Idempotent write helpers on top of [`RecordStore`].

use tracing::debug;

use crate::{
    Result,
    store::{Fields, RecordStore},
};

/// Return the id of the row whose `field` equals `value`, inserting `fields`
/// when there is none. An existing row is never modified.
///
/// For tables with a natural key and no merge rules. The dispatcher does not
/// call it: photo rows are always inserted and sender rows go through
/// [`upsert_with_merge`].
pub async fn find_or_insert(
    store: &dyn RecordStore,
    table: &str,
    field: &str,
    value: &str,
    fields: Fields,
) -> Result<String> {
    if let Some(row) = store.find(table, field, value).await? {
        debug!(table, field, id = %row.id, "row exists");
        return Ok(row.id);
    }
    let row = store.insert(table, fields).await?;
    debug!(table, field, id = %row.id, "row inserted");
    Ok(row.id)
}

/// Insert or merge-and-update the row whose `field` equals `value`.
///
/// On insert only `allowed` fields of `fields` are written. On update the
/// existing fields are overlaid with `fields` (new values win) and the merged
/// map is filtered to `allowed` before it is written back. Fields outside
/// `allowed` are dropped silently. Returns the row id.
pub async fn upsert_with_merge(
    store: &dyn RecordStore,
    table: &str,
    field: &str,
    value: &str,
    fields: Fields,
    allowed: &[&str],
) -> Result<String> {
    match store.find(table, field, value).await? {
        None => {
            let row = store.insert(table, retain_allowed(fields, allowed)).await?;
            debug!(table, field, id = %row.id, "upsert inserted row");
            Ok(row.id)
        },
        Some(existing) => {
            let mut merged = existing.fields;
            merged.extend(fields);
            let row = store
                .update(table, &existing.id, retain_allowed(merged, allowed))
                .await?;
            debug!(table, field, id = %row.id, "upsert updated row");
            Ok(row.id)
        },
    }
}

fn retain_allowed(fields: Fields, allowed: &[&str]) -> Fields {
    fields
        .into_iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::memory::MemoryRecordStore,
        serde_json::{Value, json},
    };

    const ALLOWED: &[&str] = &["ID", "Last Long Response", "Messages"];

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn find_or_insert_is_idempotent() {
        let store = MemoryRecordStore::new();
        let first = find_or_insert(
            &store,
            "Senders",
            "ID",
            "ABCDEFGH",
            fields(&[("ID", json!("ABCDEFGH")), ("Note", json!("first"))]),
        )
        .await
        .unwrap();
        let second = find_or_insert(
            &store,
            "Senders",
            "ID",
            "ABCDEFGH",
            fields(&[("ID", json!("ABCDEFGH")), ("Note", json!("second"))]),
        )
        .await
        .unwrap();

        assert_eq!(first, second);
        let rows = store.rows("Senders");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields["Note"], json!("first"));
    }

    #[tokio::test]
    async fn insert_drops_fields_outside_allow_list() {
        let store = MemoryRecordStore::new();
        upsert_with_merge(
            &store,
            "Senders",
            "ID",
            "ABCDEFGH",
            fields(&[("ID", json!("ABCDEFGH")), ("Phone", json!("+15559876543"))]),
            ALLOWED,
        )
        .await
        .unwrap();

        let rows = store.rows("Senders");
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].fields.contains_key("Phone"));
    }

    #[tokio::test]
    async fn update_merges_with_latest_write_winning() {
        let store = MemoryRecordStore::new();
        let id = upsert_with_merge(
            &store,
            "Senders",
            "ID",
            "ABCDEFGH",
            fields(&[
                ("ID", json!("ABCDEFGH")),
                ("Last Long Response", json!("2024-01-01T00:00:00+00:00")),
                ("Messages", json!(["rec9"])),
            ]),
            ALLOWED,
        )
        .await
        .unwrap();

        let again = upsert_with_merge(
            &store,
            "Senders",
            "ID",
            "ABCDEFGH",
            fields(&[
                ("ID", json!("ABCDEFGH")),
                ("Last Long Response", json!("2024-06-01T00:00:00+00:00")),
                ("Extra", json!(true)),
            ]),
            ALLOWED,
        )
        .await
        .unwrap();

        assert_eq!(id, again);
        let rows = store.rows("Senders");
        assert_eq!(rows.len(), 1);
        let row = &rows[0].fields;
        assert_eq!(row["Last Long Response"], json!("2024-06-01T00:00:00+00:00"));
        assert_eq!(row["Messages"], json!(["rec9"]));
        assert!(!row.contains_key("Extra"));
    }
}
