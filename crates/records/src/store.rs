use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::Result;

/// Field name to value map of one row.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// One row as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Row {
    /// String value of `field`, if present and a string.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(serde_json::Value::as_str)
    }
}

/// Table-oriented record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First row of `table` whose `field` equals `value`.
    async fn find(&self, table: &str, field: &str, value: &str) -> Result<Option<Row>>;

    async fn insert(&self, table: &str, fields: Fields) -> Result<Row>;

    /// Write `fields` onto row `id`. Fields not named are left untouched.
    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Row>;
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn str_field_ignores_non_strings() {
        let mut fields = Fields::new();
        fields.insert("ID".into(), json!("ABCDEFGH"));
        fields.insert("Width".into(), json!(640));
        let row = Row {
            id: "rec1".into(),
            fields,
        };
        assert_eq!(row.str_field("ID"), Some("ABCDEFGH"));
        assert_eq!(row.str_field("Width"), None);
        assert_eq!(row.str_field("Missing"), None);
    }
}
