//! Airtable REST implementation of [`RecordStore`].

use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::json,
    tracing::debug,
};

use crate::{
    Error, Result,
    error::Context,
    store::{Fields, RecordStore, Row},
};

#[derive(Debug, Clone)]
pub struct AirtableOptions {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub base_id: String,
    pub timeout: Duration,
}

/// Client bound to one Airtable base.
#[derive(Debug, Clone)]
pub struct AirtableStore {
    http: reqwest::Client,
    api_url: String,
    api_key: Secret<String>,
    base_id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<Row>,
}

impl AirtableStore {
    pub fn new(options: AirtableOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::external("failed to build airtable http client", e))?;
        Ok(Self {
            http,
            api_url: options.api_url.trim_end_matches('/').to_string(),
            api_key: options.api_key,
            base_id: options.base_id,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_url,
            urlencoding::encode(&self.base_id),
            urlencoding::encode(table)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = request
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| Error::external(format!("airtable {what} request failed"), e))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }
        Ok(resp)
    }
}

/// Airtable formula matching rows where `field` equals the string `value`.
#[must_use]
pub fn equality_formula(field: &str, value: &str) -> String {
    let field = field.replace('}', "\\}");
    let value = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("{{{field}}} = '{value}'")
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn find(&self, table: &str, field: &str, value: &str) -> Result<Option<Row>> {
        let formula = equality_formula(field, value);
        debug!(table, formula = %formula, "airtable find");
        let request = self
            .http
            .get(self.table_url(table))
            .query(&[("filterByFormula", formula.as_str()), ("maxRecords", "1")]);
        let resp = self.send(request, "list").await?;
        let list: ListResponse = resp
            .json()
            .await
            .with_context(|| format!("failed to decode {table} list response"))?;
        Ok(list.records.into_iter().next())
    }

    async fn insert(&self, table: &str, fields: Fields) -> Result<Row> {
        debug!(table, "airtable insert");
        let request = self
            .http
            .post(self.table_url(table))
            .json(&json!({ "fields": fields }));
        let resp = self.send(request, "create").await?;
        resp.json::<Row>()
            .await
            .with_context(|| format!("failed to decode {table} create response"))
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Row> {
        debug!(table, id, "airtable update");
        let url = format!("{}/{}", self.table_url(table), urlencoding::encode(id));
        let request = self.http.patch(url).json(&json!({ "fields": fields }));
        let resp = self.send(request, "update").await?;
        resp.json::<Row>()
            .await
            .with_context(|| format!("failed to decode {table} update response"))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn store(server: &mockito::Server) -> AirtableStore {
        AirtableStore::new(AirtableOptions {
            api_url: server.url(),
            api_key: Secret::new("keyTEST".into()),
            base_id: "appBase".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn formula_escapes_quotes() {
        assert_eq!(equality_formula("ID", "ABCD"), "{ID} = 'ABCD'");
        assert_eq!(
            equality_formula("Chapter Name", "O'Hare"),
            "{Chapter Name} = 'O\\'Hare'"
        );
    }

    #[tokio::test]
    async fn find_returns_first_match() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/appBase/Senders")
            .match_header("authorization", "Bearer keyTEST")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filterByFormula".into(), "{ID} = 'ABCDEFGH'".into()),
                Matcher::UrlEncoded("maxRecords".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records":[{"id":"rec1","createdTime":"2024-01-01T00:00:00.000Z","fields":{"ID":"ABCDEFGH"}}]}"#)
            .create_async()
            .await;

        let row = store(&server)
            .find("Senders", "ID", "ABCDEFGH")
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;
        assert_eq!(row.id, "rec1");
        assert_eq!(row.str_field("ID"), Some("ABCDEFGH"));
    }

    #[tokio::test]
    async fn find_returns_none_when_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/appBase/Chapter%20Setup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"records":[]}"#)
            .create_async()
            .await;

        let row = store(&server)
            .find("Chapter Setup", "SMS Phone Number", "+15551234567")
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn insert_posts_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/appBase/Messages")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fields": { "Chapter": "Portland", "Sender": ["rec1"] }
            })))
            .with_status(200)
            .with_body(r#"{"id":"rec2","fields":{"Chapter":"Portland","Sender":["rec1"]}}"#)
            .create_async()
            .await;

        let mut fields = Fields::new();
        fields.insert("Chapter".into(), json!("Portland"));
        fields.insert("Sender".into(), json!(["rec1"]));
        let row = store(&server).insert("Messages", fields).await.unwrap();
        mock.assert_async().await;
        assert_eq!(row.id, "rec2");
    }

    #[tokio::test]
    async fn update_patches_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/appBase/Senders/rec1")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "fields": { "Last Long Response": "2024-05-01T12:00:00+00:00" }
            })))
            .with_status(200)
            .with_body(r#"{"id":"rec1","fields":{"ID":"ABCDEFGH","Last Long Response":"2024-05-01T12:00:00+00:00"}}"#)
            .create_async()
            .await;

        let mut fields = Fields::new();
        fields.insert(
            "Last Long Response".into(),
            json!("2024-05-01T12:00:00+00:00"),
        );
        let row = store(&server)
            .update("Senders", "rec1", fields)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(row.id, "rec1");
    }

    #[tokio::test]
    async fn api_error_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/appBase/Photos")
            .with_status(422)
            .with_body(r#"{"error":{"type":"INVALID_VALUE_FOR_COLUMN"}}"#)
            .create_async()
            .await;

        let err = store(&server)
            .insert("Photos", Fields::new())
            .await
            .unwrap_err();
        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("INVALID_VALUE_FOR_COLUMN"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }
}
