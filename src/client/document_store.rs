use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;

use chrono::{DateTime, Utc};

use reqwest::Client;

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use url::Url;

/// Client for the document store's REST API.
///
/// The store exposes collections of documents whose fields are wrapped in
/// typed value envelopes (`{"stringValue": …}` and friends). This client
/// only moves wrapped documents and queries over the wire; translating
/// documents into domain records is the repositories' job.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    client: Client,

    documents_url: Url,
    run_query_url: Url,
    api_auth_token: Secret<String>,
}

impl DocumentClient {
    pub fn new(
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let documents_url = api_base_url
            .join("documents/")
            .context("Failed to create documents endpoint URL")?;

        // The query endpoint hangs off the documents resource itself
        let run_query_url = {
            let mut url = documents_url.clone();
            url.set_path(&format!("{}:runQuery", url.path().trim_end_matches('/')));
            url
        };

        Ok(Self {
            client,
            documents_url,
            run_query_url,
            api_auth_token,
        })
    }

    /// Execute a structured query, returning the matching documents
    pub async fn run_query(&self, query: &QueryBuilder) -> anyhow::Result<Vec<Document>> {
        use secrecy::ExposeSecret;

        let rows: Vec<QueryRow> = self
            .client
            .post(self.run_query_url.clone())
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(&query.to_request())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode query response")?;

        // Rows without a document carry query metadata only
        Ok(rows.into_iter().filter_map(|row| row.document).collect())
    }

    /// Insert a new document into a collection. Without an explicit
    /// `document_id` the store assigns a random one.
    pub async fn create(
        &self,
        collection: &str,
        document_id: Option<&str>,
        fields: BTreeMap<String, FieldValue>,
    ) -> anyhow::Result<()> {
        use secrecy::ExposeSecret;

        let url = self
            .documents_url
            .join(collection)
            .context("Failed to create collection URL")?;

        let mut request = self
            .client
            .post(url)
            .bearer_auth(self.api_auth_token.expose_secret());

        if let Some(document_id) = document_id {
            request = request.query(&[("documentId", document_id)]);
        }

        request
            .json(&DocumentBody { fields })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Patch specific fields of one document, leaving the rest untouched
    pub async fn patch(
        &self,
        collection: &str,
        document_id: &str,
        fields: BTreeMap<String, FieldValue>,
    ) -> anyhow::Result<()> {
        use secrecy::ExposeSecret;

        let url = self
            .documents_url
            .join(&format!("{}/{}", collection, document_id))
            .context("Failed to create document URL")?;

        let mask: Vec<(&str, &String)> = fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", field))
            .collect();

        self.client
            .patch(url)
            .query(&mask)
            .bearer_auth(self.api_auth_token.expose_secret())
            .json(&DocumentBody { fields })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// A typed field value as the store represents it on the wire.
///
/// Integers travel as strings, per the store's JSON dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    StringValue(String),
    IntegerValue(String),
    BooleanValue(bool),
    TimestampValue(DateTime<Utc>),
}

impl FieldValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Self::IntegerValue(value.to_string())
    }

    pub fn boolean(value: bool) -> Self {
        Self::BooleanValue(value)
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Self::TimestampValue(value)
    }
}

/// A stored document: full resource name plus wrapped field values
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    pub name: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Document id: the last segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn str_field(&self, field: &str) -> anyhow::Result<&str> {
        match self.field(field)? {
            FieldValue::StringValue(value) => Ok(value),
            other => anyhow::bail!("Field {} is not a string: {:?}", field, other),
        }
    }

    pub fn int_field(&self, field: &str) -> anyhow::Result<i64> {
        match self.field(field)? {
            FieldValue::IntegerValue(value) => value
                .parse()
                .with_context(|| format!("Field {} holds a malformed integer", field)),
            other => anyhow::bail!("Field {} is not an integer: {:?}", field, other),
        }
    }

    pub fn bool_field(&self, field: &str) -> anyhow::Result<bool> {
        match self.field(field)? {
            FieldValue::BooleanValue(value) => Ok(*value),
            other => anyhow::bail!("Field {} is not a boolean: {:?}", field, other),
        }
    }

    pub fn timestamp_field(&self, field: &str) -> anyhow::Result<DateTime<Utc>> {
        match self.field(field)? {
            FieldValue::TimestampValue(value) => Ok(*value),
            other => anyhow::bail!("Field {} is not a timestamp: {:?}", field, other),
        }
    }

    fn field(&self, field: &str) -> anyhow::Result<&FieldValue> {
        self.fields
            .get(field)
            .with_context(|| format!("Document {} is missing field {}", self.id(), field))
    }
}

#[derive(Debug, Serialize)]
struct DocumentBody {
    fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<Document>,
}

/// Builder for the structured queries the store understands: a single
/// collection plus an AND of equality / greater-than field filters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    collection: String,
    filters: Vec<serde_json::Value>,
}

impl QueryBuilder {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
        }
    }

    pub fn field_equal(self, field: &str, value: FieldValue) -> Self {
        self.field_filter(field, "EQUAL", value)
    }

    pub fn field_greater_than(self, field: &str, value: FieldValue) -> Self {
        self.field_filter(field, "GREATER_THAN", value)
    }

    fn field_filter(mut self, field: &str, op: &str, value: FieldValue) -> Self {
        self.filters.push(serde_json::json!({
            "fieldFilter": {
                "field": { "fieldPath": field },
                "op": op,
                "value": value,
            }
        }));
        self
    }

    fn to_request(&self) -> serde_json::Value {
        let mut query = serde_json::json!({
            "from": [{ "collectionId": self.collection }],
        });

        if !self.filters.is_empty() {
            query["where"] = serde_json::json!({
                "compositeFilter": {
                    "op": "AND",
                    "filters": self.filters,
                }
            });
        }

        serde_json::json!({ "structuredQuery": query })
    }
}
