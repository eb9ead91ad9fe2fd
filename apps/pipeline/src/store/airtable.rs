//! Airtable REST client. The only module that talks HTTP to the record store.
//!
//! Table and record ids are pushed as path segments, so names with spaces
//! ("Personal Details") are percent-encoded. Pagination uses the `offset`
//! cursor Airtable returns alongside each page.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::models::{Fields, Page, Record};
use crate::store::RecordStore;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct FieldsBody<'a> {
    fields: &'a Fields,
}

#[derive(Debug, Deserialize)]
struct AirtableError {
    error: AirtableErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AirtableErrorBody {
    Detailed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
    Code(String),
}

impl AirtableErrorBody {
    fn into_message(self) -> String {
        match self {
            AirtableErrorBody::Detailed {
                kind,
                message: Some(message),
            } => format!("{kind}: {message}"),
            AirtableErrorBody::Detailed { kind, message: None } => kind,
            AirtableErrorBody::Code(code) => code,
        }
    }
}

#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    api_url: String,
    base_id: String,
    api_key: String,
}

impl AirtableClient {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            base_id: config.base_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str, id: Option<&str>) -> Result<Url, StoreError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidUrl(self.api_url.clone()))?;
            segments.pop_if_empty().push(&self.base_id).push(table);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Turns a non-2xx response into `StoreError::Api`, preferring the
    /// message from Airtable's error envelope over the raw body.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AirtableError>(&body)
            .map(|e| e.error.into_message())
            .unwrap_or(body);
        warn!("Airtable returned {}: {}", status, message);
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn fetch_page(&self, table: &str, offset: Option<&str>) -> Result<Page, StoreError> {
        let mut request = self
            .client
            .get(self.table_url(table, None)?)
            .bearer_auth(&self.api_key);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = Self::check(request.send().await?).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError> {
        let response = self
            .client
            .post(self.table_url(table, None)?)
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields: &fields })
            .send()
            .await?;

        let body = Self::check(response).await?.text().await?;
        let record: Record = serde_json::from_str(&body)?;
        debug!(table, id = %record.id, "created record");
        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.table_url(table, Some(id))?)
            .bearer_auth(&self.api_key)
            .json(&FieldsBody { fields: &fields })
            .send()
            .await?;

        Self::check(response).await?;
        debug!(table, id, "updated record");
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.table_url(table, Some(id))?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::check(response).await?;
        debug!(table, id, "deleted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> AirtableClient {
        AirtableClient::new(&StoreConfig {
            api_url: api_url.to_string(),
            base_id: "appBase123".to_string(),
            api_key: "pat-test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_table_url_encodes_spaces() {
        let url = client("https://api.airtable.com/v0")
            .table_url("Personal Details", None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appBase123/Personal%20Details"
        );
    }

    #[test]
    fn test_table_url_with_record_id_and_trailing_slash() {
        let url = client("https://api.airtable.com/v0/")
            .table_url("Applicants", Some("recXYZ"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appBase123/Applicants/recXYZ"
        );
    }

    #[test]
    fn test_invalid_base_url_is_reported() {
        let err = client("not a url").table_url("Applicants", None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl(_)));
    }

    #[test]
    fn test_error_envelope_messages() {
        let detailed: AirtableError = serde_json::from_str(
            r#"{"error": {"type": "INVALID_PERMISSIONS", "message": "not allowed"}}"#,
        )
        .unwrap();
        assert_eq!(
            detailed.error.into_message(),
            "INVALID_PERMISSIONS: not allowed"
        );

        let code: AirtableError = serde_json::from_str(r#"{"error": "NOT_FOUND"}"#).unwrap();
        assert_eq!(code.error.into_message(), "NOT_FOUND");
    }

    #[test]
    fn test_fields_body_shape() {
        let mut fields = Fields::new();
        fields.insert("Compressed JSON".to_string(), "{}".into());
        let body = serde_json::to_value(FieldsBody { fields: &fields }).unwrap();
        assert_eq!(body["fields"]["Compressed JSON"], "{}");
    }
}
