//! REST transport for the remote document store.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET    users/{uid}`                   user document (404 = none)
//! - `PATCH  users/{uid}`                   merge fields into the user document
//! - `GET    users/{uid}/{collection}`      `{"documents": [{"id", "data"}]}`
//! - `POST   users/{uid}/{collection}`      create, responds `{"id"}`
//! - `PUT    users/{uid}/{collection}/{id}` create or replace

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{DocumentStore, RemoteCollection, RemoteDocument, SyncError};
use crate::config::RemoteConfig;

/// Blocking HTTP client for the remote mirror.
///
/// Must be built and dropped outside of an async context; the service layer
/// only touches it from `spawn_blocking`.
pub struct HttpDocumentStore {
    base_url: Url,
    client: Client,
    auth_token: Option<String>,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RemoteDocument>,
}

impl HttpDocumentStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, SyncError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SyncError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Http(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            auth_token: config.auth_token.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SyncError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request.send().map_err(|e| {
            if e.is_connect() {
                SyncError::Unavailable(self.base_url.to_string())
            } else if e.is_timeout() {
                SyncError::Http(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                SyncError::Http(e.to_string())
            }
        })
    }

    fn expect_success(response: Response) -> Result<Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SyncError::RemoteStatus {
            status: status.as_u16(),
            body,
        })
    }

    fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        let text = response.text().map_err(|e| SyncError::Http(e.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl DocumentStore for HttpDocumentStore {
    fn add_document(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        data: &Map<String, Value>,
    ) -> Result<String, SyncError> {
        let url = self.endpoint(&["users", user_id, collection.as_str()])?;
        let response = Self::expect_success(self.send(self.client.post(url).json(data))?)?;
        let created: CreatedResponse = Self::read_json(response)?;
        Ok(created.id)
    }

    fn set_document(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        doc_id: &str,
        data: &Map<String, Value>,
    ) -> Result<(), SyncError> {
        let url = self.endpoint(&["users", user_id, collection.as_str(), doc_id])?;
        Self::expect_success(self.send(self.client.put(url).json(data))?)?;
        Ok(())
    }

    fn merge_user_document(&self, user_id: &str, data: &Map<String, Value>) -> Result<(), SyncError> {
        let url = self.endpoint(&["users", user_id])?;
        Self::expect_success(self.send(self.client.patch(url).json(data))?)?;
        Ok(())
    }

    fn get_user_document(&self, user_id: &str) -> Result<Option<Map<String, Value>>, SyncError> {
        let url = self.endpoint(&["users", user_id])?;
        let response = self.send(self.client.get(url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response)?;
        Ok(Some(Self::read_json(response)?))
    }

    fn list_documents(
        &self,
        user_id: &str,
        collection: RemoteCollection,
    ) -> Result<Vec<RemoteDocument>, SyncError> {
        let url = self.endpoint(&["users", user_id, collection.as_str()])?;
        let response = Self::expect_success(self.send(self.client.get(url))?)?;
        let list: ListResponse = Self::read_json(response)?;
        Ok(list.documents)
    }
}
