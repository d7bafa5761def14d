//! Remote listing of resource collections.

use std::time::Instant;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Method;
use specsource_api::ApiClient;
use specsource_types::{ItemPayload, payload_from_json};
use specsource_util::{extract_collection_items, parse_response_json_strict, redact_sensitive};
use tracing::{debug, warn};

/// One listing call for a resource collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub resource_name: String,
    /// Collection path with parent identifiers already substituted
    pub path: String,
    /// Parent identifiers in path order
    pub parent_ids: Vec<String>,
    /// Location of the item array inside a wrapped response body
    pub response_path: Option<String>,
}

/// Outcome of a listing call. `items` is only populated for status 200.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResponse {
    pub status_code: u16,
    pub body: String,
    pub items: Vec<ItemPayload>,
}

impl ListResponse {
    pub fn ok(items: Vec<ItemPayload>) -> Self {
        Self {
            status_code: 200,
            body: String::new(),
            items,
        }
    }

    pub fn with_status(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            items: Vec::new(),
        }
    }
}

/// Executes listing calls. Errors are transport failures; HTTP statuses are
/// reported through [`ListResponse::status_code`].
#[async_trait]
pub trait RemoteLister: Send + Sync {
    async fn list(&self, request: &ListRequest) -> Result<ListResponse>;
}

/// [`RemoteLister`] issuing `GET` requests through an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct HttpRemoteLister {
    client: ApiClient,
}

impl HttpRemoteLister {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteLister for HttpRemoteLister {
    async fn list(&self, request: &ListRequest) -> Result<ListResponse> {
        let start = Instant::now();
        debug!(
            resource = %request.resource_name,
            path = %request.path,
            parent_id_count = request.parent_ids.len(),
            "listing started"
        );

        let response = self
            .client
            .request(Method::GET, &request.path)
            .send()
            .await
            .map_err(|error| anyhow!(error))?;
        let status = response.status();
        let body = response.text().await.map_err(|error| anyhow!(error))?;

        if status.as_u16() != 200 {
            warn!(
                resource = %request.resource_name,
                path = %request.path,
                status = %status,
                body = %redact_sensitive(&body),
                duration_ms = start.elapsed().as_millis(),
                "listing returned unexpected status"
            );
            return Ok(ListResponse::with_status(status.as_u16(), body));
        }

        let payload = parse_response_json_strict(&body, Some(status)).map_err(|error| anyhow!(error))?;
        let elements = extract_collection_items(payload, request.response_path.as_deref())
            .ok_or_else(|| anyhow!("response body for GET {} does not contain a list of items", request.path))?;
        let element_count = elements.len();
        let items: Vec<ItemPayload> = elements.into_iter().filter_map(payload_from_json).collect();
        if items.len() != element_count {
            debug!(
                resource = %request.resource_name,
                skipped = element_count - items.len(),
                "ignored list elements that are not objects"
            );
        }

        debug!(
            resource = %request.resource_name,
            path = %request.path,
            status = %status,
            item_count = items.len(),
            duration_ms = start.elapsed().as_millis(),
            "listing completed"
        );
        Ok(ListResponse {
            status_code: status.as_u16(),
            body,
            items,
        })
    }
}
