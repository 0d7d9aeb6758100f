//! HTTP adapter for a HAL-style collection endpoint.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared::{
    error::{ErrorCode, RepositoryFailure},
    protocol::{Collection, FacetResult, PageMeta, Resource, ResourceId},
    request::Request,
    router::QueryParams,
};
use tracing::debug;
use url::Url;

use crate::{
    query,
    registry::{Repository, RepositoryResult},
};

#[derive(Debug, Default, Deserialize)]
struct HalCollection {
    #[serde(default, rename = "_embedded")]
    embedded: Map<String, Value>,
    #[serde(default)]
    page: Option<PageMeta>,
    #[serde(default)]
    facets: Vec<FacetResult>,
}

pub struct RestRepository {
    http: Client,
    base_url: String,
    collection: String,
}

impl RestRepository {
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, collection)
    }

    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, self.collection)
    }

    /// The id is appended as one percent-encoded path segment.
    fn resource_url(&self, id: &ResourceId) -> RepositoryResult<Url> {
        let mut url = Url::parse(&self.collection_url()).map_err(|err| {
            RepositoryFailure::new(ErrorCode::Validation, format!("invalid base url: {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                RepositoryFailure::new(ErrorCode::Validation, "base url cannot carry a path")
            })?
            .push(id.as_str());
        Ok(url)
    }

    /// Sends the request and returns the JSON body, if any. Non-2xx statuses
    /// become a [`RepositoryFailure`] carrying whatever JSON payload came back;
    /// a 2xx body that is not JSON is a malformed response.
    async fn send(&self, request: RequestBuilder) -> RepositoryResult<Option<Value>> {
        let response = request
            .send()
            .await
            .map_err(|err| RepositoryFailure::transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RepositoryFailure::transport(err.to_string()))?;
        let empty = bytes.is_empty() || status == StatusCode::NO_CONTENT;

        if !status.is_success() {
            debug!(collection = %self.collection, status = status.as_u16(), "request rejected");
            let body = if empty {
                None
            } else {
                serde_json::from_slice::<Value>(&bytes).ok()
            };
            return Err(RepositoryFailure::from_response(status.as_u16(), body));
        }
        if empty {
            return Ok(None);
        }
        serde_json::from_slice::<Value>(&bytes)
            .map(Some)
            .map_err(malformed)
    }

    async fn fetch_collection(&self, request: RequestBuilder) -> RepositoryResult<Collection> {
        let body = self.send(request).await?.unwrap_or(Value::Null);
        self.decode_collection(body)
    }

    fn decode_collection(&self, body: Value) -> RepositoryResult<Collection> {
        if body.is_null() {
            return Ok(Collection::default());
        }
        let hal: HalCollection = serde_json::from_value(body).map_err(malformed)?;

        // Embedded items are keyed by relation name, which may differ from the
        // collection path.
        let items = hal
            .embedded
            .get(&self.collection)
            .or_else(|| hal.embedded.values().find(|value| value.is_array()))
            .cloned()
            .map(serde_json::from_value::<Vec<Resource>>)
            .transpose()
            .map_err(malformed)?
            .unwrap_or_default();

        let page = hal.page.unwrap_or(PageMeta {
            size: items.len() as u64,
            total_elements: items.len() as u64,
            total_pages: u64::from(!items.is_empty()),
            number: 0,
        });

        Ok(Collection {
            items,
            facets: hal.facets,
            page,
        })
    }

    async fn write(&self, request: RequestBuilder, sent: Resource) -> RepositoryResult<Resource> {
        match self.send(request).await? {
            Some(body) => serde_json::from_value(body).map_err(malformed),
            None => Ok(sent),
        }
    }

    fn require_id(resource: &Resource) -> RepositoryResult<&ResourceId> {
        resource
            .id
            .as_ref()
            .ok_or_else(|| RepositoryFailure::new(ErrorCode::Validation, "resource has no id"))
    }
}

fn malformed(err: serde_json::Error) -> RepositoryFailure {
    RepositoryFailure::new(ErrorCode::Internal, format!("malformed response: {err}"))
}

fn query_pairs(params: &QueryParams) -> Vec<(&str, &str)> {
    params.iter().collect()
}

#[async_trait]
impl Repository for RestRepository {
    async fn list_all(&self) -> RepositoryResult<Collection> {
        self.fetch_collection(self.http.get(self.collection_url()))
            .await
    }

    async fn page(&self, request: &Request) -> RepositoryResult<Collection> {
        let params = query::encode_pageable(&request.pageable);
        self.fetch_collection(
            self.http
                .get(self.collection_url())
                .query(&query_pairs(&params)),
        )
        .await
    }

    async fn search(&self, request: &Request) -> RepositoryResult<Collection> {
        let params = query::encode(request);
        self.fetch_collection(
            self.http
                .get(format!("{}/search/faceted", self.collection_url()))
                .query(&query_pairs(&params)),
        )
        .await
    }

    async fn create(&self, resource: Resource) -> RepositoryResult<Resource> {
        let request = self.http.post(self.collection_url()).json(&resource);
        self.write(request, resource).await
    }

    async fn replace(&self, resource: Resource) -> RepositoryResult<Resource> {
        let request = self
            .http
            .put(self.resource_url(Self::require_id(&resource)?)?)
            .json(&resource);
        self.write(request, resource).await
    }

    async fn patch(&self, resource: Resource) -> RepositoryResult<Resource> {
        let request = self
            .http
            .patch(self.resource_url(Self::require_id(&resource)?)?)
            .json(&resource);
        self.write(request, resource).await
    }

    async fn remove(&self, id: &ResourceId) -> RepositoryResult<()> {
        self.send(self.http.delete(self.resource_url(id)?))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
