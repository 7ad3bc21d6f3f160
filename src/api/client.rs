//! API Client
//!
//! Main client for reading resources from the REST API, combining
//! credentials, the HTTP layer and the optional local store.

use super::auth::Credentials;
use super::http::ApiHttpClient;
use super::storage::ResourceStore;
use crate::resource::{FetchError, ResourceFetcher, ResourceId};
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Default API host
pub const DEFAULT_DOMAIN: &str = "bigml.io";

/// API version path segment
const API_VERSION: &str = "andromeda";

/// Query string asking for the whole field structure but no model trees,
/// which keeps payloads small
const GET_QUERY: &str = "limit=-1&exclude=root,trees";

/// Main API client
pub struct ApiClient {
    pub credentials: Credentials,
    pub http: ApiHttpClient,
    base_url: Url,
    store: Option<ResourceStore>,
}

impl ApiClient {
    /// Create a client for `domain` (a host name such as `bigml.io`, or a
    /// full base URL such as `http://localhost:8080`)
    pub fn new(credentials: Credentials, domain: &str) -> Result<Self> {
        let http = ApiHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            base_url: base_url(domain)?,
            store: None,
        })
    }

    /// Keep a local copy of every fetched resource in `store`
    pub fn with_store(mut self, store: ResourceStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store(&self) -> Option<&ResourceStore> {
        self.store.as_ref()
    }

    /// Build the GET URL for a resource
    pub fn resource_url(&self, id: &ResourceId) -> String {
        format!(
            "{}{}/{}?{}&{}",
            self.base_url,
            API_VERSION,
            id,
            self.credentials.query(),
            GET_QUERY
        )
    }

    /// Read a resource from the API. Returns `None` when it does not exist.
    pub async fn get_resource(&self, id: &ResourceId) -> Result<Option<Value>> {
        let response = self.http.get(&self.resource_url(id)).await?;

        // Responses wrap the resource in an envelope with status metadata
        Ok(response.map(|mut body| match body.get_mut("object") {
            Some(object) => object.take(),
            None => body,
        }))
    }
}

impl ResourceFetcher for ApiClient {
    async fn fetch(&self, id: &ResourceId) -> Result<Value, FetchError> {
        if let Some(resource) = self.store.as_ref().and_then(|store| store.load(id)) {
            return Ok(resource);
        }

        let resource = self
            .get_resource(id)
            .await
            .map_err(|e| FetchError::failed(id, &e))?
            .ok_or_else(|| FetchError::NotFound(id.clone()))?;

        if let Some(store) = &self.store {
            if let Err(e) = store.save(id, &resource) {
                tracing::warn!("Failed to store {}: {:#}", id, e);
            }
        }

        Ok(resource)
    }

    fn evict(&self, id: &ResourceId) {
        if let Some(store) = &self.store {
            store.evict(id);
        }
    }
}

/// Normalize the configured domain into a base URL ending in `/`
fn base_url(domain: &str) -> Result<Url> {
    let domain = domain.trim().trim_end_matches('/');
    let raw = if domain.contains("://") {
        format!("{}/", domain)
    } else {
        format!("https://{}/", domain)
    };

    Url::parse(&raw).with_context(|| format!("Invalid API domain: {}", domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "ae579e7e53fb9abd646a6ff8aa99d4afe83ac291";

    #[test]
    fn test_resource_url() {
        let credentials = Credentials::new("alfred", KEY).unwrap();
        let client = ApiClient::new(credentials, DEFAULT_DOMAIN).unwrap();
        let id = ResourceId::parse("model/5143a51a37203f2cf7000001").unwrap();

        assert_eq!(
            client.resource_url(&id),
            format!(
                "https://bigml.io/andromeda/model/5143a51a37203f2cf7000001?username=alfred&api_key={}&limit=-1&exclude=root,trees",
                KEY
            )
        );
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        assert_eq!(
            base_url("http://localhost:8080/").unwrap().as_str(),
            "http://localhost:8080/"
        );
        assert!(base_url("not a domain").is_err());
    }
}
