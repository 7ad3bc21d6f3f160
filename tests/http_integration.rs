//! Integration tests for the API client using wiremock
//!
//! These tests verify the HTTP client behavior against mocked endpoints,
//! ensuring proper handling of various response codes and the local store.

use reify::api::auth::Credentials;
use reify::api::client::ApiClient;
use reify::api::http::ApiHttpClient;
use reify::api::storage::ResourceStore;
use reify::resource::{FetchError, ResourceFetcher, ResourceId};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERNAME: &str = "alfred";
const API_KEY: &str = "ae579e7e53fb9abd646a6ff8aa99d4afe83ac291";
const SOURCE: &str = "source/5143a51a37203f2cf7000001";

fn client(server: &MockServer) -> ApiClient {
    let credentials = Credentials::new(USERNAME, API_KEY).expect("valid credentials");
    ApiClient::new(credentials, &server.uri()).expect("valid domain")
}

fn source_id() -> ResourceId {
    ResourceId::parse(SOURCE).unwrap()
}

/// Test module for HTTP client integration tests
mod http_client_tests {
    use super::*;

    /// Test successful GET request unwraps the resource envelope
    #[tokio::test]
    async fn test_get_success_returns_object() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/andromeda/{}", SOURCE)))
            .and(query_param("username", USERNAME))
            .and(query_param("api_key", API_KEY))
            .and(query_param("limit", "-1"))
            .and(query_param("exclude", "root,trees"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "object": {"resource": SOURCE, "name": "iris.csv"}
            })))
            .mount(&server)
            .await;

        let resource = client(&server)
            .fetch(&source_id())
            .await
            .expect("Request should succeed");

        assert_eq!(resource["resource"], SOURCE);
        assert_eq!(resource["name"], "iris.csv");
    }

    /// Test bodies without an envelope are returned as they are
    #[tokio::test]
    async fn test_bare_object_is_accepted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/andromeda/{}", SOURCE)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"resource": SOURCE, "rows": 150})),
            )
            .mount(&server)
            .await;

        let resource = client(&server).fetch(&source_id()).await.unwrap();
        assert_eq!(resource["rows"], 150);
    }

    /// Test 404 response is reported as a missing resource
    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "status": {"message": "Not found"}
            })))
            .mount(&server)
            .await;

        let result = client(&server).fetch(&source_id()).await;
        assert!(matches!(result, Err(FetchError::NotFound(id)) if id == source_id()));
    }

    /// Test 401 response is a fetch failure, not a missing resource
    #[tokio::test]
    async fn test_401_is_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 401,
                "status": {"message": "Unauthorized use"}
            })))
            .mount(&server)
            .await;

        let result = client(&server).fetch(&source_id()).await;
        match result {
            Err(FetchError::Failed { id, message }) => {
                assert_eq!(id, source_id());
                assert!(message.contains("401"), "message: {}", message);
                assert!(!message.contains(API_KEY));
            }
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    /// Test invalid JSON body is a failure
    #[tokio::test]
    async fn test_invalid_json_is_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let http = ApiHttpClient::new().unwrap();
        let result = http.get(&format!("{}/andromeda/{}", server.uri(), SOURCE)).await;
        assert!(result.is_err());
    }
}

/// Tests for the on-disk store in front of the API
mod store_tests {
    use super::*;

    #[tokio::test]
    async fn test_second_fetch_is_served_from_store() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path(format!("/andromeda/{}", SOURCE)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": {"resource": SOURCE, "name": "iris.csv"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).with_store(ResourceStore::new(dir.path()));

        let first = client.fetch(&source_id()).await.unwrap();
        let second = client.fetch(&source_id()).await.unwrap();
        assert_eq!(first, second);

        let stored = dir.path().join(source_id().storage_key());
        assert!(stored.exists());

        client.evict(&source_id());
        assert!(!stored.exists());
    }

    #[tokio::test]
    async fn test_existing_copies_are_not_evicted() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join(source_id().storage_key());
        std::fs::write(&stored, r#"{"resource": "source/5143a51a37203f2cf7000001"}"#).unwrap();

        // No mock mounted: any request would fail
        let client = client(&server).with_store(ResourceStore::new(dir.path()));
        let resource = client.fetch(&source_id()).await.unwrap();
        assert_eq!(resource["resource"], SOURCE);

        client.evict(&source_id());
        assert!(stored.exists());
    }
}
