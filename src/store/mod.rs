pub mod registry;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

use crate::config::{AppConfig, ConfigError, Credentials};

/// Coordinate bounds of the map, matching the fixed plot axes
pub const COORD_MIN: i64 = 0;
pub const COORD_MAX: i64 = 500;

/// Step used by the coordinate inputs
pub const COORD_STEP: i64 = 10;

/// One named point on the map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("{axis} must be between {COORD_MIN} and {COORD_MAX}, got {value}")]
    CoordinateOutOfRange { axis: &'static str, value: i64 },
}

impl Friend {
    /// Build a record from raw form input: trims the name, rejects empty
    /// names and out-of-range coordinates.
    pub fn validated(name: &str, x: i64, y: i64) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        for (axis, value) in [("x", x), ("y", y)] {
            if !(COORD_MIN..=COORD_MAX).contains(&value) {
                return Err(ValidationError::CoordinateOutOfRange { axis, value });
            }
        }
        Ok(Self {
            name: name.to_string(),
            x,
            y,
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or credentials rejected
    #[error("database unreachable: {0}")]
    Connection(String),

    /// The store answered but the read/write/delete failed
    #[error("store request failed: {0}")]
    Storage(String),
}

/// Client for the realtime-database REST API. One collection holds all
/// friend records; the store assigns record keys on push.
///
/// Constructed once at startup and handed to the registry; there is no
/// module-level connection state.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base: Url,
    collection: String,
    secret: String,
}

/// RTDB answers a POST with the generated child key
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl StoreClient {
    pub fn new(config: &AppConfig, creds: &Credentials) -> Result<Self, ConfigError> {
        let mut raw = config.database_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| ConfigError::InvalidDatabaseUrl {
                url: config.database_url.clone(),
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            collection: config.collection.clone(),
            secret: creds.database_secret.trim().to_string(),
        })
    }

    /// Build `{base}/{collection}.json?auth=…` or
    /// `{base}/{collection}/{id}.json?auth=…`
    fn endpoint(&self, id: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Connection("database url cannot be a base".to_string()))?;
            segments.pop_if_empty();
            match id {
                Some(id) => {
                    segments.push(&self.collection);
                    segments.push(&format!("{id}.json"));
                }
                None => {
                    segments.push(&format!("{}.json", self.collection));
                }
            }
        }
        url.query_pairs_mut().append_pair("auth", &self.secret);
        Ok(url)
    }

    /// Bulk-read the whole collection. The store returns JSON `null` when
    /// the collection is empty.
    pub async fn fetch_all(&self) -> Result<BTreeMap<String, Friend>, StoreError> {
        let url = self.endpoint(None)?;
        let response = self.http.get(url).send().await.map_err(transport)?;
        let response = check_status(response)?;
        let body: Option<BTreeMap<String, Friend>> = response.json().await.map_err(transport)?;
        Ok(body.unwrap_or_default())
    }

    /// Append a record; the store generates and returns the new key.
    pub async fn push(&self, friend: &Friend) -> Result<String, StoreError> {
        let url = self.endpoint(None)?;
        let response = self
            .http
            .post(url)
            .json(friend)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response)?;
        let push: PushResponse = response.json().await.map_err(transport)?;
        Ok(push.name)
    }

    /// Delete by key. The store treats a missing key as a successful no-op,
    /// and so do we.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(Some(id))?;
        let response = self.http.delete(url).send().await.map_err(transport)?;
        check_status(response)?;
        Ok(())
    }

    /// Shallow read used once at startup so a bad endpoint or rejected
    /// credentials fail before the terminal goes raw.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut url = self.endpoint(None)?;
        url.query_pairs_mut().append_pair("shallow", "true");
        let response = self.http.get(url).send().await.map_err(transport)?;
        check_status(response)?;
        Ok(())
    }
}

/// Map transport-level failures. `without_url` keeps the auth query
/// parameter out of error messages.
fn transport(e: reqwest::Error) -> StoreError {
    let e = e.without_url();
    if e.is_connect() || e.is_timeout() || e.is_request() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Storage(e.to_string())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::Connection(format!(
            "credentials rejected (HTTP {})",
            status.as_u16()
        )));
    }
    Err(StoreError::Storage(format!(
        "store returned HTTP {}",
        status.as_u16()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::DELETE, Method::GET, Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer) -> StoreClient {
        let config = AppConfig {
            database_url: server.base_url(),
            collection: "friend_houses".to_string(),
            credential_file: None,
            refresh_secs: 10,
        };
        let creds = Credentials {
            database_secret: "test-secret".to_string(),
        };
        StoreClient::new(&config, &creds).unwrap()
    }

    fn unreachable_client() -> StoreClient {
        let config = AppConfig {
            database_url: "http://127.0.0.1:9/".to_string(),
            collection: "friend_houses".to_string(),
            credential_file: None,
            refresh_secs: 10,
        };
        let creds = Credentials {
            database_secret: "test-secret".to_string(),
        };
        StoreClient::new(&config, &creds).unwrap()
    }

    #[test]
    fn test_validated_trims_name() {
        let friend = Friend::validated("  Alice  ", 100, 200).unwrap();
        assert_eq!(friend.name, "Alice");
        assert_eq!((friend.x, friend.y), (100, 200));
    }

    #[test]
    fn test_validated_rejects_empty_and_whitespace_names() {
        assert_eq!(
            Friend::validated("", 10, 10),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            Friend::validated("   ", 10, 10),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn test_validated_coordinate_bounds() {
        assert!(Friend::validated("A", 0, 500).is_ok());
        assert!(Friend::validated("A", 500, 0).is_ok());
        assert_eq!(
            Friend::validated("A", -1, 10),
            Err(ValidationError::CoordinateOutOfRange {
                axis: "x",
                value: -1
            })
        );
        assert_eq!(
            Friend::validated("A", 10, 501),
            Err(ValidationError::CoordinateOutOfRange {
                axis: "y",
                value: 501
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_all_treats_null_as_empty() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/friend_houses.json")
                .query_param("auth", "test-secret");
            then.status(200)
                .header("content-type", "application/json")
                .body("null");
        });

        let friends = client_for(&server).fetch_all().await.unwrap();
        assert!(friends.is_empty());
        mock.assert();
    }

    #[tokio::test]
    async fn test_fetch_all_decodes_records() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/friend_houses.json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "-Na1": {"name": "Alice", "x": 100, "y": 200},
                    "-Nb2": {"name": "Bob", "x": 0, "y": 0},
                }));
        });

        let friends = client_for(&server).fetch_all().await.unwrap();
        assert_eq!(friends.len(), 2);
        assert_eq!(friends["-Na1"].name, "Alice");
        assert_eq!((friends["-Nb2"].x, friends["-Nb2"].y), (0, 0));
    }

    #[tokio::test]
    async fn test_push_returns_generated_key() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/friend_houses.json")
                .query_param("auth", "test-secret")
                .json_body(json!({"name": "Alice", "x": 100, "y": 200}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"name": "-NnewKey"}));
        });

        let friend = Friend::validated("Alice", 100, 200).unwrap();
        let id = client_for(&server).push(&friend).await.unwrap();
        assert_eq!(id, "-NnewKey");
        mock.assert();
    }

    #[tokio::test]
    async fn test_delete_targets_record_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/friend_houses/-Na1.json")
                .query_param("auth", "test-secret");
            then.status(200)
                .header("content-type", "application/json")
                .body("null");
        });

        client_for(&server).delete("-Na1").await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_ping_issues_shallow_read() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/friend_houses.json")
                .query_param("auth", "test-secret")
                .query_param("shallow", "true");
            then.status(200)
                .header("content-type", "application/json")
                .body("null");
        });

        client_for(&server).ping().await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_ping_surfaces_rejected_credentials() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/friend_houses.json");
            then.status(401)
                .header("content-type", "application/json")
                .json_body(json!({"error": "Permission denied"}));
        });

        let err = client_for(&server).ping().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_storage_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/friend_houses.json");
            then.status(500);
        });

        let err = client_for(&server).fetch_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[tokio::test]
    async fn test_auth_rejection_is_connection_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/friend_houses.json");
            then.status(401)
                .header("content-type", "application/json")
                .json_body(json!({"error": "Permission denied"}));
        });

        let err = client_for(&server).fetch_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let err = unreachable_client().fetch_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_error_messages_do_not_leak_the_secret() {
        let err = unreachable_client().fetch_all().await.unwrap_err();
        assert!(!err.to_string().contains("test-secret"));
    }
}
