//! Firebase Realtime Database backend over the REST API.
//!
//! Every node is addressable as `{database_url}/{path}.json`:
//!
//! ```text
//! GET   /users/{id}.json          → record object, or `null`
//! PATCH /users/{id}.json          → merge the given children
//! PUT   /system_status.json       → overwrite (connectivity check)
//! ```
//!
//! When an auth token is configured it is passed as the `auth` query
//! parameter (database secret or OAuth access token).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Response, Url};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{FallbackStore, SYSTEM_STATUS_NODE, USERS_NODE};
use crate::error::{StoreError, StoreResult};
use crate::record::UserFallbackRecord;

/// Connection settings for [`FirebaseStore`].
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// e.g. `https://my-project-default-rtdb.asia-southeast1.firebasedatabase.app`
    pub database_url: String,
    pub auth_token: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl FirebaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Realtime Database REST client. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    base: Url,
    auth_token: Option<String>,
}

impl FirebaseStore {
    pub fn new(config: FirebaseConfig) -> StoreResult<Self> {
        let base = Url::parse(config.database_url.trim_end_matches('/'))
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {e}", config.database_url)))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(StoreError::InvalidUrl(config.database_url));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base,
            auth_token: config.auth_token.filter(|t| !t.is_empty()),
        })
    }

    /// Base database URL.
    pub fn database_url(&self) -> &Url {
        &self.base
    }

    /// REST URL for a node. Segments are percent-encoded; the last one gets
    /// the `.json` suffix.
    fn node_url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty();
            if let Some((last, parents)) = segments.split_last() {
                path.extend(parents);
                path.push(&format!("{last}.json"));
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    async fn read_node(&self, segments: &[&str]) -> StoreResult<Value> {
        let key = segments.join("/");
        let url = self.node_url(segments)?;
        debug!(%key, "Firebase GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Read {
                key: key.clone(),
                message: e.to_string(),
            })?;
        let response = check_status(response).await?;
        response.json::<Value>().await.map_err(|e| StoreError::Read {
            key,
            message: e.to_string(),
        })
    }
}

async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl FallbackStore for FirebaseStore {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn get(&self, user_id: &str) -> StoreResult<Option<UserFallbackRecord>> {
        let value = self.read_node(&[USERS_NODE, user_id]).await?;
        UserFallbackRecord::from_value(value).map_err(|source| StoreError::Decode {
            key: format!("{USERS_NODE}/{user_id}"),
            source,
        })
    }

    async fn update(&self, user_id: &str, fields: Map<String, Value>) -> StoreResult<()> {
        let key = format!("{USERS_NODE}/{user_id}");
        let url = self.node_url(&[USERS_NODE, user_id])?;
        debug!(%key, fields = fields.len(), "Firebase PATCH");

        let response = self
            .client
            .patch(url)
            .json(&fields)
            .send()
            .await
            .map_err(|e| StoreError::Write {
                key,
                message: e.to_string(),
            })?;
        check_status(response).await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let status = json!({
            "last_connection": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "status": "online",
        });
        let url = self.node_url(&[SYSTEM_STATUS_NODE])?;
        let response = self.client.put(url).json(&status).send().await?;
        check_status(response).await?;

        self.read_node(&[SYSTEM_STATUS_NODE]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> FirebaseStore {
        FirebaseStore::new(FirebaseConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = FirebaseStore::new(FirebaseConfig::new("mailto:db@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl(_)));
        let err = FirebaseStore::new(FirebaseConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl(_)));
    }

    #[test]
    fn test_node_url_encodes_segments_and_token() {
        let store = FirebaseStore::new(
            FirebaseConfig::new("https://demo.firebaseio.com/").with_auth_token("s3cret"),
        )
        .unwrap();
        let url = store.node_url(&[USERS_NODE, "a b"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://demo.firebaseio.com/users/a%20b.json?auth=s3cret"
        );
    }

    #[tokio::test]
    async fn test_get_null_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/U1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
            .mount(&server)
            .await;

        assert!(store_for(&server).get("U1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_decodes_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/U1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "lastFallbackTime": 1_700_000_000_000_i64,
                "lastUpdated": "2023-11-15T05:13:20.000+07:00",
                "userId": "U1"
            })))
            .mount(&server)
            .await;

        let record = store_for(&server).get("U1").await.unwrap().unwrap();
        assert_eq!(record.last_fallback_time, 1_700_000_000_000);
        assert_eq!(record.user_id.as_deref(), Some("U1"));
    }

    #[tokio::test]
    async fn test_update_sends_patch_with_fields() {
        let server = MockServer::start().await;
        let fields = json!({"lastFallbackTime": 42, "userId": "U1"});
        Mock::given(method("PATCH"))
            .and(path("/users/U1.json"))
            .and(query_param("auth", "tok"))
            .and(body_json(fields.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(fields.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let store =
            FirebaseStore::new(FirebaseConfig::new(server.uri()).with_auth_token("tok")).unwrap();
        let Value::Object(map) = fields else {
            unreachable!()
        };
        store.update("U1", map).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})),
            )
            .mount(&server)
            .await;

        let err = store_for(&server).update("U1", Map::new()).await.unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Permission denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_health_check_writes_then_reads_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/system_status.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "online"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/system_status.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "online"})))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_read_error() {
        // Reserve a free port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let store = FirebaseStore::new(
            FirebaseConfig::new(uri).with_timeout(Duration::from_millis(500)),
        )
        .unwrap();
        let err = store.get("U1").await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }), "got {err:?}");
    }
}
