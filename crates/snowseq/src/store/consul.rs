use core::time::Duration;

use reqwest::{Client, StatusCode, Url, header::HeaderMap};

use crate::{
    error::StoreError,
    store::{CoordinationStore, KvPair},
};

/// Header carrying the Raft index of the returned data.
const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";

/// Header carrying the ACL token.
const CONSUL_TOKEN_HEADER: &str = "X-Consul-Token";

/// A [`CoordinationStore`] backed by the Consul KV HTTP API.
///
/// - `get` reads `GET /v1/kv/<key>?raw`; the version is the key's
///   `ModifyIndex`, returned in the `X-Consul-Index` header.
/// - `put` writes `PUT /v1/kv/<key>`.
/// - `cas` writes `PUT /v1/kv/<key>?cas=<version>`; Consul answers `true` or
///   `false`.
#[derive(Clone, Debug)]
pub struct ConsulStore {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ConsulStore {
    /// Connects to a Consul agent at `address`, e.g. `127.0.0.1:8500` or
    /// `https://consul.internal:8501`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the address is not a valid URL
    /// or the HTTP client cannot be built.
    pub fn new(address: &str) -> Result<Self, StoreError> {
        let address = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let base = Url::parse(&address)
            .and_then(|url| url.join("/v1/kv/"))
            .map_err(|e| StoreError::Unavailable {
                reason: format!("invalid consul address {address:?}: {e}"),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Unavailable {
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            client,
            base,
            token: None,
        })
    }

    /// Sends `token` as the ACL token on every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Protocol {
                key: key.to_string(),
                reason: "consul address cannot be a base url".to_string(),
            })?
            .pop_if_empty()
            .extend(key.split('/'));
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.header(CONSUL_TOKEN_HEADER, token),
            None => req,
        }
    }

    async fn write(&self, key: &str, value: &str, cas: Option<u64>) -> Result<bool, StoreError> {
        let mut url = self.url(key)?;
        if let Some(version) = cas {
            url.query_pairs_mut()
                .append_pair("cas", &version.to_string());
        }

        let resp = self
            .request(reqwest::Method::PUT, url)
            .body(value.to_string())
            .send()
            .await
            .map_err(unavailable)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(unavailable)?;
        match body.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(StoreError::Protocol {
                key: key.to_string(),
                reason: format!("unexpected write response {other:?}"),
            }),
        }
    }
}

impl CoordinationStore for ConsulStore {
    async fn get(&self, key: &str) -> Result<Option<KvPair>, StoreError> {
        let mut url = self.url(key)?;
        url.query_pairs_mut().append_key_only("raw");

        let resp = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(unavailable)?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let version = modify_index(key, resp.headers())?;
                let value = resp.text().await.map_err(unavailable)?;
                Ok(Some(KvPair {
                    key: key.to_string(),
                    value,
                    version,
                }))
            }
            status => Err(StoreError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.write(key, value, None).await? {
            Ok(())
        } else {
            Err(StoreError::Protocol {
                key: key.to_string(),
                reason: "consul rejected an unconditional write".to_string(),
            })
        }
    }

    async fn cas(&self, key: &str, value: &str, version: u64) -> Result<bool, StoreError> {
        self.write(key, value, Some(version)).await
    }
}

fn modify_index(key: &str, headers: &HeaderMap) -> Result<u64, StoreError> {
    headers
        .get(CONSUL_INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| StoreError::Protocol {
            key: key.to_string(),
            reason: format!("missing or invalid {CONSUL_INDEX_HEADER} header"),
        })
}

fn unavailable(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable {
        reason: err.to_string(),
    }
}
