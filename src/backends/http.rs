//! Terraform `http` backend: state behind a REST endpoint with optional
//! lock and unlock endpoints.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use url::Url;

use super::lock::LockInfo;
use super::{BackendError, BackendResult, StateBackend};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const LOCK_OPERATION: &str = "OperationTypeRead";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: String,
    pub lock_address: String,
    pub lock_method: String,
    pub unlock_address: String,
    pub unlock_method: String,
    pub username: String,
    pub password: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            lock_address: String::new(),
            lock_method: "LOCK".to_string(),
            unlock_address: String::new(),
            unlock_method: "UNLOCK".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("address", &self.address)
            .field("lock_address", &self.lock_address)
            .field("lock_method", &self.lock_method)
            .field("unlock_address", &self.unlock_address)
            .field("unlock_method", &self.unlock_method)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct Endpoint {
    method: Method,
    url: Url,
}

#[derive(Debug)]
struct LockEndpoints {
    lock: Endpoint,
    unlock: Endpoint,
}

pub struct HttpBackend {
    client: reqwest::Client,
    address: Url,
    locking: Option<LockEndpoints>,
    credentials: Option<(String, String)>,
}

impl HttpBackend {
    pub fn new(config: HttpConfig) -> BackendResult<Self> {
        if config.address.is_empty() {
            return Err(BackendError::configuration(
                "http backend requires an address",
            ));
        }
        let address = parse_url("address", &config.address)?;

        let locking = if config.lock_address.is_empty() {
            None
        } else {
            let unlock_address = if config.unlock_address.is_empty() {
                &config.lock_address
            } else {
                &config.unlock_address
            };
            Some(LockEndpoints {
                lock: Endpoint {
                    method: parse_method("lock_method", &config.lock_method)?,
                    url: parse_url("lock_address", &config.lock_address)?,
                },
                unlock: Endpoint {
                    method: parse_method("unlock_method", &config.unlock_method)?,
                    url: parse_url("unlock_address", unlock_address)?,
                },
            })
        };

        let credentials = if config.username.is_empty() && config.password.is_empty() {
            None
        } else {
            Some((config.username, config.password))
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| BackendError::Request {
                operation: "client setup",
                source,
            })?;

        Ok(Self {
            client,
            address,
            locking,
            credentials,
        })
    }

    pub fn is_locking(&self) -> bool {
        self.locking.is_some()
    }

    fn request(&self, method: Method, url: &Url) -> reqwest::RequestBuilder {
        let request = self.client.request(method, url.clone());
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    async fn lock(&self, endpoint: &Endpoint, info: &LockInfo) -> BackendResult<()> {
        tracing::debug!(url = %endpoint.url, method = %endpoint.method, lock_id = %info.id, "acquiring state lock");

        let response = self
            .request(endpoint.method.clone(), &endpoint.url)
            .json(info)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                operation: "lock",
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT | StatusCode::LOCKED => {
                let holder = response.json::<LockInfo>().await.ok().map(|held| held.who);
                Err(BackendError::Locked { holder })
            }
            status => Err(BackendError::Status {
                operation: "lock",
                url: endpoint.url.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn unlock(&self, endpoint: &Endpoint, info: &LockInfo) -> BackendResult<()> {
        tracing::debug!(url = %endpoint.url, method = %endpoint.method, lock_id = %info.id, "releasing state lock");

        let response = self
            .request(endpoint.method.clone(), &endpoint.url)
            .json(info)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                operation: "unlock",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                operation: "unlock",
                url: endpoint.url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn get(&self) -> BackendResult<Vec<u8>> {
        tracing::debug!(url = %self.address, "fetching remote state");

        let response = self
            .request(Method::GET, &self.address)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                operation: "get",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                operation: "get",
                url: self.address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| BackendError::Request {
                operation: "get",
                source,
            })?;
        Ok(body.to_vec())
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("address", &self.address.as_str())
            .field("locking", &self.locking)
            .field(
                "username",
                &self.credentials.as_ref().map(|(username, _)| username),
            )
            .finish()
    }
}

#[async_trait]
impl StateBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> BackendResult<Vec<u8>> {
        let Some(endpoints) = &self.locking else {
            return self.get().await;
        };

        let info = LockInfo::new(LOCK_OPERATION, self.address.as_str());
        with_lock(
            self.lock(&endpoints.lock, &info),
            || self.get(),
            self.unlock(&endpoints.unlock, &info),
        )
        .await
    }
}

/// Run `body` under a lock. `release` runs once `acquire` has been attempted,
/// whether `acquire` or `body` failed.
///
/// The first failure wins. A release failure after a successful body is
/// returned as [`BackendError::Unlock`]; a release failure after an earlier
/// error is only logged.
pub async fn with_lock<T, A, F, Fut, R>(acquire: A, body: F, release: R) -> BackendResult<T>
where
    A: Future<Output = BackendResult<()>>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = BackendResult<T>>,
    R: Future<Output = BackendResult<()>>,
{
    let result = match acquire.await {
        Ok(()) => body().await,
        Err(e) => Err(e),
    };

    match (result, release.await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(unlock_err)) => Err(BackendError::Unlock(Box::new(unlock_err))),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(unlock_err)) => {
            tracing::warn!(error = %unlock_err, "failed to release state lock");
            Err(e)
        }
    }
}

fn parse_url(key: &str, value: &str) -> BackendResult<Url> {
    Url::parse(value)
        .map_err(|e| BackendError::configuration(format!("invalid {} {:?}: {}", key, value, e)))
}

fn parse_method(key: &str, value: &str) -> BackendResult<Method> {
    Method::from_bytes(value.as_bytes())
        .map_err(|_| BackendError::configuration(format!("invalid {} {:?}", key, value)))
}
