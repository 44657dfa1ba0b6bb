pub mod models;

use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use self::models::{ErrorEnvelope, LookupRequest, LookupResponse};

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider answered and has no such identity.
    #[error("identity {0:?} does not exist")]
    NotFound(String),
    /// The provider could not answer: transport, quota, or internal error.
    #[error("identity lookup failed: {0:#}")]
    LookupFailure(anyhow::Error),
}

/// Existence check against the identity provider. Results are never cached;
/// every call performs a fresh lookup.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, uid: &str) -> Result<(), IdentityError>;
}

// ---------------------------------------------------------------------------
// HttpIdentityClient
// ---------------------------------------------------------------------------

/// Identity Toolkit style account lookup over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    lookup_url: String,
    access_token: String,
}

impl HttpIdentityClient {
    pub fn new(
        base_url: &str,
        project_id: &str,
        access_token: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build identity HTTP client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                lookup_url: format!(
                    "{}/v1/projects/{}/accounts:lookup",
                    base_url.trim_end_matches('/'),
                    project_id
                ),
                access_token: access_token.to_owned(),
            }),
        })
    }

    async fn lookup(&self, uid: &str) -> anyhow::Result<Option<LookupResponse>> {
        debug!(uid = %uid, url = %self.inner.lookup_url, "Looking up identity");

        let resp = self
            .inner
            .http
            .post(&self.inner.lookup_url)
            .bearer_auth(&self.inner.access_token)
            .json(&LookupRequest { local_id: [uid] })
            .send()
            .await
            .context("identity lookup request failed")?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .context("failed to read identity lookup response body")?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let envelope = serde_json::from_slice::<ErrorEnvelope>(&bytes).ok();
            return match envelope {
                Some(env) if env.error.is_user_not_found() => Ok(None),
                Some(env) => Err(anyhow!(
                    "identity provider returned {status}: code={}, msg={}",
                    env.error.code,
                    env.error.message
                )),
                None => Err(anyhow!("identity provider returned {status}")),
            };
        }

        let body = serde_json::from_slice::<LookupResponse>(&bytes)
            .context("failed to deserialize identity lookup response")?;
        Ok(Some(body))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn verify(&self, uid: &str) -> Result<(), IdentityError> {
        match self.lookup(uid).await {
            Ok(Some(body)) if body.contains(uid) => Ok(()),
            Ok(_) => Err(IdentityError::NotFound(uid.to_owned())),
            Err(e) => Err(IdentityError::LookupFailure(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// StaticIdentityProvider
// ---------------------------------------------------------------------------

/// Fixed allow-list of UIDs, for local development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    uids: Arc<HashSet<String>>,
}

impl StaticIdentityProvider {
    pub fn new<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uids: Arc::new(uids.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, uid: &str) -> Result<(), IdentityError> {
        if self.uids.contains(uid) {
            Ok(())
        } else {
            Err(IdentityError::NotFound(uid.to_owned()))
        }
    }
}
