// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::errors::{self, CredentialsError};
use crate::retriever::{RetrieverId, TokenRetriever};
use crate::token::AccessToken;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

/// Cached tokens stop being served this long before they expire.
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

static GLOBAL: LazyLock<TokenCache> = LazyLock::new(TokenCache::new);

/// Serves access tokens, fetching them through a retriever when needed.
#[async_trait::async_trait]
pub trait AccessTokenCache: std::fmt::Debug + Send + Sync {
    /// Returns a token for `scopes`, valid for at least the expiry margin of
    /// the cache.
    ///
    /// # Errors
    ///
    /// Returns the retriever error if a token cannot be fetched, or a
    /// [cancellation][CredentialsError::is_cancelled] error if `cancel` is
    /// triggered before a token is available.
    async fn get_access_token(
        &self,
        cancel: &CancellationToken,
        retriever: Arc<dyn TokenRetriever>,
        scopes: &[String],
    ) -> Result<String>;
}

// Scopes are sorted and deduplicated, the order requested does not matter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    retriever: RetrieverId,
    scopes: Vec<String>,
}

impl CacheKey {
    fn new(retriever: RetrieverId, scopes: &[String]) -> Self {
        let mut scopes = scopes.to_vec();
        scopes.sort();
        scopes.dedup();
        Self { retriever, scopes }
    }
}

// `None` until the fetch for the key completes.
type Published = Option<Result<AccessToken>>;

#[derive(Debug, Default)]
struct State {
    entries: HashMap<CacheKey, AccessToken>,
    in_flight: HashMap<CacheKey, watch::Receiver<Published>>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    margin: Duration,
}

/// A token cache shared by all the providers that use it.
///
/// Entries are keyed by retriever identity and scope set. At most one fetch
/// is in flight per key: concurrent callers for the same key wait for the
/// same result, including errors. Errors are never cached.
///
/// Fetches run in their own task. A caller that gives up, through its
/// [CancellationToken], does not abort the fetch, other waiters still get the
/// token and the cache still stores it.
///
/// `TokenCache` is a handle, clones share the same entries.
#[derive(Clone, Debug)]
pub struct TokenCache {
    inner: Arc<Inner>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The process-wide cache used by
    /// [AccessTokenProvider::new][crate::provider::AccessTokenProvider::new].
    pub fn global() -> TokenCache {
        GLOBAL.clone()
    }

    pub fn expiry_margin(&self) -> Duration {
        self.inner.margin
    }

    /// The number of cached tokens, including tokens no longer served.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops all cached tokens.
    ///
    /// Fetches in flight are not affected and store their results when they
    /// complete.
    pub async fn clear(&self) {
        self.inner.state.lock().await.entries.clear();
    }

    fn spawn_fetch(
        &self,
        key: CacheKey,
        retriever: Arc<dyn TokenRetriever>,
        tx: watch::Sender<Published>,
    ) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let scopes = key.scopes.clone();
            let margin = inner.margin;
            // A nested task turns any panic while fetching or validating the
            // token into an error, the in-flight marker is always cleared.
            let fetched = tokio::spawn(async move {
                let token = retriever.fetch_token(&scopes).await?;
                usable(token, margin)
            })
            .await;
            let result = match fetched {
                Ok(result) => result,
                Err(e) => Err(errors::retryable(e)),
            };
            if let Err(e) = &result {
                tracing::warn!(retriever = %key.retriever, error = %e, "cannot fetch access token");
            }

            {
                let mut state = inner.state.lock().await;
                state.in_flight.remove(&key);
                if let Ok(token) = &result {
                    state.entries.insert(key, token.clone());
                }
            }
            // Every waiter may have given up already.
            let _ = tx.send(Some(result));
        });
    }
}

#[async_trait::async_trait]
impl AccessTokenCache for TokenCache {
    async fn get_access_token(
        &self,
        cancel: &CancellationToken,
        retriever: Arc<dyn TokenRetriever>,
        scopes: &[String],
    ) -> Result<String> {
        let key = CacheKey::new(retriever.id(), scopes);
        let rx = {
            let mut state = self.inner.state.lock().await;
            if let Some(token) = state.entries.get(&key) {
                if token.is_valid_for(self.inner.margin) {
                    tracing::debug!(retriever = %key.retriever, scopes = ?key.scopes, "token cache hit");
                    return Ok(token.token.clone());
                }
            }
            match state.in_flight.get(&key) {
                Some(rx) => {
                    tracing::debug!(retriever = %key.retriever, scopes = ?key.scopes, "waiting for token fetch in flight");
                    rx.clone()
                }
                None => {
                    tracing::debug!(retriever = %key.retriever, scopes = ?key.scopes, "token cache miss");
                    let (tx, rx) = watch::channel(None);
                    state.in_flight.insert(key.clone(), rx.clone());
                    self.spawn_fetch(key, retriever, tx);
                    rx
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CredentialsError::cancelled()),
            result = wait(rx) => result.map(|token| token.token),
        }
    }
}

async fn wait(mut rx: watch::Receiver<Published>) -> Result<AccessToken> {
    let published = match rx.wait_for(Option::is_some).await {
        Ok(published) => published.clone(),
        Err(_) => None,
    };
    // The sender is dropped without a result only if the fetch task is gone.
    published.unwrap_or_else(|| {
        Err(CredentialsError::from_msg(
            true,
            "the token fetch ended without a result",
        ))
    })
}

fn usable(token: AccessToken, margin: Duration) -> Result<AccessToken> {
    if token.is_expired() {
        return Err(errors::non_retryable_from_str(
            "the identity provider returned an expired token",
        ));
    }
    if !token.is_valid_for(margin) {
        tracing::warn!(
            ?margin,
            "the identity provider returned a token that expires within the expiry margin"
        );
    }
    Ok(token)
}

/// A builder for [TokenCache].
///
/// # Example
/// ```
/// # use azure_token_provider::token_cache::TokenCache;
/// # use std::time::Duration;
/// let cache = TokenCache::builder()
///     .with_expiry_margin(Duration::from_secs(60))
///     .build();
/// assert_eq!(cache.expiry_margin(), Duration::from_secs(60));
/// ```
#[derive(Debug)]
pub struct Builder {
    margin: Duration,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            margin: DEFAULT_EXPIRY_MARGIN,
        }
    }
}

impl Builder {
    /// Sets how long before expiration a cached token is refreshed.
    ///
    /// Defaults to five minutes.
    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn build(self) -> TokenCache {
        TokenCache {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                margin: self.margin,
            }),
        }
    }
}
