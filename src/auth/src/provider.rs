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

//! The entry point for applications.
//!
//! An [AccessTokenProvider] resolves its credentials once, when it is
//! created, and then serves tokens through a shared cache.

use crate::Result;
use crate::build_errors::Error as BuildError;
use crate::credentials::Credentials;
use crate::resolver;
use crate::retriever::Retriever;
use crate::settings::AzureSettings;
use crate::token_cache::{AccessTokenCache, TokenCache};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Provides access tokens for one credential configuration.
///
/// Providers are cheap to clone, clones share the retriever and the cache.
#[derive(Clone, Debug)]
pub struct AccessTokenProvider {
    retriever: Arc<Retriever>,
    cache: Arc<dyn AccessTokenCache>,
}

impl AccessTokenProvider {
    /// Creates a provider that uses the [global][TokenCache::global] token
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials cannot be used with `settings`,
    /// see [resolve][crate::resolver::resolve].
    pub fn new(
        settings: &AzureSettings,
        credentials: &Credentials,
    ) -> std::result::Result<Self, BuildError> {
        Self::builder(settings, credentials).build()
    }

    pub fn builder(settings: &AzureSettings, credentials: &Credentials) -> Builder {
        Builder {
            settings: settings.clone(),
            credentials: credentials.clone(),
            cache: None,
        }
    }

    /// Returns a token valid for `scopes`.
    ///
    /// The token comes from the cache when possible. Otherwise this waits for
    /// a fetch from the identity provider, until `cancel` is triggered.
    ///
    /// # Example
    /// ```no_run
    /// # use azure_token_provider::provider::AccessTokenProvider;
    /// # use tokio_util::sync::CancellationToken;
    /// async fn sample(provider: &AccessTokenProvider) -> anyhow::Result<()> {
    ///     let cancel = CancellationToken::new();
    ///     let token = provider
    ///         .get_access_token(&cancel, ["https://vault.azure.net/.default"])
    ///         .await?;
    ///     println!("Authorization: Bearer {token}");
    ///     Ok(())
    /// }
    /// ```
    pub async fn get_access_token<I, S>(
        &self,
        cancel: &CancellationToken,
        scopes: I,
    ) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes = scopes.into_iter().map(Into::into).collect::<Vec<String>>();
        self.cache
            .get_access_token(cancel, self.retriever.clone(), &scopes)
            .await
    }

    /// The retriever resolved from the credentials.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}

/// A builder for [AccessTokenProvider].
///
/// # Example
/// ```
/// # use azure_token_provider::credentials::{Credentials, ManagedIdentityCredentials};
/// # use azure_token_provider::provider::AccessTokenProvider;
/// # use azure_token_provider::settings::AzureSettings;
/// # use azure_token_provider::token_cache::TokenCache;
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// let settings = AzureSettings::builder().with_managed_identity_enabled(true).build();
/// let credentials = Credentials::ManagedIdentity(ManagedIdentityCredentials::default());
/// let cache = TokenCache::builder()
///     .with_expiry_margin(Duration::from_secs(120))
///     .build();
/// let provider = AccessTokenProvider::builder(&settings, &credentials)
///     .with_token_cache(Arc::new(cache))
///     .build()?;
/// # Ok::<(), azure_token_provider::build_errors::Error>(())
/// ```
#[derive(Debug)]
pub struct Builder {
    settings: AzureSettings,
    credentials: Credentials,
    cache: Option<Arc<dyn AccessTokenCache>>,
}

impl Builder {
    /// Sets the token cache.
    ///
    /// If not set, the provider uses [TokenCache::global].
    pub fn with_token_cache(mut self, cache: Arc<dyn AccessTokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolves the credentials and returns the provider.
    pub fn build(self) -> std::result::Result<AccessTokenProvider, BuildError> {
        let retriever = resolver::resolve(&self.settings, &self.credentials)?;
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(TokenCache::global()));
        Ok(AccessTokenProvider {
            retriever: Arc::new(retriever),
            cache,
        })
    }
}
