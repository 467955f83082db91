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
use crate::token::AccessToken;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod client_secret;
pub mod managed_identity;

pub use client_secret::ClientSecretRetriever;
pub use managed_identity::ManagedIdentityRetriever;

/// Identifies one retriever instance.
///
/// The token cache keys its entries by retriever identity, not by the
/// credentials the retriever was created from. Clones of a retriever share
/// its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RetrieverId(u64);

impl RetrieverId {
    /// Returns an id not used by any other retriever in this process.
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RetrieverId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RetrieverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "retriever-{}", self.0)
    }
}

/// Fetches new access tokens for one resolved credential.
///
/// Implementations talk to the identity provider on every call. They do not
/// cache and do not retry, the [TokenCache][crate::token_cache::TokenCache]
/// and the application own those policies.
#[async_trait::async_trait]
pub trait TokenRetriever: std::fmt::Debug + Send + Sync {
    /// The identity of this retriever.
    fn id(&self) -> RetrieverId;

    /// Fetches a fresh token valid for `scopes`.
    async fn fetch_token(&self, scopes: &[String]) -> Result<AccessToken>;
}

/// The retrievers for all supported credential types.
#[derive(Clone, Debug)]
pub enum Retriever {
    ManagedIdentity(ManagedIdentityRetriever),
    ClientSecret(ClientSecretRetriever),
}

#[async_trait::async_trait]
impl TokenRetriever for Retriever {
    fn id(&self) -> RetrieverId {
        match self {
            Retriever::ManagedIdentity(r) => r.id(),
            Retriever::ClientSecret(r) => r.id(),
        }
    }

    async fn fetch_token(&self, scopes: &[String]) -> Result<AccessToken> {
        match self {
            Retriever::ManagedIdentity(r) => r.fetch_token(scopes).await,
            Retriever::ClientSecret(r) => r.fetch_token(scopes).await,
        }
    }
}
