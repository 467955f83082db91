// Copyright 2024 Google LLC
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

//! Azure access tokens for client libraries.
//!
//! This crate turns an Azure credential description (a [managed identity] or a
//! [client secret]) into short-lived bearer tokens. Applications create one
//! [AccessTokenProvider][provider::AccessTokenProvider] per credential
//! configuration and call
//! [get_access_token][provider::AccessTokenProvider::get_access_token] as
//! often as they need: tokens are served from a shared
//! [TokenCache][token_cache::TokenCache] and refreshed shortly before they
//! expire, with at most one request to the identity provider in flight per
//! credential and scope set.
//!
//! ```no_run
//! # use azure_token_provider::credentials::{Credentials, ManagedIdentityCredentials};
//! # use azure_token_provider::provider::AccessTokenProvider;
//! # use azure_token_provider::settings::AzureSettings;
//! # use tokio_util::sync::CancellationToken;
//! # tokio_test::block_on(async {
//! let settings = AzureSettings::builder().with_managed_identity_enabled(true).build();
//! let credentials = Credentials::ManagedIdentity(ManagedIdentityCredentials::default());
//! let provider = AccessTokenProvider::new(&settings, &credentials)?;
//! let token = provider
//!     .get_access_token(&CancellationToken::new(), ["https://management.azure.com/.default"])
//!     .await?;
//! println!("Token: {token}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! [managed identity]: https://learn.microsoft.com/entra/identity/managed-identities-azure-resources/overview
//! [client secret]: https://learn.microsoft.com/entra/identity-platform/v2-oauth2-client-creds-grant-flow

pub mod build_errors;
pub mod errors;

/// Static table of Azure clouds and their authority hosts.
pub mod clouds;

/// Descriptions of the supported Azure credentials.
pub mod credentials;

/// Process settings that influence how credentials are resolved.
pub mod settings;

/// Types and functions to work with auth tokens.
pub mod token;

/// Token retrievers, one per supported credential type.
pub mod retriever;

pub mod resolver;

/// The shared token cache.
pub mod token_cache;

pub mod provider;

pub(crate) mod http;

/// A `Result` alias where the `Err` case is
/// `azure_token_provider::errors::CredentialsError`.
pub type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;
