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

//! Maps credentials to the retriever that fetches their tokens.

use crate::build_errors::Error as BuildError;
use crate::clouds;
use crate::credentials::{
    ClientSecretCredentials, Credentials, ManagedIdentityCredentials, non_empty,
};
use crate::retriever::{ClientSecretRetriever, ManagedIdentityRetriever, Retriever};
use crate::settings::AzureSettings;

/// Creates the retriever for `credentials`.
///
/// Resolution does not perform any network calls. Each call returns a new
/// retriever with its own identity, so tokens are never shared between
/// providers created from separate calls.
///
/// # Errors
///
/// Returns an error if managed identity credentials are used while managed
/// identities are disabled in `settings`, or if client secret credentials
/// refer to an unknown cloud.
pub fn resolve(
    settings: &AzureSettings,
    credentials: &Credentials,
) -> Result<Retriever, BuildError> {
    let retriever = match credentials {
        Credentials::ManagedIdentity(c) => {
            Retriever::ManagedIdentity(managed_identity(settings, c)?)
        }
        Credentials::ClientSecret(c) => Retriever::ClientSecret(client_secret(settings, c)?),
    };
    tracing::debug!(
        auth_type = credentials.auth_type(),
        id = %crate::retriever::TokenRetriever::id(&retriever),
        "resolved credentials"
    );
    Ok(retriever)
}

fn managed_identity(
    settings: &AzureSettings,
    credentials: &ManagedIdentityCredentials,
) -> Result<ManagedIdentityRetriever, BuildError> {
    if !settings.managed_identity_enabled() {
        return Err(BuildError::not_enabled("managed identity"));
    }
    let client_id = non_empty(credentials.client_id.clone())
        .or_else(|| settings.managed_identity_client_id().map(str::to_string));
    Ok(ManagedIdentityRetriever::builder()
        .maybe_client_id(client_id)
        .build())
}

fn client_secret(
    settings: &AzureSettings,
    credentials: &ClientSecretCredentials,
) -> Result<ClientSecretRetriever, BuildError> {
    let authority_host = match non_empty(credentials.authority.clone()) {
        Some(authority) => authority,
        None => {
            let cloud = non_empty(credentials.cloud.clone())
                .unwrap_or_else(|| settings.default_cloud().to_string());
            clouds::authority_host(&cloud)
                .ok_or_else(|| BuildError::unsupported_cloud(cloud.as_str()))?
                .to_string()
        }
    };
    Ok(ClientSecretRetriever::new(
        credentials.tenant_id.clone(),
        credentials.client_id.clone(),
        credentials.client_secret.clone(),
        authority_host,
    ))
}
