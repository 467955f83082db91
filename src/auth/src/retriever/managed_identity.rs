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

//! [Managed identity] token retriever.
//!
//! Azure resources such as virtual machines, App Service, or AKS pods can be
//! assigned a managed identity. The [Instance Metadata Service] (IMDS) is a
//! local endpoint that issues access tokens for that identity, no secrets
//! are held by the application.
//!
//! [Managed identity]: https://learn.microsoft.com/entra/identity/managed-identities-azure-resources/overview
//! [Instance Metadata Service]: https://learn.microsoft.com/azure/virtual-machines/instance-metadata-service

use super::{RetrieverId, TokenRetriever};
use crate::Result;
use crate::errors;
use crate::token::AccessToken;
use url::Url;

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const METADATA_HEADER: &str = "Metadata";
const DEFAULT_SUFFIX: &str = "/.default";

/// Fetches tokens for a managed identity from the Instance Metadata Service.
#[derive(Clone, Debug)]
pub struct ManagedIdentityRetriever {
    id: RetrieverId,
    client_id: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl ManagedIdentityRetriever {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The client id of the user-assigned identity, `None` for the
    /// system-assigned identity.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, resource: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(errors::non_retryable)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-version", IMDS_API_VERSION);
            query.append_pair("resource", resource);
            if let Some(client_id) = &self.client_id {
                query.append_pair("client_id", client_id);
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl TokenRetriever for ManagedIdentityRetriever {
    fn id(&self) -> RetrieverId {
        self.id
    }

    #[tracing::instrument(skip_all, fields(id = %self.id, client_id = ?self.client_id))]
    async fn fetch_token(&self, scopes: &[String]) -> Result<AccessToken> {
        // IMDS issues tokens for a single resource.
        let [scope] = scopes else {
            return Err(errors::non_retryable_from_str(format!(
                "managed identity tokens require exactly one scope, got {}",
                scopes.len()
            )));
        };
        let resource = scope.strip_suffix(DEFAULT_SUFFIX).unwrap_or(scope);
        let url = self.request_url(resource)?;
        tracing::debug!(%resource, "requesting managed identity token");

        let request = self.client.get(url).header(METADATA_HEADER, "true");
        crate::http::fetch_token(request).await
    }
}

/// A builder for [ManagedIdentityRetriever].
///
/// The [resolver][crate::resolver] creates retrievers from credentials, use
/// this builder when the metadata endpoint must be overridden.
#[derive(Debug, Default)]
pub struct Builder {
    client_id: Option<String>,
    endpoint: Option<String>,
}

impl Builder {
    /// Selects a user-assigned identity.
    pub fn with_client_id<S: Into<String>>(mut self, client_id: S) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the token endpoint.
    ///
    /// If not set, the retriever uses
    /// `http://169.254.169.254/metadata/identity/oauth2/token`.
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub(crate) fn maybe_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn build(self) -> ManagedIdentityRetriever {
        ManagedIdentityRetriever {
            id: RetrieverId::unique(),
            client_id: self.client_id,
            endpoint: self.endpoint.unwrap_or_else(|| IMDS_ENDPOINT.to_string()),
            client: reqwest::Client::new(),
        }
    }
}
