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

//! Client secret token retriever.
//!
//! An application registered in Microsoft Entra ID authenticates with its
//! client id and one of its client secrets, using the [client credentials]
//! grant against the token endpoint of its tenant.
//!
//! [client credentials]: https://learn.microsoft.com/entra/identity-platform/v2-oauth2-client-creds-grant-flow

use super::{RetrieverId, TokenRetriever};
use crate::Result;
use crate::errors;
use crate::token::AccessToken;

const CLIENT_CREDENTIALS_GRANT_TYPE: &str = "client_credentials";

/// Fetches tokens for an application registration using a client secret.
#[derive(Clone)]
pub struct ClientSecretRetriever {
    id: RetrieverId,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for ClientSecretRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretRetriever")
            .field("id", &self.id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

impl ClientSecretRetriever {
    pub(crate) fn new(
        tenant_id: String,
        client_id: String,
        client_secret: String,
        authority_host: String,
    ) -> Self {
        Self {
            id: RetrieverId::unique(),
            tenant_id,
            client_id,
            client_secret,
            authority_host,
            client: reqwest::Client::new(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The authority host tokens are requested from, for example
    /// `https://login.microsoftonline.com/`.
    pub fn authority_host(&self) -> &str {
        &self.authority_host
    }

    /// The token endpoint of the tenant.
    pub fn token_url(&self) -> String {
        let separator = if self.authority_host.ends_with('/') {
            ""
        } else {
            "/"
        };
        format!(
            "{}{separator}{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }
}

#[async_trait::async_trait]
impl TokenRetriever for ClientSecretRetriever {
    fn id(&self) -> RetrieverId {
        self.id
    }

    #[tracing::instrument(skip_all, fields(id = %self.id, tenant_id = %self.tenant_id, client_id = %self.client_id))]
    async fn fetch_token(&self, scopes: &[String]) -> Result<AccessToken> {
        if scopes.is_empty() {
            return Err(errors::non_retryable_from_str(
                "client secret tokens require at least one scope",
            ));
        }
        let scope = scopes.join(" ");
        let token_url = self.token_url();
        tracing::debug!(%token_url, %scope, "requesting client secret token");

        let params = [
            ("grant_type", CLIENT_CREDENTIALS_GRANT_TYPE),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];
        let request = self.client.post(token_url).form(&params);
        crate::http::fetch_token(request).await
    }
}
