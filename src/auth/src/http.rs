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
use crate::errors::{self, CredentialsError, is_retryable};
use crate::token::AccessToken;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Sends a token request and converts the response into an [AccessToken].
///
/// Transport errors and some HTTP status codes are reported as retryable, the
/// caller decides whether to retry.
pub(crate) async fn fetch_token(request: reqwest::RequestBuilder) -> Result<AccessToken> {
    let response = request.send().await.map_err(errors::retryable)?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .map_err(|e| CredentialsError::new(is_retryable(status), e))?;
        tracing::warn!(%status, "token request failed");
        return Err(CredentialsError::from_msg(
            is_retryable(status),
            format!("failed to fetch token, status {status}: {body}"),
        ));
    }
    let response = response.json::<TokenResponse>().await.map_err(|e| {
        let retryable = !e.is_decode();
        CredentialsError::new(retryable, e)
    })?;
    response.into_token()
}

/// The token response from both Microsoft Entra ID and the Azure Instance
/// Metadata Service.
///
/// IMDS sends the expiration fields as strings, Entra ID as numbers.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default, deserialize_with = "seconds")]
    expires_in: Option<u64>,
    #[serde(default, deserialize_with = "seconds")]
    expires_on: Option<u64>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(u64),
    Text(String),
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(n)) => Ok(Some(n)),
        Some(Seconds::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Result<AccessToken> {
        let now = Instant::now();
        let lifetime = match (self.expires_in, self.expires_on) {
            (Some(expires_in), _) => Duration::from_secs(expires_in),
            (None, Some(expires_on)) => {
                let now_unix = u64::try_from(time::OffsetDateTime::now_utc().unix_timestamp())
                    .unwrap_or_default();
                Duration::from_secs(expires_on.saturating_sub(now_unix))
            }
            (None, None) => {
                return Err(errors::non_retryable_from_str(
                    "the token response does not include an expiration",
                ));
            }
        };
        let expires_at = now.checked_add(lifetime).ok_or_else(|| {
            errors::non_retryable_from_str(format!(
                "the token expiration is out of range, lifetime {lifetime:?}"
            ))
        })?;
        Ok(AccessToken {
            token: self.access_token,
            token_type: self.token_type,
            expires_at,
        })
    }
}
