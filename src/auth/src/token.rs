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

use std::time::Duration;
use tokio::time::Instant;

/// Represents an access token and its expiration.
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    /// The actual token string.
    ///
    /// This is the value used in `Authorization:` header.
    pub token: String,

    /// The type of the token, almost always `"Bearer"`.
    pub token_type: String,

    /// The instant at which the token expires.
    ///
    /// Note that the `Instant` is not valid across processes. Tokens are not
    /// persisted; each process acquires its own.
    pub expires_at: Instant,
}

impl AccessToken {
    /// Returns `true` if the token is still usable `margin` from now.
    pub(crate) fn is_valid_for(&self, margin: Duration) -> bool {
        Instant::now()
            .checked_add(margin)
            .is_some_and(|deadline| self.expires_at > deadline)
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.expires_at <= Instant::now()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug() {
        let expires_at = Instant::now() + Duration::from_secs(3600);
        let token = AccessToken {
            token: "token-test-only".into(),
            token_type: "token-type-test-only".into(),
            expires_at,
        };
        let got = format!("{token:?}");
        assert!(!got.contains("token-test-only"), "{got}");
        assert!(got.contains("token: \"[censored]\""), "{got}");
        assert!(got.contains("token_type: \"token-type-test-only"), "{got}");
        assert!(got.contains(&format!("expires_at: {expires_at:?}")), "{got}");
    }

    #[tokio::test(start_paused = true)]
    async fn validity() {
        let token = AccessToken {
            token: "test-token".into(),
            token_type: "Bearer".into(),
            expires_at: Instant::now() + Duration::from_secs(600),
        };
        assert!(token.is_valid_for(Duration::from_secs(300)));
        assert!(!token.is_expired());

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(!token.is_valid_for(Duration::from_secs(300)));
        assert!(!token.is_expired());

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(token.is_expired());
    }

    #[test]
    fn margin_out_of_range() {
        let token = AccessToken {
            token: "test-token".into(),
            token_type: "Bearer".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(!token.is_valid_for(Duration::from_secs(u64::MAX / 2)));
        assert!(!token.is_valid_for(Duration::MAX));
    }
}
