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

use azure_token_provider::credentials::{ClientSecretCredentials, Credentials};
use azure_token_provider::provider::AccessTokenProvider;
use azure_token_provider::retriever::Retriever;
use azure_token_provider::settings::AzureSettings;
use azure_token_provider::token_cache::{AccessTokenCache, TokenCache};
use httptest::matchers::{all_of, contains, request, url_decoded};
use httptest::responders::{json_encoded, status_code};
use httptest::{Expectation, Server};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type TestResult = anyhow::Result<()>;

const TENANT_ID: &str = "test-tenant-id";
const SCOPE: &str = "https://management.azure.com/.default";

fn client_secret(authority: String) -> Credentials {
    Credentials::ClientSecret(ClientSecretCredentials {
        authority: Some(authority),
        tenant_id: TENANT_ID.to_string(),
        client_id: "test-client-id".to_string(),
        client_secret: "test-client-secret".to_string(),
        ..Default::default()
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use scoped_env::ScopedEnv;

    #[tokio::test]
    async fn client_secret_end_to_end() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", format!("/{TENANT_ID}/oauth2/v2.0/token")),
                request::body(url_decoded(contains(("grant_type", "client_credentials")))),
                request::body(url_decoded(contains(("scope", SCOPE)))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "test-access-token",
            }))),
        );

        let cache = TokenCache::new();
        let provider = AccessTokenProvider::builder(
            &AzureSettings::default(),
            &client_secret(server.url_str("/")),
        )
        .with_token_cache(Arc::new(cache.clone()))
        .build()?;
        let Retriever::ClientSecret(retriever) = provider.retriever() else {
            panic!("expected a client secret retriever, got {:?}", provider.retriever());
        };
        assert_eq!(retriever.authority_host(), server.url_str("/"));

        let cancel = CancellationToken::new();
        let token = provider.get_access_token(&cancel, [SCOPE]).await?;
        assert_eq!(token, "test-access-token");

        // Served from the cache, the server expects a single request.
        let token = provider.get_access_token(&cancel, [SCOPE]).await?;
        assert_eq!(token, "test-access-token");
        assert_eq!(cache.len().await, 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_request() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method("POST"))
                .times(1)
                .respond_with(json_encoded(json!({
                    "token_type": "Bearer",
                    "expires_in": 3599,
                    "access_token": "test-access-token",
                }))),
        );

        let provider = AccessTokenProvider::builder(
            &AzureSettings::default(),
            &client_secret(server.url_str("/")),
        )
        .with_token_cache(Arc::new(TokenCache::new()))
        .build()?;

        let tasks = (0..32)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move {
                    provider
                        .get_access_token(&CancellationToken::new(), [SCOPE])
                        .await
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            assert_eq!(task.await??, "test-access-token");
        }
        Ok(())
    }

    #[tokio::test]
    async fn providers_do_not_share_tokens() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method("POST"))
                .times(2)
                .respond_with(json_encoded(json!({
                    "token_type": "Bearer",
                    "expires_in": 3599,
                    "access_token": "test-access-token",
                }))),
        );

        // Structurally equal credentials, resolved twice.
        let cache: Arc<dyn AccessTokenCache> = Arc::new(TokenCache::new());
        let credentials = client_secret(server.url_str("/"));
        let first = AccessTokenProvider::builder(&AzureSettings::default(), &credentials)
            .with_token_cache(cache.clone())
            .build()?;
        let second = AccessTokenProvider::builder(&AzureSettings::default(), &credentials)
            .with_token_cache(cache)
            .build()?;

        let cancel = CancellationToken::new();
        first.get_access_token(&cancel, [SCOPE]).await?;
        second.get_access_token(&cancel, [SCOPE]).await?;
        Ok(())
    }

    #[tokio::test]
    async fn errors_are_not_cached() -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method("POST"))
                .times(2)
                .respond_with(status_code(503).body("try again later")),
        );

        let provider = AccessTokenProvider::builder(
            &AzureSettings::default(),
            &client_secret(server.url_str("/")),
        )
        .with_token_cache(Arc::new(TokenCache::new()))
        .build()?;

        let cancel = CancellationToken::new();
        for _ in 0..2 {
            let err = provider
                .get_access_token(&cancel, [SCOPE])
                .await
                .unwrap_err();
            assert!(err.is_retryable(), "{err:?}");
            assert!(err.to_string().contains("try again later"), "{err}");
        }
        Ok(())
    }

    #[test]
    fn from_json_unknown_type() {
        let err = Credentials::from_json(json!({"authType": "certificate"})).unwrap_err();
        assert!(err.is_unknown_type(), "{err:?}");
        assert!(
            err.to_string().contains("unsupported credential type"),
            "{err}"
        );
    }

    #[test]
    #[serial_test::serial]
    fn managed_identity_from_env() -> TestResult {
        let _e1 = ScopedEnv::set("AZURE_MANAGED_IDENTITY_ENABLED", "true");
        let _e2 = ScopedEnv::set("AZURE_MANAGED_IDENTITY_CLIENT_ID", "env-client-id");
        let _e3 = ScopedEnv::remove("AZURE_CLOUD");

        let settings = AzureSettings::from_env()?;
        let credentials = Credentials::from_json(json!({"authType": "msi"}))?;
        let provider = AccessTokenProvider::new(&settings, &credentials)?;
        let Retriever::ManagedIdentity(retriever) = provider.retriever() else {
            panic!("expected a managed identity retriever, got {:?}", provider.retriever());
        };
        assert_eq!(retriever.client_id(), Some("env-client-id"));
        Ok(())
    }

    #[test]
    #[serial_test::serial]
    fn managed_identity_disabled_by_default() -> TestResult {
        let _e1 = ScopedEnv::remove("AZURE_MANAGED_IDENTITY_ENABLED");
        let _e2 = ScopedEnv::remove("AZURE_MANAGED_IDENTITY_CLIENT_ID");
        let _e3 = ScopedEnv::remove("AZURE_CLOUD");

        let settings = AzureSettings::from_env()?;
        let credentials = Credentials::from_json(json!({"authType": "msi"}))?;
        let err = AccessTokenProvider::new(&settings, &credentials).unwrap_err();
        assert!(err.is_not_enabled(), "{err:?}");
        Ok(())
    }

    #[test]
    #[serial_test::serial]
    fn client_secret_cloud_from_env() -> TestResult {
        let _e1 = ScopedEnv::remove("AZURE_MANAGED_IDENTITY_ENABLED");
        let _e2 = ScopedEnv::remove("AZURE_MANAGED_IDENTITY_CLIENT_ID");
        let _e3 = ScopedEnv::set("AZURE_CLOUD", "AzureChinaCloud");

        let settings = AzureSettings::from_env()?;
        let credentials = Credentials::from_json(json!({
            "authType": "clientsecret",
            "tenantId": TENANT_ID,
            "clientId": "test-client-id",
            "clientSecret": "test-client-secret",
        }))?;
        let provider = AccessTokenProvider::new(&settings, &credentials)?;
        let Retriever::ClientSecret(retriever) = provider.retriever() else {
            panic!("expected a client secret retriever, got {:?}", provider.retriever());
        };
        assert_eq!(retriever.authority_host(), "https://login.chinacloudapi.cn/");
        Ok(())
    }
}
