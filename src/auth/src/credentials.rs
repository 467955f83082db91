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

use crate::build_errors::Error as BuildError;
use serde::Deserialize;
use serde_json::Value;

const AUTH_TYPE_FIELD: &str = "authType";
const MANAGED_IDENTITY_AUTH_TYPE: &str = "msi";
const CLIENT_SECRET_AUTH_TYPE: &str = "clientsecret";

/// Describes how to authenticate with Microsoft Entra ID.
///
/// A `Credentials` value does not perform any authentication. Use it to
/// create an [AccessTokenProvider][crate::provider::AccessTokenProvider].
#[derive(Clone, Debug, PartialEq)]
pub enum Credentials {
    /// Use the [managed identity] of the Azure resource running the
    /// application.
    ///
    /// [managed identity]: https://learn.microsoft.com/entra/identity/managed-identities-azure-resources/overview
    ManagedIdentity(ManagedIdentityCredentials),

    /// Use an application registration and one of its client secrets.
    ClientSecret(ClientSecretCredentials),
}

/// Managed identity credentials.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManagedIdentityCredentials {
    /// The client id of a user-assigned identity.
    ///
    /// If `None`, the settings may provide one. Otherwise the system-assigned
    /// identity is used.
    pub client_id: Option<String>,
}

/// Client secret credentials for an application registration.
#[derive(Clone, Default, PartialEq)]
pub struct ClientSecretCredentials {
    /// The Azure cloud hosting the tenant, for example `"AzureCloud"`.
    ///
    /// If `None`, the default cloud from the settings is used.
    pub cloud: Option<String>,

    /// An explicit authority host, such as `https://login.microsoftonline.com/`.
    ///
    /// Takes priority over `cloud`.
    pub authority: Option<String>,

    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientSecretCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredentials")
            .field("cloud", &self.cloud)
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedIdentityJson {
    client_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientSecretJson {
    azure_cloud: Option<String>,
    authority: Option<String>,
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Parses a credentials description.
    ///
    /// The description is a JSON object with an `authType` field, either
    /// `"msi"` or `"clientsecret"`:
    ///
    /// ```
    /// # use azure_token_provider::credentials::Credentials;
    /// let credentials = Credentials::from_json(serde_json::json!({
    ///     "authType": "clientsecret",
    ///     "azureCloud": "AzureCloud",
    ///     "tenantId": "my-tenant",
    ///     "clientId": "my-client",
    ///     "clientSecret": "my-secret",
    /// }))?;
    /// assert_eq!(credentials.auth_type(), "clientsecret");
    /// # Ok::<(), azure_token_provider::build_errors::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if `authType` is missing or names an unsupported
    /// credential type, or if the remaining fields are malformed.
    pub fn from_json(value: Value) -> Result<Credentials, BuildError> {
        let auth_type = value
            .get(AUTH_TYPE_FIELD)
            .ok_or_else(|| BuildError::missing_field(AUTH_TYPE_FIELD))?
            .as_str()
            .ok_or_else(|| BuildError::parsing("the `authType` field is not a string"))?
            .to_string();

        match auth_type.as_str() {
            MANAGED_IDENTITY_AUTH_TYPE => {
                let json = serde_json::from_value::<ManagedIdentityJson>(value)
                    .map_err(BuildError::parsing)?;
                Ok(Credentials::ManagedIdentity(ManagedIdentityCredentials {
                    client_id: non_empty(json.client_id),
                }))
            }
            CLIENT_SECRET_AUTH_TYPE => {
                let json = serde_json::from_value::<ClientSecretJson>(value)
                    .map_err(BuildError::parsing)?;
                Ok(Credentials::ClientSecret(ClientSecretCredentials {
                    cloud: non_empty(json.azure_cloud),
                    authority: non_empty(json.authority),
                    tenant_id: json.tenant_id,
                    client_id: json.client_id,
                    client_secret: json.client_secret,
                }))
            }
            other => Err(BuildError::unknown_type(other.to_string())),
        }
    }

    /// The `authType` value describing these credentials.
    pub fn auth_type(&self) -> &'static str {
        match self {
            Credentials::ManagedIdentity(_) => MANAGED_IDENTITY_AUTH_TYPE,
            Credentials::ClientSecret(_) => CLIENT_SECRET_AUTH_TYPE,
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
