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

use crate::build_errors::Error as BuildError;
use crate::clouds;
use crate::credentials::non_empty;

/// Enables managed identity credentials when set to `true` or `1`.
pub const MANAGED_IDENTITY_ENABLED_VAR: &str = "AZURE_MANAGED_IDENTITY_ENABLED";
/// The client id of the user-assigned identity used by default.
pub const MANAGED_IDENTITY_CLIENT_ID_VAR: &str = "AZURE_MANAGED_IDENTITY_CLIENT_ID";
/// The cloud used for credentials that do not name one.
pub const AZURE_CLOUD_VAR: &str = "AZURE_CLOUD";

/// Settings shared by all the credentials in a process.
///
/// Settings are read-only once built. Use [AzureSettings::builder] to
/// configure them in code, or [AzureSettings::from_env] to read them from the
/// environment.
#[derive(Clone, Debug, PartialEq)]
pub struct AzureSettings {
    managed_identity_enabled: bool,
    managed_identity_client_id: Option<String>,
    default_cloud: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Builder::default().build()
    }
}

impl AzureSettings {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Reads the settings from the environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `AZURE_MANAGED_IDENTITY_ENABLED` | `false` |
    /// | `AZURE_MANAGED_IDENTITY_CLIENT_ID` | unset |
    /// | `AZURE_CLOUD` | `AzureCloud` |
    ///
    /// # Errors
    ///
    /// Returns an error if `AZURE_MANAGED_IDENTITY_ENABLED` is not a boolean,
    /// or if `AZURE_CLOUD` names an unknown cloud.
    pub fn from_env() -> Result<AzureSettings, BuildError> {
        let mut builder = Builder::default();
        if let Some(enabled) = env_var(MANAGED_IDENTITY_ENABLED_VAR) {
            builder = builder.with_managed_identity_enabled(parse_bool(&enabled)?);
        }
        if let Some(client_id) = env_var(MANAGED_IDENTITY_CLIENT_ID_VAR) {
            builder = builder.with_managed_identity_client_id(client_id);
        }
        if let Some(cloud) = env_var(AZURE_CLOUD_VAR) {
            if clouds::authority_host(&cloud).is_none() {
                return Err(BuildError::unsupported_cloud(cloud));
            }
            builder = builder.with_default_cloud(cloud);
        }
        Ok(builder.build())
    }

    pub fn managed_identity_enabled(&self) -> bool {
        self.managed_identity_enabled
    }

    pub fn managed_identity_client_id(&self) -> Option<&str> {
        self.managed_identity_client_id.as_deref()
    }

    pub fn default_cloud(&self) -> &str {
        &self.default_cloud
    }
}

fn env_var(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

fn parse_bool(value: &str) -> Result<bool, BuildError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(BuildError::parsing(format!(
            "{MANAGED_IDENTITY_ENABLED_VAR} must be a boolean, got {value:?}"
        ))),
    }
}

/// A builder for [AzureSettings].
///
/// # Example
/// ```
/// # use azure_token_provider::settings::AzureSettings;
/// let settings = AzureSettings::builder()
///     .with_managed_identity_enabled(true)
///     .with_default_cloud("AzureChinaCloud")
///     .build();
/// assert!(settings.managed_identity_enabled());
/// ```
#[derive(Debug)]
pub struct Builder {
    managed_identity_enabled: bool,
    managed_identity_client_id: Option<String>,
    default_cloud: String,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            managed_identity_enabled: false,
            managed_identity_client_id: None,
            default_cloud: clouds::AZURE_PUBLIC.to_string(),
        }
    }
}

impl Builder {
    /// Allows managed identity credentials. Disabled by default.
    pub fn with_managed_identity_enabled(mut self, enabled: bool) -> Self {
        self.managed_identity_enabled = enabled;
        self
    }

    /// Sets the user-assigned identity for managed identity credentials that
    /// do not carry a client id.
    pub fn with_managed_identity_client_id<S: Into<String>>(mut self, client_id: S) -> Self {
        self.managed_identity_client_id = Some(client_id.into());
        self
    }

    /// Sets the cloud for client secret credentials that do not name one.
    ///
    /// Defaults to `AzureCloud`.
    pub fn with_default_cloud<S: Into<String>>(mut self, cloud: S) -> Self {
        self.default_cloud = cloud.into();
        self
    }

    pub fn build(self) -> AzureSettings {
        AzureSettings {
            managed_identity_enabled: self.managed_identity_enabled,
            managed_identity_client_id: self.managed_identity_client_id,
            default_cloud: self.default_cloud,
        }
    }
}
