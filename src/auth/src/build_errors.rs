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

//! Errors created while resolving credentials into a token provider.
//!
//! These errors describe a configuration problem. Retrying the same
//! configuration always fails the same way.

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for [AccessTokenProvider] construction.
///
/// [AccessTokenProvider]: crate::provider::AccessTokenProvider
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// Managed identity credentials were used while managed identities are
    /// disabled in the settings.
    pub fn is_not_enabled(&self) -> bool {
        matches!(self.0, ErrorKind::NotEnabled(_))
    }

    /// The credentials refer to an Azure cloud without a known authority host.
    pub fn is_unsupported_cloud(&self) -> bool {
        matches!(self.0, ErrorKind::UnsupportedCloud(_))
    }

    /// The credentials type is invalid or unknown.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self.0, ErrorKind::UnknownType(_))
    }

    /// A problem parsing a credentials description or the settings.
    pub fn is_parsing(&self) -> bool {
        matches!(self.0, ErrorKind::Parsing(_))
    }

    /// A required field was missing.
    pub fn is_missing_field(&self) -> bool {
        matches!(self.0, ErrorKind::MissingField(_))
    }

    pub(crate) fn not_enabled(feature: &'static str) -> Error {
        Error(ErrorKind::NotEnabled(feature))
    }

    pub(crate) fn unsupported_cloud<T: Into<String>>(cloud: T) -> Error {
        Error(ErrorKind::UnsupportedCloud(cloud.into()))
    }

    pub(crate) fn unknown_type<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::UnknownType(source.into()))
    }

    pub(crate) fn parsing<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Parsing(source.into()))
    }

    pub(crate) fn missing_field(field: &'static str) -> Error {
        Error(ErrorKind::MissingField(field))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("{0} authentication is not enabled")]
    NotEnabled(&'static str),
    #[error("unsupported cloud {0:?}")]
    UnsupportedCloud(String),
    #[error("unsupported credential type {0}")]
    UnknownType(#[source] BoxError),
    #[error("cannot parse the configuration {0}")]
    Parsing(#[source] BoxError),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
