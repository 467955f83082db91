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

//! Errors returned while acquiring access tokens.
//!
//! Problems with the credential configuration itself are reported when the
//! provider is created, see [crate::build_errors].

use http::StatusCode;
use std::error::Error;
use std::sync::Arc;

type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Represents an error acquiring an access token.
///
/// The token cache shares the outcome of a single fetch with every caller
/// waiting on it, so this type is cheap to clone.
#[derive(thiserror::Error, Clone, Debug)]
#[error(transparent)]
pub struct CredentialsError(ErrorKind);

#[derive(thiserror::Error, Clone, Debug)]
enum ErrorKind {
    #[error("cannot acquire access token, {}, source: {source}", retry_message(.is_retryable))]
    Acquisition {
        is_retryable: bool,
        #[source]
        source: SharedError,
    },
    #[error("the request for an access token was cancelled")]
    Cancelled,
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
struct Message(String);

const RETRYABLE_MSG: &str = "but future attempts may succeed";
const NON_RETRYABLE_MSG: &str = "and future attempts will not succeed";

fn retry_message(is_retryable: &bool) -> &'static str {
    if *is_retryable {
        RETRYABLE_MSG
    } else {
        NON_RETRYABLE_MSG
    }
}

impl CredentialsError {
    /// Creates a new acquisition error.
    ///
    /// # Arguments
    /// * `is_retryable` - whether a future attempt might succeed.
    /// * `source` - the underlying error that caused the failure.
    pub fn new<T>(is_retryable: bool, source: T) -> Self
    where
        T: Error + Send + Sync + 'static,
    {
        CredentialsError(ErrorKind::Acquisition {
            is_retryable,
            source: Arc::new(source),
        })
    }

    /// Creates a new acquisition error from a plain message.
    pub fn from_msg<T: Into<String>>(is_retryable: bool, message: T) -> Self {
        CredentialsError::new(is_retryable, Message(message.into()))
    }

    /// The caller stopped waiting for the token.
    pub(crate) fn cancelled() -> Self {
        CredentialsError(ErrorKind::Cancelled)
    }

    /// Returns `true` if a future attempt to acquire the token may succeed.
    ///
    /// This crate never retries on its own. Callers that do retry should use
    /// exponential backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.0,
            ErrorKind::Acquisition {
                is_retryable: true,
                ..
            }
        )
    }

    /// Returns `true` if the caller cancelled the request before a token was
    /// available.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.0, ErrorKind::Cancelled)
    }
}

pub(crate) fn retryable<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::new(true, source)
}

pub(crate) fn non_retryable<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::new(false, source)
}

pub(crate) fn non_retryable_from_str<T: Into<String>>(message: T) -> CredentialsError {
    CredentialsError::from_msg(false, message)
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything wrong
        // with our request, so we retry them.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(StatusCode::SERVICE_UNAVAILABLE)]
    #[test_case(StatusCode::REQUEST_TIMEOUT)]
    #[test_case(StatusCode::TOO_MANY_REQUESTS)]
    fn retryable_status(c: StatusCode) {
        assert!(is_retryable(c));
    }

    #[test_case(StatusCode::NOT_FOUND)]
    #[test_case(StatusCode::UNAUTHORIZED)]
    #[test_case(StatusCode::BAD_REQUEST)]
    #[test_case(StatusCode::BAD_GATEWAY)]
    #[test_case(StatusCode::PRECONDITION_FAILED)]
    fn non_retryable_status(c: StatusCode) {
        assert!(!is_retryable(c));
    }

    #[test]
    fn fmt() {
        let e = CredentialsError::from_msg(true, "test-only-err-123");
        let got = format!("{e}");
        assert!(got.contains("test-only-err-123"), "{got}");
        assert!(got.contains(RETRYABLE_MSG), "{got}");
        assert!(e.is_retryable(), "{e:?}");
        assert!(!e.is_cancelled(), "{e:?}");

        let e = CredentialsError::from_msg(false, "test-only-err-123");
        let got = format!("{e}");
        assert!(got.contains("test-only-err-123"), "{got}");
        assert!(got.contains(NON_RETRYABLE_MSG), "{got}");
        assert!(!e.is_retryable(), "{e:?}");
    }

    #[test]
    fn source() {
        let e = non_retryable(Message("inner-message".to_string()));
        let source = e.source().expect("acquisition errors carry a source");
        assert_eq!(source.to_string(), "inner-message");
    }

    #[test]
    fn cancelled() {
        let e = CredentialsError::cancelled();
        assert!(e.is_cancelled(), "{e:?}");
        assert!(!e.is_retryable(), "{e:?}");
        assert!(e.source().is_none(), "{e:?}");
        assert!(e.to_string().contains("cancelled"), "{e}");
    }

    #[test]
    fn clone_shares_source() {
        let e = retryable(Message("shared".to_string()));
        let c = e.clone();
        assert_eq!(e.to_string(), c.to_string());
        assert!(c.is_retryable());
    }
}
