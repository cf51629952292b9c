//! Native S3 failures and their translation into bv-core errors
//!
//! Adapter code only ever sees [`NativeError`]; it is translated at the
//! container boundary, where the context (object or container) is known.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use bv_core::Error;

/// Result of a native bucket call
pub(crate) type NativeResult<T> = std::result::Result<T, NativeError>;

/// A failure reported by, or on the way to, the object store
#[derive(Debug, Clone, thiserror::Error)]
pub(crate) enum NativeError {
    /// The store answered with an error status
    #[error("{status} {}: {message}", .code.as_deref().unwrap_or("Error"))]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never got an answer (dispatch failure, timeout)
    #[error("{0}")]
    Transport(String),

    /// The request could not be built
    #[error("{0}")]
    Client(String),
}

impl NativeError {
    /// A 404 answer for `key`
    pub(crate) fn not_found(key: &str) -> Self {
        Self::Server {
            status: 404,
            code: Some("NoSuchKey".into()),
            message: format!("{key} does not exist"),
        }
    }

    /// Whether the store reported the target as missing
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }

    /// Translate in the context of an object path
    pub(crate) fn into_object_error(self, path: &str) -> Error {
        match self {
            err if err.is_not_found() => Error::NoObject(format!("{path} does not exist")),
            Self::Client(message) => Error::Client(message),
            err => Error::StorageResponse(err.to_string()),
        }
    }

    /// Translate a failure of an account-level call
    pub(crate) fn into_service_error(self) -> Error {
        match self {
            Self::Client(message) => Error::Client(message),
            err => Error::StorageResponse(err.to_string()),
        }
    }

    /// Translate in the context of a container name
    pub(crate) fn into_container_error(self, name: &str) -> Error {
        match self {
            err if err.is_not_found() => Error::NoContainer(format!("{name} does not exist")),
            Self::Client(message) => Error::Client(message),
            err => Error::StorageResponse(err.to_string()),
        }
    }
}

impl<E> From<SdkError<E, HttpResponse>> for NativeError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn from(err: SdkError<E, HttpResponse>) -> Self {
        let message = DisplayErrorContext(&err).to_string();
        match &err {
            SdkError::ConstructionFailure(_) => Self::Client(message),
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => Self::Transport(message),
            _ => match err.raw_response() {
                Some(raw) => Self::Server {
                    status: raw.status().as_u16(),
                    code: err
                        .as_service_error()
                        .and_then(|e| e.code())
                        .map(str::to_string),
                    message,
                },
                None => Self::Transport(message),
            },
        }
    }
}

/// Attach translation context to native results
pub(crate) trait NativeResultExt<T> {
    fn for_object(self, path: &str) -> bv_core::Result<T>;
    fn for_container(self, name: &str) -> bv_core::Result<T>;
}

impl<T> NativeResultExt<T> for NativeResult<T> {
    fn for_object(self, path: &str) -> bv_core::Result<T> {
        self.map_err(|e| e.into_object_error(path))
    }

    fn for_container(self, name: &str) -> bv_core::Result<T> {
        self.map_err(|e| e.into_container_error(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(status: u16) -> NativeError {
        NativeError::Server {
            status,
            code: None,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_not_found_depends_on_context() {
        assert!(matches!(
            server(404).into_object_error("a.txt"),
            Error::NoObject(_)
        ));
        assert!(matches!(
            server(404).into_container_error("docs"),
            Error::NoContainer(_)
        ));
    }

    #[test]
    fn test_other_statuses_are_storage_responses() {
        for status in [400, 403, 409, 500, 503] {
            let err = server(status).into_object_error("a.txt");
            assert!(matches!(err, Error::StorageResponse(_)), "{status}");
        }
        assert!(matches!(
            NativeError::Transport("timed out".into()).into_container_error("docs"),
            Error::StorageResponse(_)
        ));
    }

    #[test]
    fn test_client_failures_stay_client_errors() {
        let err = NativeError::Client("bad input".into()).into_object_error("a.txt");
        assert!(matches!(err, Error::Client(msg) if msg == "bad input"));
    }

    #[test]
    fn test_display_includes_status_and_code() {
        let err = NativeError::not_found("a.txt");
        assert_eq!(err.to_string(), "404 NoSuchKey: a.txt does not exist");
        assert_eq!(server(500).to_string(), "500 Error: boom");
    }

    #[test]
    fn test_result_ext() {
        let result: NativeResult<()> = Err(NativeError::not_found("x"));
        assert!(matches!(result.for_object("x"), Err(Error::NoObject(_))));
    }
}
