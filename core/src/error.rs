//! Error types for the DataCite client.
//!
//! # Design
//! Every unexpected status code is turned into exactly one
//! `ApiError::Api`, tagged with an [`ApiErrorKind`] and carrying the raw
//! status and body for diagnostics. Callers match on the kind instead of
//! parsing messages. Failures detected before any request is sent are
//! `InvalidArgument`; failures below HTTP (connect, timeout) are `Transport`.

use std::fmt;

use thiserror::Error;

/// Classification of a non-success HTTP status returned by DataCite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 204: the endpoint had nothing to return where content was expected.
    NoContent,
    /// 400: malformed request, including metadata rejected by the validator.
    BadRequest,
    /// 401: missing or wrong credentials.
    Unauthorized,
    /// 403: credentials valid but not allowed for this prefix or DOI.
    Forbidden,
    /// 404: unknown DOI, or no metadata/media registered for it.
    NotFound,
    /// 409: the DOI already exists.
    Conflict,
    /// 410: the metadata was marked inactive.
    Gone,
    /// 412: a precondition (usually metadata before minting) is not met.
    PreconditionFailed,
    /// Any 5xx.
    ServerError,
    /// Any other status.
    Unknown,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            204 => ApiErrorKind::NoContent,
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            410 => ApiErrorKind::Gone,
            412 => ApiErrorKind::PreconditionFailed,
            500..=599 => ApiErrorKind::ServerError,
            _ => ApiErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiErrorKind::NoContent => "no content",
            ApiErrorKind::BadRequest => "bad request",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Forbidden => "forbidden",
            ApiErrorKind::NotFound => "not found",
            ApiErrorKind::Conflict => "conflict",
            ApiErrorKind::Gone => "gone",
            ApiErrorKind::PreconditionFailed => "precondition failed",
            ApiErrorKind::ServerError => "server error",
            ApiErrorKind::Unknown => "unknown API error",
        };
        f.write_str(name)
    }
}

/// Errors returned by `DataCiteClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected locally; no request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// DataCite answered with a status other than the one the operation expects.
    #[error("DataCite {kind} (HTTP {status}): {body}")]
    Api {
        kind: ApiErrorKind,
        status: u16,
        body: String,
    },

    /// The request never produced an HTTP response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be decoded into the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Build the classified error for an unexpected status.
    pub fn classify(status: u16, body: impl Into<String>) -> Self {
        ApiError::Api {
            kind: ApiErrorKind::from_status(status),
            status,
            body: body.into(),
        }
    }

    /// The classification, if this error came from an HTTP status.
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            ApiError::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
