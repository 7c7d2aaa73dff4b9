//! Error types for the inventory API client.
//!
//! # Design
//! Every failure is returned to the caller unchanged; nothing here retries.
//! Variants group into four kinds (see `ErrorKind`): the request could not be
//! built, the round trip failed, the server answered with a non-2xx status,
//! or a 2xx body was not the JSON we expected. `ApiError` keeps the request
//! method, URL and status line even when the server's error body is missing,
//! so a bare 502 from a proxy is still diagnosable.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::http::{HttpMethod, HttpResponse};

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// The relative path did not resolve against the base URL.
    #[error("invalid request path: {0}")]
    InvalidPath(#[from] url::ParseError),

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection, TLS or protocol failure while talking to the server.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline passed before the response arrived.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The server returned a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 2xx response body was not valid JSON for the expected type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Construction,
    Transport,
    Api,
    Decode,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) | Error::InvalidPath(_) | Error::Encode(_) => ErrorKind::Construction,
            Error::Transport(_) | Error::Cancelled | Error::DeadlineExceeded => ErrorKind::Transport,
            Error::Api(_) => ErrorKind::Api,
            Error::Decode(_) => ErrorKind::Decode,
        }
    }

    /// The structured API error, if the server rejected the request.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of a rejected request.
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|err| err.http_status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-2xx response from the inventory API.
///
/// `code`, `status` and `message` come from the response body when it parses
/// as `{"code": .., "status": .., "message": ..}` and are zero/empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: i64,
    pub status: String,
    pub message: String,
    pub method: HttpMethod,
    pub url: Url,
    pub http_status: u16,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    code: i64,
    status: String,
    message: String,
}

impl ApiError {
    pub(crate) fn from_response(method: HttpMethod, url: &Url, response: &HttpResponse) -> Self {
        let body: ErrorBody = serde_json::from_str(&response.body).unwrap_or_default();
        Self {
            code: body.code,
            status: body.status,
            message: body.message,
            method,
            url: url.clone(),
            http_status: response.status,
            reason: response.reason.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {} {}",
            self.method, self.url, self.http_status, self.status, self.message
        )
    }
}

impl std::error::Error for ApiError {}
