use crate::bookmark::KeyError;
use crate::response::text_response;
use crate::store::StoreError;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Response};
use thiserror::Error;

/// Request failures, each mapped to a fixed status and caller-facing body.
#[derive(Debug, Error)]
pub(crate) enum BookmarkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid bookmark request body: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("request carries no authenticated user")]
    Unauthenticated,
    #[error("no route for {0:?}")]
    RouteNotFound(String),
    #[error("{message}: {source}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl BookmarkError {
    pub(crate) fn store(message: &'static str, source: StoreError) -> Self {
        Self::Store { message, source }
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body returned to the caller; store details stay in the logs.
    pub(crate) fn public_message(&self) -> &str {
        match self {
            Self::InvalidInput(message) => message.as_str(),
            Self::MalformedBody(_) => "Invalid bookmark request body",
            Self::Unauthenticated => "Unauthorized",
            Self::RouteNotFound(_) => "Path Not Found",
            Self::Store { message, .. } => *message,
        }
    }

    pub(crate) fn into_response(self) -> Result<Response<Body>, Error> {
        text_response(self.status(), self.public_message())
    }
}

impl From<KeyError> for BookmarkError {
    fn from(err: KeyError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
