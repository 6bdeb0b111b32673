use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure, non-2xx response or undecodable body.
    #[error("{method} request failed with error: {message}")]
    Request {
        method: Method,
        status: Option<StatusCode>,
        message: String,
    },

    /// The id was not present in an already-fetched collection.
    #[error("Unable to find issue with id:  {id}")]
    Lookup { id: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Base URL cannot carry path segments: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    pub fn request(method: &Method, err: impl std::fmt::Display) -> Self {
        ApiError::Request {
            method: method.clone(),
            status: None,
            message: err.to_string(),
        }
    }

    pub fn status(method: &Method, status: StatusCode) -> Self {
        ApiError::Request {
            method: method.clone(),
            status: Some(status),
            message: format!("Request failed with status code {}", status.as_u16()),
        }
    }

    /// HTTP status carried by a failed request, if the remote answered at all.
    pub fn http_status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Request { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, ApiError::Lookup { .. })
    }

    pub fn suggestion(&self) -> Option<&str> {
        if self.is_lookup() {
            return Some("Only issues visible to the authenticated user are searched");
        }

        match self.http_status()? {
            StatusCode::UNAUTHORIZED => {
                Some("Set PRIVATE_ACCESS_TOKEN to a valid personal access token")
            }
            StatusCode::NOT_FOUND => {
                Some("Check that the project and issue ids exist and are visible to the token")
            }
            StatusCode::BAD_REQUEST => Some("Review the query parameters"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
