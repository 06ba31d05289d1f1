//! Error handling for catalog API operations.

use thiserror::Error;

/// Common error type for catalog API operations.
///
/// Every failure is either [CatalogClientError::NotFound],
/// or a transport failure (see [CatalogClientError::is_transport]).
/// No request is ever retried; callers decide how to recover.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The requested id or name does not exist in the catalog.
    #[error("'{0}' was not found in the catalog")]
    NotFound(String),

    /// The request could not be completed (connection failure, timeout).
    #[error("request to '{url}' failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The catalog answered with a non-success status other than 404.
    #[error("request to '{url}' failed with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The response body did not match the expected document shape.
    #[error("could not decode response from '{url}'")]
    InvalidResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The client could not be constructed from its configuration.
    #[error("invalid catalog client configuration: {0}")]
    InvalidConfig(String),
}

impl CatalogClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogClientError::NotFound(_))
    }

    /// Whether this error belongs to the transport category:
    /// network failures, timeouts, unexpected statuses and bad payloads.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CatalogClientError::Transport { .. }
                | CatalogClientError::UnexpectedStatus { .. }
                | CatalogClientError::InvalidResponse { .. }
        )
    }

    /// Whether the request was aborted by the per-request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CatalogClientError::Transport { source, .. } if source.is_timeout())
    }
}
