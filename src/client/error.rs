use thiserror::Error;

/// Errors raised while talking to the platform's GraphQL API.
///
/// Messages must never carry the API token or submitted database passwords.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure (connection refused, timeout, TLS, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// The response carried GraphQL errors.
    #[error("'{operation}' returned errors: {}", .messages.join("; "))]
    Graphql {
        /// Operation that failed.
        operation: &'static str,
        /// Messages from the `errors` array.
        messages: Vec<String>,
    },

    /// The response had neither data nor errors.
    #[error("'{operation}' returned no data")]
    EmptyResponse {
        /// Operation that returned nothing.
        operation: &'static str,
    },

    /// The response body could not be decoded.
    #[error("'{operation}' failed to decode response: {source}")]
    Decode {
        /// Operation whose response failed to decode.
        operation: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The client could not be built from the given settings.
    #[error("invalid client settings: {0}")]
    Settings(String),
}

impl ClientError {
    /// The GraphQL operation this error relates to, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Graphql { operation, .. }
            | Self::EmptyResponse { operation }
            | Self::Decode { operation, .. } => Some(operation),
            _ => None,
        }
    }
}
