//! Error types for the warehouse provider.

use thiserror::Error;

use crate::client::ClientError;
use crate::schema::Diagnostic;

/// Errors that abort a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A call to the platform's API failed.
    #[error("API client error: {0}")]
    Client(#[from] ClientError),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Invalid request from the host.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// The platform rejected the submitted database credentials.
    #[error("Database credentials test failed with {} issue(s)", .issues.len())]
    CredentialsRejected {
        /// Warnings and validations reported by the credentials test.
        issues: Vec<Diagnostic>,
    },
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::FailedPrecondition(msg)
            | Self::InvalidRequest(msg)
            | Self::Unimplemented(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Client(err) => err.to_string(),
            Self::CredentialsRejected { .. } => self.to_string(),
        }
    }

    /// Render this error as host-facing diagnostics.
    ///
    /// The first diagnostic is always an error; a rejected credentials test also
    /// carries each reported issue.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::CredentialsRejected { issues } => {
                let mut diagnostics = vec![Diagnostic::error(format!(
                    "Database credentials test failed with {} issue(s)",
                    issues.len()
                ))
                .with_detail("Fix the reported issues in the credentials block and apply again.")];
                diagnostics.extend(issues);
                diagnostics
            },
            Self::FailedPrecondition(msg) => vec![Diagnostic::error(msg)],
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Configuration("missing token".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing token");

        let err = ProviderError::InvalidRequest("attribute 'uuid' must be known".to_string());
        assert_eq!(format!("{}", err), "Invalid request: attribute 'uuid' must be known");

        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: custom_resource");

        let err = ProviderError::FailedPrecondition("protected".to_string());
        assert_eq!(format!("{}", err), "Failed precondition: protected");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::InvalidRequest("bad import id".to_string());
        assert_eq!(err.message(), "bad import id");

        let err = ProviderError::Client(ClientError::EmptyResponse {
            operation: "getWarehouse",
        });
        assert_eq!(err.message(), "'getWarehouse' returned no data");
    }

    #[test]
    fn test_client_error_conversion() {
        let err: ProviderError = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ProviderError::Client(_)));
        assert_eq!(err.to_string(), "API client error: API error (500): boom");
    }

    #[test]
    fn test_credentials_rejected_diagnostics() {
        let err = ProviderError::CredentialsRejected {
            issues: vec![
                Diagnostic::warning("Host unreachable").with_detail("NETWORK"),
                Diagnostic::warning("Permission denied").with_detail("PERMISSIONS"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Database credentials test failed with 2 issue(s)"
        );

        let diagnostics = err.into_diagnostics();
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostics[1].summary, "Host unreachable");
        assert_eq!(diagnostics[2].severity, DiagnosticSeverity::Warning);
    }

    #[test]
    fn test_generic_error_diagnostics() {
        let diagnostics = ProviderError::Configuration("not configured".to_string()).into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert_eq!(diagnostics[0].summary, "Configuration error: not configured");

        let diagnostics =
            ProviderError::FailedPrecondition("deletion_protection is set".to_string()).into_diagnostics();
        assert_eq!(diagnostics[0].summary, "deletion_protection is set");
    }
}
