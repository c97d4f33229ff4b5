use thiserror::Error;

/// Failure of a call to the weather provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("Error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from weather provider: {0}")]
    Decode(String),

    #[error("Could not read stored credential: {0}")]
    Storage(#[from] StorageError),
}

impl GatewayError {
    /// Text for a user notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => "Please set your OpenWeatherMap API key in settings".to_string(),
            Self::Http { status: 401, .. } => {
                "Invalid API key. Please check your OpenWeatherMap API key.".to_string()
            }
            Self::Http { message, .. } => format!("Weather data error: {message}"),
            other => format!("Weather data error: {other}"),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

/// Rejected user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a city name")]
    EmptyQuery,

    #[error("Please enter a valid API key")]
    EmptyApiKey,

    #[error("Please enter a valid email address: '{0}'")]
    InvalidEmail(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Storage location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service unavailable")]
    Unavailable,

    #[error("Location error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_gets_credential_hint() {
        let err = GatewayError::Http { status: 401, message: "Invalid API key".into() };
        assert!(err.is_unauthorized());
        assert_eq!(
            err.user_message(),
            "Invalid API key. Please check your OpenWeatherMap API key."
        );
    }

    #[test]
    fn other_http_errors_pass_provider_message_through() {
        let err = GatewayError::Http { status: 404, message: "city not found".into() };
        assert!(!err.is_unauthorized());
        assert_eq!(err.user_message(), "Weather data error: city not found");
    }

    #[test]
    fn missing_credential_prompts_for_settings() {
        let msg = GatewayError::MissingCredential.user_message();
        assert!(msg.contains("API key in settings"));
    }

    #[test]
    fn network_error_is_reported_generically() {
        let msg = GatewayError::Network("connection refused".into()).user_message();
        assert_eq!(msg, "Weather data error: Network error: connection refused");
    }
}
