/// Error types for the remote translation client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Missing or invalid credential / provider configuration
    ConfigError(String),
    /// Transport failure while sending the request or reading the stream
    NetworkError(String),
    /// The API answered with an error status or an in-stream error object
    ApiError(String),
    /// The response stream could not be decoded
    StreamError(String),
    /// General error with context
    Other(String),
}

impl std::fmt::Display for MtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MtError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MtError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            MtError::ApiError(msg) => write!(f, "API error: {}", msg),
            MtError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            MtError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for MtError {}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MtError::NetworkError(format!("request timed out: {}", err))
        } else {
            MtError::NetworkError(err.to_string())
        }
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            MtError::ConfigError("no key".to_string()).to_string(),
            "Configuration error: no key"
        );
        assert_eq!(
            MtError::ApiError("quota".to_string()).to_string(),
            "API error: quota"
        );
        assert_eq!(MtError::Other("plain".to_string()).to_string(), "plain");
    }
}
