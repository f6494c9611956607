//! Error types and handling for the AI Weather pipeline

use thiserror::Error;

/// Main error type for the weather pipeline
#[derive(Error, Debug)]
pub enum WeatherError {
    /// The geocoding service had no match for the place name
    #[error("Location not found: {query}")]
    NotFound { query: String },

    /// Transport failure or transient status after all attempts were used
    #[error("Network error after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: u32 },

    /// Terminal non-success HTTP status, never retried
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Malformed provider payload
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// The AI chat backend could not produce a comfort assessment
    #[error("Comfort assessment unavailable: {message}")]
    ComfortUnavailable { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherError {
    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    pub fn network<S: Into<String>>(message: S, attempts: u32) -> Self {
        Self::Network {
            message: message.into(),
            attempts,
        }
    }

    pub fn http_status<S: Into<String>>(status: u16, url: S) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn comfort_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ComfortUnavailable {
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Whether a later retry of the whole fetch could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, WeatherError::Network { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::NotFound { query } => {
                format!("Could not find a place called '{query}'. Check the spelling and try again.")
            }
            WeatherError::Network { .. } => {
                "Unable to reach the weather service. Please check your internet connection and try again later."
                    .to_string()
            }
            WeatherError::HttpStatus { status, .. } => {
                format!("The weather service rejected the request (HTTP {status}).")
            }
            WeatherError::Parse { .. } => {
                "The weather service returned data that could not be read.".to_string()
            }
            WeatherError::ComfortUnavailable { .. } => {
                "The AI comfort assessment is currently unavailable.".to_string()
            }
            WeatherError::Validation { message } => format!("Invalid input: {message}"),
            WeatherError::Config { .. } => {
                "Configuration error. Please check your config file and credentials.".to_string()
            }
            WeatherError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            WeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = WeatherError::not_found("Atlantis");
        assert!(matches!(err, WeatherError::NotFound { .. }));

        let err = WeatherError::network("connection reset", 5);
        assert!(matches!(err, WeatherError::Network { attempts: 5, .. }));

        let err = WeatherError::http_status(404, "https://example.org");
        assert!(matches!(err, WeatherError::HttpStatus { status: 404, .. }));
    }

    #[test]
    fn test_only_network_errors_are_transient() {
        assert!(WeatherError::network("timeout", 5).is_transient());
        assert!(!WeatherError::http_status(400, "u").is_transient());
        assert!(!WeatherError::parse("bad").is_transient());
        assert!(!WeatherError::not_found("x").is_transient());
    }

    #[test]
    fn test_user_messages() {
        let err = WeatherError::not_found("Atlantis");
        assert!(err.user_message().contains("Atlantis"));

        let err = WeatherError::network("test", 5);
        assert!(err.user_message().contains("Unable to reach"));

        let err = WeatherError::validation("place name is empty");
        assert!(err.user_message().contains("place name is empty"));
    }

    #[test]
    fn test_json_error_becomes_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: WeatherError = json_err.into();
        assert!(matches!(err, WeatherError::Parse { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherError = io_err.into();
        assert!(matches!(err, WeatherError::Io { .. }));
    }
}
