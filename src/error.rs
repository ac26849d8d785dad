use thiserror::Error;

/// Fallback shown when a failure carries no server-provided message.
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Error, Debug)]
pub enum RugenError {
    /// The request never got a response (connect failure, timeout, DNS).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl RugenError {
    /// Message suitable for the status bar. Server payload and auth outcomes
    /// are shown as-is, everything else collapses to the generic text.
    pub fn user_message(&self) -> String {
        match self {
            RugenError::Server { message, .. } if !message.is_empty() => message.clone(),
            RugenError::Auth(message) => message.clone(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RugenError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RugenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_surfaced() {
        let err = RugenError::Server {
            status: 400,
            message: "Unsupported region".to_string(),
        };
        assert_eq!(err.user_message(), "Unsupported region");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn empty_server_message_falls_back() {
        let err = RugenError::Server {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn network_error_uses_generic_message() {
        let err = RugenError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn auth_message_is_shown_verbatim() {
        let err = RugenError::Auth("Invalid credentials. Please try again.".to_string());
        assert_eq!(err.user_message(), "Invalid credentials. Please try again.");
    }
}
