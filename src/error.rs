// Error types for calls against the banking and user services
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankingError {
    // No bearer token stored, or the stored token cannot be decoded
    Unauthenticated,

    // Client-side validation, nothing was sent
    Validation(String),

    // Transport errors
    Transport(String),
    Timeout(String),

    // Backend answered, but not with what we wanted
    Status { status: u16, body: String },
    Decode(String),
    Rejected(String),
}

impl fmt::Display for BankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Not authenticated"),
            Self::Validation(msg) => write!(f, "Validation failed: {}", msg),
            Self::Transport(msg) => write!(f, "Transport error: {}", msg),
            Self::Timeout(url) => write!(f, "Request timed out: {}", url),
            Self::Status { status, body } => write!(f, "Backend returned {}: {}", status, body),
            Self::Decode(msg) => write!(f, "Invalid response body: {}", msg),
            Self::Rejected(msg) => write!(f, "Request rejected: {}", msg),
        }
    }
}

impl std::error::Error for BankingError {}

impl From<reqwest::Error> for BankingError {
    fn from(err: reqwest::Error) -> Self {
        let target = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown url>".to_string());
        if err.is_timeout() {
            BankingError::Timeout(target)
        } else if err.is_decode() {
            BankingError::Decode(err.to_string())
        } else {
            BankingError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BankingError {
    fn from(err: serde_json::Error) -> Self {
        BankingError::Decode(err.to_string())
    }
}

impl BankingError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Status { .. } => "BAD_STATUS",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Rejected(_) => "REJECTED",
        }
    }

    /// Worth trying again later without user involvement
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// 401/403 from the backend mean the same thing as a missing token
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Unauthenticated => true,
            Self::Status { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}
