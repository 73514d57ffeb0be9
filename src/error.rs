use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Substring the platform surfaces when the session cookie appears twice.
pub(crate) const DUPLICATE_COOKIE_MSG: &str = "Multiple cookies exist with name=ct0";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Api error, status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, resets at unix timestamp {reset}")]
    RateLimited { reset: i64 },
}

impl Error {
    /// Matches the duplicate-session condition the cookie file repair can fix.
    pub fn is_duplicate_cookie(&self) -> bool {
        match self {
            Error::Api { message, .. } => {
                message.contains(DUPLICATE_COOKIE_MSG) || message.to_lowercase().contains("ct0")
            }
            Error::Auth(message) => {
                message.contains(DUPLICATE_COOKIE_MSG) || message.to_lowercase().contains("ct0")
            }
            _ => false,
        }
    }
}
