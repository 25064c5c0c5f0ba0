use serde_json::Value;
use std::fmt;

/// Non-success HTTP response from an upstream provider, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ProviderHttpError {
    pub provider: &'static str,
    pub status: u16,
    pub body: String,
    pub body_json: Option<Value>,
}

impl ProviderHttpError {
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

impl fmt::Display for ProviderHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider error (provider={}, status={}): {}",
            self.provider, self.status, self.body
        )
    }
}

impl std::error::Error for ProviderHttpError {}
