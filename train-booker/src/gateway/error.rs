//! Gateway error types.

/// Errors from the booking-provider HTTP gateway.
///
/// The gateway never retries on its own; retry policy lives entirely in
/// the reservation orchestrator, and only a `NeedsRetry` outcome (not an
/// error) triggers it.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport failure (connection refused, timeout, DNS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status.
    #[error("provider error {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider's response could not be decoded.
    #[error("malformed response: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// The request was rejected locally, before contacting the network.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Message suitable for showing to the user.
    ///
    /// Provider-supplied messages are surfaced verbatim; transport and
    /// decoding failures collapse to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Api { message, .. } if !message.is_empty() => message.clone(),
            GatewayError::Api { status, .. } => {
                format!("the booking provider returned an error (HTTP {status})")
            }
            GatewayError::Http(_) => "the booking provider could not be reached".to_string(),
            GatewayError::Json { .. } => {
                "the booking provider returned an unreadable response".to_string()
            }
            GatewayError::InvalidRequest(msg) => msg.clone(),
        }
    }
}
