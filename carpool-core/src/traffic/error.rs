use thiserror::Error;

/// Errors from a single [`TrafficProvider::fetch_traffic`](super::TrafficProvider::fetch_traffic)
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrafficError {
    /// The geographic key was empty.
    #[error("a traffic area key is required")]
    EmptyKey,
    /// The request did not complete within the configured timeout.
    #[error("traffic request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL or area key.
        url: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },
    /// The upstream service answered with a non-success status.
    #[error("traffic service at {url} returned HTTP {status}: {message}")]
    HttpError {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// Request URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse traffic response: {message}")]
    ParseError {
        /// Decoder message.
        message: String,
    },
}
