use thiserror::Error;

/// Failures talking to the Hacker News API.
///
/// Category-level failures abort the whole listing (the view stays empty and
/// the error is logged); item-level failures are isolated to the one item.
#[derive(Debug, Error)]
pub enum HnError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}
