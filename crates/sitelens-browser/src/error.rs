use thiserror::Error;

/// Errors from the browser automation layer.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("chromium error: {0}")]
    Chromium(String),
}

pub type Result<T> = std::result::Result<T, BrowserError>;
