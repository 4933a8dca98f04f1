use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt::Write;
use thiserror::Error;

/// Formats an error and its entire source chain with each error on a new line
///
/// This produces output like:
/// ```text
/// Error message
///   Caused by: First cause
///   Caused by: Root cause
/// ```
pub fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut output = String::new();
    write!(&mut output, "{}", err).ok();

    let mut source = err.source();
    while let Some(err) = source {
        write!(&mut output, "\n  Caused by: {}", err).ok();
        source = err.source();
    }

    output
}

/// Formats an anyhow::Error with its full chain
pub fn format_anyhow_chain(err: &anyhow::Error) -> String {
    let mut output = String::new();

    let chain: Vec<_> = err.chain().collect();

    if let Some((first, rest)) = chain.split_first() {
        write!(&mut output, "{}", first).ok();
        for cause in rest {
            write!(&mut output, "\n  Caused by: {}", cause).ok();
        }
    }

    output
}

/// Central application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client errors talking to Cloud Build or the metadata server
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloud Build answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Access token error: {0}")]
    Token(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        log::error!("HTTP error response: {}", self);

        let status_code = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status_code.as_u16(),
        });

        HttpResponse::build(status_code)
            .content_type("application/json")
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,

            AppError::Http(_) | AppError::Upstream { .. } | AppError::Token(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}
