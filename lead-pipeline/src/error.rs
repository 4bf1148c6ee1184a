use std::time;

use http::StatusCode;
use lead_common::locale::Locale;
use thiserror::Error;

/// Enumeration of errors that can end a webhook submission. None of them are retried.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("webhook did not respond within {0:?}")]
    Timeout(time::Duration),
    #[error("webhook responded with status {status}")]
    HttpStatus {
        status: StatusCode,
        response: Option<String>,
    },
    #[error("webhook request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to serialize lead record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SubmitError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::Timeout(_) => "timeout",
            SubmitError::HttpStatus { .. } => "http_status",
            SubmitError::Network(_) => "network",
            SubmitError::Serialize(_) => "serialize",
        }
    }

    /// The message shown to the visitor in the blocking notification.
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            SubmitError::Timeout(_) => locale.timeout_message().to_owned(),
            SubmitError::HttpStatus { status, .. } => locale.http_status_message(status.as_u16()),
            SubmitError::Network(_) | SubmitError::Serialize(_) => {
                locale.generic_submit_message().to_owned()
            }
        }
    }
}

/// Errors from the page-load geolocation lookup. Never surfaced to the visitor.
#[derive(Error, Debug)]
pub enum LocationLookupError {
    #[error("location lookup did not respond within {0:?}")]
    Timeout(time::Duration),
    #[error("location lookup failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Errors from delivering an analytics event to a sink. Never surfaced to the visitor.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("analytics sink {0} is closed")]
    SinkClosed(&'static str),
    #[error("analytics sink {sink} rejected event: {reason}")]
    Rejected { sink: &'static str, reason: String },
}
