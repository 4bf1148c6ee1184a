use std::time;

use async_trait::async_trait;
use lead_common::record::LeadRecord;
use reqwest::header;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::SubmitError;

/// How much of an error response body we keep around for diagnostics.
const MAX_RESPONSE_BODY: usize = 4 * 1024;

/// Destination for normalized leads. The pipeline only ever makes one attempt per submit.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Deliver `record`, returning the receiver's acknowledgment. Callers must not depend on
    /// the acknowledgment's shape.
    async fn submit(&self, record: &LeadRecord) -> Result<Value, SubmitError>;
}

/// Posts leads as JSON to a fixed webhook endpoint.
pub struct WebhookDispatcher {
    /// The endpoint every lead is posted to.
    url: String,
    /// The client used for HTTP requests.
    client: reqwest::Client,
    /// Hard bound on the whole exchange, request and response body included.
    timeout: time::Duration,
}

impl WebhookDispatcher {
    pub fn new(url: &str, timeout: time::Duration) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            url: url.to_owned(),
            client,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(&config.webhook_url, config.webhook_timeout.0)
    }
}

#[async_trait]
impl LeadSink for WebhookDispatcher {
    async fn submit(&self, record: &LeadRecord) -> Result<Value, SubmitError> {
        let body = serde_json::to_string(record)?;
        let labels = [("funnel", record.funnel_id.to_string())];

        metrics::counter!("lead_submissions_total", &labels).increment(1);
        let now = tokio::time::Instant::now();

        // Dropping the in-flight future on timeout aborts the request.
        let result = match tokio::time::timeout(
            self.timeout,
            send_lead(&self.client, &self.url, body),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SubmitError::Timeout(self.timeout)),
        };

        let elapsed = now.elapsed().as_secs_f64();
        metrics::histogram!("lead_webhook_duration_seconds", &labels).record(elapsed);

        match &result {
            Ok(_) => {
                metrics::counter!("lead_submissions_completed", &labels).increment(1);
                info!(funnel_id = record.funnel_id, elapsed, "lead delivered to webhook");
            }
            Err(error) => {
                let failed_labels = [
                    ("funnel", record.funnel_id.to_string()),
                    ("reason", error.kind().to_owned()),
                ];
                metrics::counter!("lead_submissions_failed", &failed_labels).increment(1);
            }
        }

        result
    }
}

/// POST one JSON body and interpret the response.
///
/// Any 2xx is a success; the body is parsed as JSON when possible and acknowledged as
/// `Value::Null` otherwise, since the lead has already been accepted at that point.
async fn send_lead(
    client: &reqwest::Client,
    url: &str,
    body: String,
) -> Result<Value, SubmitError> {
    let response = client.post(url).body(body).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(SubmitError::HttpStatus {
            status,
            response: first_n_bytes_of_response(response, MAX_RESPONSE_BODY)
                .await
                .ok(),
        });
    }

    let bytes = response.bytes().await?;

    match serde_json::from_slice(&bytes) {
        Ok(ack) => Ok(ack),
        Err(error) => {
            debug!("webhook acknowledged with a non-JSON body: {}", error);
            Ok(Value::Null)
        }
    }
}

/// Read at most `n` bytes of a response body, lossily decoded as UTF-8.
async fn first_n_bytes_of_response(
    mut response: reqwest::Response,
    n: usize,
) -> Result<String, reqwest::Error> {
    let mut body = Vec::with_capacity(n.min(1024));

    while let Some(chunk) = response.chunk().await? {
        let remaining = n - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
