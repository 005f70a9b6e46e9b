use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::generator::{GenerationError, GenerationRequest, Generator};
use crate::retry::{parse_retry_after, RetryHeadersConfig};

#[derive(Debug)]
pub struct HttpGeneratorConfig {
    /// Used when a workflow has no `endpoint`; the request goes to
    /// `{base_url}/workflows/{workflow_id}/generate`.
    pub base_url: Option<Url>,
    pub api_token: Option<SecretString>,
    /// Statuses treated as transient in addition to 5xx.
    pub retry_statuses: BTreeSet<u16>,
    pub headers: RetryHeadersConfig,
    pub max_response_bytes: usize,
}

impl Default for HttpGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            retry_statuses: [408u16, 429].into_iter().collect(),
            headers: RetryHeadersConfig::default(),
            max_response_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Calls a generation service over HTTP. The caller bounds the whole call
/// with the execution's timeout, so no per-request timeout is set here.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: HttpGeneratorConfig,
}

impl HttpGenerator {
    pub fn new(config: HttpGeneratorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("masstock-exec/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint_for(&self, request: &GenerationRequest) -> Result<Url, GenerationError> {
        if let Some(endpoint) = &request.workflow.endpoint {
            return Url::parse(endpoint)
                .map_err(|e| GenerationError::permanent(format!("invalid endpoint: {e}")));
        }
        let base = self.config.base_url.as_ref().ok_or_else(|| {
            GenerationError::permanent(format!(
                "workflow {} has no endpoint and no default generator URL is configured",
                request.workflow.id
            ))
        })?;
        let path = format!(
            "workflows/{}/generate",
            urlencoding::encode(&request.workflow.id)
        );
        base.join(&path)
            .map_err(|e| GenerationError::permanent(format!("invalid endpoint: {e}")))
    }

    fn is_transient_status(&self, status: u16) -> bool {
        status >= 500 || self.config.retry_statuses.contains(&status)
    }
}

fn request_body(request: &GenerationRequest) -> JsonValue {
    let wf = &request.workflow;
    json!({
        "execution_id": request.execution_id,
        "attempt": request.attempt,
        "workflow_id": wf.id,
        "model": wf.model,
        "style": wf.style,
        "parameters": wf.parameters,
        "input_data": request.input_data,
    })
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<JsonValue, GenerationError> {
        let url = self.endpoint_for(request)?;
        let mut rb = self.client.post(url).json(&request_body(request));
        if let Some(token) = &self.config.api_token {
            rb = rb.bearer_auth(token.expose_secret());
        }

        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let retry_after = parse_retry_after(resp.headers(), &self.config.headers, SystemTime::now());

        let body = resp.bytes().await.map_err(map_reqwest_error)?;
        if body.len() > self.config.max_response_bytes {
            return Err(GenerationError::permanent(format!(
                "response too large (>{} bytes)",
                self.config.max_response_bytes
            )));
        }

        if (200..300).contains(&status) {
            if body.is_empty() {
                return Err(GenerationError::permanent("generator returned an empty body"));
            }
            return serde_json::from_slice(&body).map_err(|e| {
                GenerationError::permanent(format!("response is not valid JSON: {e}"))
            });
        }

        let message = format!("generator responded {status}: {}", snippet(&body));
        if self.is_transient_status(status) {
            Err(GenerationError::Transient {
                message,
                retry_after,
            })
        } else {
            Err(GenerationError::Permanent { message })
        }
    }
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text.to_string()
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        return GenerationError::Timeout(Duration::ZERO);
    }
    if e.is_connect() || e.is_request() || e.is_body() {
        return GenerationError::transient(e.to_string());
    }
    GenerationError::permanent(e.to_string())
}
