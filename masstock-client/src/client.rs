use std::time::{Duration, SystemTime};

use masstock_core::wire::{ErrorBody, ExecuteRequest, ExecuteResponse, ExecutionList, ExecutionView};
use masstock_core::ExecutionStatus;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::error::{map_reqwest_error, parse_retry_after, ClientError};

pub const CLIENT_ID_HEADER: &str = "x-client-id";

#[derive(Debug)]
pub struct ApiClientConfig {
    pub base_url: Url,
    pub client_id: String,
    pub token: Option<SecretString>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ApiClientConfig {
    pub fn new(base_url: Url, client_id: impl Into<String>) -> Self {
        Self {
            base_url,
            client_id: client_id.into(),
            token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: Option<ExecutionStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Typed client for the execution endpoints, scoped to one client id.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiClientConfig,
}

impl ApiClient {
    pub fn new(mut config: ApiClientConfig) -> Result<Self, ClientError> {
        // `Url::join` replaces the last segment unless the path ends in `/`.
        if !config.base_url.path().ends_with('/') {
            let path = format!("{}/", config.base_url.path());
            config.base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("masstock-client/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub async fn execute(
        &self,
        workflow_id: &str,
        request: &ExecuteRequest,
    ) -> Result<ExecuteResponse, ClientError> {
        let url = self.url(&format!(
            "api/workflows/{}/execute",
            urlencoding::encode(workflow_id)
        ))?;
        self.send(self.http.post(url).json(request)).await
    }

    pub async fn get_execution(&self, execution_id: Uuid) -> Result<ExecutionView, ClientError> {
        let url = self.url(&format!("api/executions/{execution_id}"))?;
        self.send(self.http.get(url)).await
    }

    pub async fn cancel_execution(&self, execution_id: Uuid) -> Result<ExecutionView, ClientError> {
        let url = self.url(&format!("api/executions/{execution_id}/cancel"))?;
        self.send(self.http.post(url)).await
    }

    pub async fn list_executions(
        &self,
        workflow_id: &str,
        query: &ListQuery,
    ) -> Result<ExecutionList, ClientError> {
        let mut url = self.url(&format!(
            "api/workflows/{}/executions",
            urlencoding::encode(workflow_id)
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(status) = query.status {
                pairs.append_pair("status", status.as_str());
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        self.send(self.http.get(url)).await
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, rb: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let mut rb = rb.header(CLIENT_ID_HEADER, &self.config.client_id);
        if let Some(token) = &self.config.token {
            rb = rb.bearer_auth(token.expose_secret());
        }

        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.map_err(map_reqwest_error);
        }

        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, SystemTime::now()));
        let body = resp.bytes().await.map_err(map_reqwest_error)?;
        let (code, message, violations) = match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(e) => (e.code, e.error, e.violations),
            Err(_) => (
                "UNKNOWN".to_string(),
                String::from_utf8_lossy(&body).trim().to_string(),
                Vec::new(),
            ),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
            violations,
            retry_after,
        })
    }
}
