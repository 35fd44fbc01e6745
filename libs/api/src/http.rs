//! HTTP binding for the control-plane API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ControlPlane;
use crate::error::{ApiError, ErrorCode};
use crate::types::{
    ApplicationDetail, CreateApplicationRequest, CreateApplicationResponse, InputSpec, LogSinkSpec,
    OutputSpec, ReferenceDataSourceSpec, UpdateApplicationRequest,
};

/// Control-plane client speaking the v1 HTTP API.
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
}

/// Structured error body returned by the control plane.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct AddSubResourceBody<'a, T: Serialize> {
    current_version: u64,
    #[serde(flatten)]
    item: &'a T,
}

#[derive(Debug, Serialize)]
struct UpdateTagsBody<'a> {
    resource: &'a str,
    remove: &'a [String],
    upsert: &'a BTreeMap<String, String>,
}

impl HttpControlPlane {
    /// Create a new client for the control plane at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Control plane call");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error_from(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::transport(format!("decoding response: {e}")))
    }

    async fn send_no_content<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Control plane call");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error_from(status, response).await);
        }
        Ok(())
    }
}

async fn api_error_from(status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        return ApiError::new(parsed.code, parsed.message);
    }

    let code = match status.as_u16() {
        404 => ErrorCode::NotFound,
        409 => ErrorCode::Conflict,
        400 => ErrorCode::InvalidArgument,
        422 => ErrorCode::Validation,
        _ => ErrorCode::Internal,
    };
    ApiError::new(code, format!("{status}: {body}"))
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<CreateApplicationResponse, ApiError> {
        self.send_json(reqwest::Method::POST, "/v1/applications", Some(request))
            .await
    }

    async fn describe_application(&self, name: &str) -> Result<ApplicationDetail, ApiError> {
        self.send_json::<(), _>(
            reqwest::Method::GET,
            &format!("/v1/applications/{name}"),
            None,
        )
        .await
    }

    async fn update_application(
        &self,
        name: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            reqwest::Method::POST,
            &format!("/v1/applications/{name}/update"),
            Some(request),
        )
        .await
    }

    async fn add_log_sink(
        &self,
        name: &str,
        current_version: u64,
        sink: &LogSinkSpec,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            reqwest::Method::POST,
            &format!("/v1/applications/{name}/log-sinks"),
            Some(&AddSubResourceBody {
                current_version,
                item: sink,
            }),
        )
        .await
    }

    async fn add_input(
        &self,
        name: &str,
        current_version: u64,
        input: &InputSpec,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            reqwest::Method::POST,
            &format!("/v1/applications/{name}/inputs"),
            Some(&AddSubResourceBody {
                current_version,
                item: input,
            }),
        )
        .await
    }

    async fn add_output(
        &self,
        name: &str,
        current_version: u64,
        output: &OutputSpec,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            reqwest::Method::POST,
            &format!("/v1/applications/{name}/outputs"),
            Some(&AddSubResourceBody {
                current_version,
                item: output,
            }),
        )
        .await
    }

    async fn add_reference_data_source(
        &self,
        name: &str,
        current_version: u64,
        source: &ReferenceDataSourceSpec,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            reqwest::Method::POST,
            &format!("/v1/applications/{name}/reference-data-sources"),
            Some(&AddSubResourceBody {
                current_version,
                item: source,
            }),
        )
        .await
    }

    async fn delete_application(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let ts = created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.send_no_content::<()>(
            reqwest::Method::DELETE,
            &format!("/v1/applications/{name}?created_at={ts}"),
            None,
        )
        .await
    }

    async fn list_tags(&self, arn: &str) -> Result<BTreeMap<String, String>, ApiError> {
        self.send_json::<(), _>(reqwest::Method::GET, &format!("/v1/tags?resource={arn}"), None)
            .await
    }

    async fn update_tags(
        &self,
        arn: &str,
        remove: &[String],
        upsert: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            reqwest::Method::POST,
            "/v1/tags",
            Some(&UpdateTagsBody {
                resource: arn,
                remove,
                upsert,
            }),
        )
        .await
    }
}
