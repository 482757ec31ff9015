use crate::{gate::Clock, APP_USER_AGENT};
use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "https://p8m2dfvub9.us-east-2.awsapprunner.com";

pub const AVAILABLE_ENDPOINTS: [&str; 6] = [
    "GET /health",
    "GET /api/metrics",
    "POST /api/universes/create",
    "GET /api/universes/:id",
    "POST /api/universes/:id/operations",
    "GET /api/benchmarks",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: u16,
}

impl ApiResponse {
    fn ok(data: Value, status: u16) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status,
        }
    }

    fn failed(error: String, status: u16) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            status,
        }
    }

    fn into_data(self) -> Option<Value> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// Snapshot of the three dashboard feeds. A feed that failed is `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub metrics: Option<Value>,
    pub benchmarks: Option<Value>,
    pub health: Option<Value>,
    pub last_updated: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoSession {
    pub stats: LiveStats,
    pub universe: Option<Value>,
    pub session_id: String,
    pub initialized: bool,
}

/// Error text for a non-2xx response: `error`, then `message`, then the status.
fn error_message(status: u16, body: &Value) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            body.get("message")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map_or_else(|| format!("HTTP {status}"), ToString::to_string)
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Url,
    http: Client,
    clock: Arc<dyn Clock>,
}

impl BackendClient {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Error parsing URL: unsupported scheme {}",
                base_url.scheme()
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url,
            http,
            clock,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join an endpoint path onto the base URL, keeping any base path prefix.
    ///
    /// # Errors
    /// Returns an error if the result is not a valid URL.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{endpoint}"))?)
    }

    /// Send a request and fold every failure into an [`ApiResponse`].
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> ApiResponse {
        match self.try_request(method, endpoint, body).await {
            Ok(response) => response,
            Err(e) => {
                error!("API Error [{endpoint}]: {e}");
                ApiResponse::failed(e.to_string(), 500)
            }
        }
    }

    async fn try_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint)?;

        let mut request = self.http.request(method, url.as_str());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let data: Value = response.json().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &data);
            error!("API Error [{endpoint}]: {message}");
            return Ok(ApiResponse::failed(message, status.as_u16()));
        }

        debug!("{url} - {status}");

        Ok(ApiResponse::ok(data, status.as_u16()))
    }

    pub async fn health(&self) -> ApiResponse {
        self.request(Method::GET, "/health", None).await
    }

    pub async fn metrics(&self) -> ApiResponse {
        self.request(Method::GET, "/api/metrics", None).await
    }

    pub async fn benchmarks(&self) -> ApiResponse {
        self.request(Method::GET, "/api/benchmarks", None).await
    }

    pub async fn create_universe(&self, config: Value) -> ApiResponse {
        self.request(Method::POST, "/api/universes/create", Some(config))
            .await
    }

    pub async fn universe(&self, universe_id: &str) -> ApiResponse {
        self.request(Method::GET, &format!("/api/universes/{universe_id}"), None)
            .await
    }

    pub async fn universe_operations(&self, universe_id: &str, operations: Value) -> ApiResponse {
        self.request(
            Method::POST,
            &format!("/api/universes/{universe_id}/operations"),
            Some(operations),
        )
        .await
    }

    /// Fetch metrics, benchmarks and health concurrently.
    pub async fn live_stats(&self) -> LiveStats {
        let (metrics, benchmarks, health) =
            tokio::join!(self.metrics(), self.benchmarks(), self.health());

        LiveStats {
            metrics: metrics.into_data(),
            benchmarks: benchmarks.into_data(),
            health: health.into_data(),
            last_updated: self.clock.now_ms(),
        }
    }

    /// Take a stats snapshot and create a universe for this demo session.
    pub async fn initialize_demo_session(&self, access_code: &str) -> DemoSession {
        let stats = self.live_stats().await;
        let now = self.clock.now_ms();

        let prefix: String = access_code.chars().take(4).collect();
        let universe = self
            .create_universe(json!({
                "name": format!("Demo Universe - {prefix}"),
                "description": "Interactive demo session universe",
                "accessCode": access_code,
                "createdAt": now,
            }))
            .await
            .into_data();

        DemoSession {
            stats,
            universe,
            session_id: format!("demo_{access_code}_{now}"),
            initialized: true,
        }
    }
}
