//! Transport client for the blog API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and a shared `Transport`, and carries
//! no mutable state between calls. A GET is split into `build_get`, which
//! produces an `HttpRequest`, and `parse_json`, which consumes an
//! `HttpResponse`. `get` runs both halves around the transport and is the
//! single primitive the service layer uses. It never panics and never lets a
//! transport error escape as anything other than an `ApiError`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Client over a real HTTP transport configured from `config`.
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(&config.base_url, Arc::new(transport)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_get(&self, path: &str, params: &[(&str, String)]) -> HttpRequest {
        let path = path.trim_start_matches('/');
        HttpRequest {
            url: format!("{}/{path}", self.base_url),
            query: params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("accept".to_string(), "application/json".to_string()),
            ],
        }
    }

    pub fn parse_json<T: DeserializeOwned>(&self, response: HttpResponse) -> ApiResult<T> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| {
            warn!(
                status = response.status,
                content_type = response.header("content-type").unwrap_or("-"),
                error = %e,
                "response body is not the expected JSON"
            );
            ApiError::decode(&e)
        })
    }

    /// GET `path` with `params` and decode the JSON body as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        let request = self.build_get(path, params);
        let url = request.full_url();
        debug!(%url, "GET");

        let result = match self.transport.execute(request).await {
            Ok(response) => {
                debug!(%url, status = response.status, "response");
                self.parse_json(response)
            }
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            warn!(%url, kind = %err.kind(), status = ?err.status, error = %err, "request failed");
        }
        result
    }
}

/// Map non-2xx responses to an `ApiError` carrying the status.
fn check_status(response: &HttpResponse) -> ApiResult<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::http(response.status, &response.body))
}
