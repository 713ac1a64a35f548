pub mod error;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::internal::models::{
    AnalysisResult, HealthStatus, HistoryEntry, MonumentSummary, RawAnalysisResult, SelectedImage,
};
pub use error::{ApiError, Result};

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// HTTP client for the ChronoScope backend.
///
/// Wraps an async `reqwest::Client` and the configured origin. Every method
/// maps failures into [`ApiError`] so callers can log the precise cause while
/// showing a generic message.
#[derive(Clone, Debug)]
pub struct ApiService {
    client: Client,
    base_url: Url,
}

impl ApiService {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ApiError::Client)?;

        tracing::info!(base_url = %base_url, "API service configured");
        Ok(Self { client, base_url })
    }

    /// Client with default settings against `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` with `segments` appended to its path.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn api_endpoint(&self, segments: &[&str]) -> Url {
        let all: Vec<&str> = API_PREFIX.iter().chain(segments).copied().collect();
        self.endpoint(&all)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        let resp = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp)
    }

    async fn read_json<T>(resp: Response, url: &Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = resp.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self.send(self.client.get(url.clone()), &url).await?;
        Self::read_json(resp, &url).await
    }

    /// Upload an image for identification (`POST /api/v1/identify`).
    #[tracing::instrument(skip(self, image), fields(filename = %image.filename, bytes = image.size))]
    pub async fn identify(&self, image: &SelectedImage) -> Result<AnalysisResult> {
        let url = self.api_endpoint(&["identify"]);

        let part = Part::bytes(image.data.clone())
            .file_name(image.filename.clone())
            .mime_str(image.mime_type)
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;
        let form = Form::new().part("image", part);

        let resp = self
            .send(self.client.post(url.clone()).multipart(form), &url)
            .await?;
        let raw: RawAnalysisResult = Self::read_json(resp, &url).await?;
        let result = AnalysisResult::try_from(raw).map_err(|reason| ApiError::Malformed {
            url: url.to_string(),
            reason,
        })?;

        tracing::info!(landmark = %result.landmark, confidence = result.confidence, "Image identified");
        Ok(result)
    }

    /// Curated monuments (`GET /api/v1/explore`).
    pub async fn fetch_monuments(&self) -> Result<Vec<MonumentSummary>> {
        let monuments: Vec<MonumentSummary> = self.get_json(self.api_endpoint(&["explore"])).await?;
        tracing::debug!(count = monuments.len(), "Monuments fetched");
        Ok(monuments)
    }

    /// Past predictions (`GET /api/v1/history`).
    pub async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let entries: Vec<HistoryEntry> = self.get_json(self.api_endpoint(&["history"])).await?;
        tracing::debug!(count = entries.len(), "History fetched");
        Ok(entries)
    }

    /// Delete one prediction (`DELETE /api/v1/history/{id}`). Any 2xx is success.
    pub async fn delete_history_entry(&self, id: &str) -> Result<()> {
        let url = self.api_endpoint(&["history", id]);
        self.send(self.client.delete(url.clone()), &url).await?;
        tracing::info!(id, "History entry deleted");
        Ok(())
    }

    /// Backend liveness probe (`GET /health`).
    pub async fn check_health(&self) -> Result<HealthStatus> {
        self.get_json(self.endpoint(&["health"])).await
    }

    /// Resolve an absolute or backend-relative resource locator.
    pub fn resolve_resource_url(&self, raw: &str) -> Option<Url> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(_) => self.base_url.join(raw).ok(),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(invalid("scheme must be http or https")),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base"));
    }
    Ok(url)
}
