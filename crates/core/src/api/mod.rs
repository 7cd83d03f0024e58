//! HTTP client for the detection appliance's JSON API.

mod models;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{config::ApiConfig, Result};

pub use models::{
    Detection, DetectionQuery, Health, HourlyCount, Overview, SetupStatus, SpeciesCount,
    SpeciesSummary,
};

use models::PageImagesResponse;

const USER_AGENT: &str = concat!("birdnet-dash/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    image_lookup_url: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            image_lookup_url: Url::parse(&config.image_lookup_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client, shared with clip downloads.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolves `path` beneath the base URL, keeping any path prefix such as
    /// `/api`.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        if !url.path().ends_with('/') {
            let with_slash = format!("{}/", url.path());
            url.set_path(&with_slash);
        }
        Ok(url.join(path.trim_start_matches('/'))?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<Health> {
        self.get_json("health", &[]).await
    }

    /// Most recent detections, newest first. The backend defaults to ten rows
    /// when `limit` is omitted.
    pub async fn recent(&self, limit: Option<u32>) -> Result<Vec<Detection>> {
        let query: Vec<_> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        self.get_json("recent", &query).await
    }

    pub async fn hourly(&self, date: &str) -> Result<Vec<HourlyCount>> {
        self.get_json("hourly", &[("date", date.to_string())]).await
    }

    pub async fn detections(&self, query: &DetectionQuery) -> Result<Vec<Detection>> {
        self.get_json("detections", &query.params()).await
    }

    pub async fn overview(&self) -> Result<Overview> {
        self.get_json("overview", &[]).await
    }

    pub async fn species(&self) -> Result<Vec<SpeciesSummary>> {
        self.get_json("species", &[]).await
    }

    pub async fn setup_complete(&self) -> Result<SetupStatus> {
        self.get_json("setup-complete", &[]).await
    }

    /// Looks up a thumbnail for `species` through the MediaWiki page images
    /// API. `Ok(None)` means the page exists but has no image.
    pub async fn thumbnail(&self, species: &str) -> Result<Option<String>> {
        let query = [
            ("action", "query"),
            ("prop", "pageimages"),
            ("format", "json"),
            ("piprop", "thumbnail"),
            ("pithumbsize", "400"),
            ("titles", species),
            ("origin", "*"),
        ];
        tracing::debug!(species, url = %self.image_lookup_url, "looking up species image");

        let response: PageImagesResponse = self
            .http
            .get(self.image_lookup_url.clone())
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.first_thumbnail())
    }
}
