//! Fetches everything a dashboard view shows in one go.
//!
//! Requests are issued concurrently and each endpoint is isolated: a failing
//! endpoint yields an empty [`Panel`] carrying an error message while the
//! others still populate.

use async_trait::async_trait;
use serde::Serialize;

use crate::api::{ApiClient, Detection, DetectionQuery, HourlyCount, Overview};
use crate::charts::{hourly_activity, SpeciesActivity};
use crate::config::DashboardConfig;
use crate::Result;

pub const HOURLY_ERROR: &str = "Failed to fetch hourly activity data.";
pub const DETAILED_ERROR: &str = "Failed to fetch detailed activity data.";
pub const LATEST_ERROR: &str = "Failed to fetch latest observation.";
pub const RECENT_ERROR: &str = "Failed to fetch recent observations.";
pub const SUMMARY_ERROR: &str = "Failed to fetch summary.";

/// The endpoints the dashboard reads from.
#[async_trait]
pub trait BirdDataSource: Send + Sync {
    async fn hourly(&self, date: &str) -> Result<Vec<HourlyCount>>;
    async fn detections(&self, query: &DetectionQuery) -> Result<Vec<Detection>>;
    async fn recent(&self, limit: Option<u32>) -> Result<Vec<Detection>>;
    async fn overview(&self) -> Result<Overview>;
    async fn thumbnail(&self, species: &str) -> Result<Option<String>>;
}

#[async_trait]
impl BirdDataSource for ApiClient {
    async fn hourly(&self, date: &str) -> Result<Vec<HourlyCount>> {
        ApiClient::hourly(self, date).await
    }

    async fn detections(&self, query: &DetectionQuery) -> Result<Vec<Detection>> {
        ApiClient::detections(self, query).await
    }

    async fn recent(&self, limit: Option<u32>) -> Result<Vec<Detection>> {
        ApiClient::recent(self, limit).await
    }

    async fn overview(&self) -> Result<Overview> {
        ApiClient::overview(self).await
    }

    async fn thumbnail(&self, species: &str) -> Result<Option<String>> {
        ApiClient::thumbnail(self, species).await
    }
}

/// Data for one dashboard widget together with the reason it is empty, if
/// its request failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Panel<T> {
    pub data: T,
    pub error: Option<String>,
}

impl<T: Default> Panel<T> {
    fn from_result(result: Result<T>, message: &str) -> Self {
        match result {
            Ok(data) => Self { data, error: None },
            Err(err) => {
                tracing::warn!(error = %err, "{}", message);
                Self {
                    data: T::default(),
                    error: Some(message.to_string()),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartsData {
    pub date: String,
    pub hourly: Panel<Vec<HourlyCount>>,
    pub detailed: Panel<Vec<SpeciesActivity>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardData {
    pub charts: ChartsData,
    pub latest: Panel<Option<Detection>>,
    pub recent: Panel<Vec<Detection>>,
    pub summary: Panel<Overview>,
    pub image_url: String,
}

#[derive(Debug)]
pub struct DashboardFetcher<S> {
    source: S,
    config: DashboardConfig,
}

impl<S: BirdDataSource> DashboardFetcher<S> {
    pub fn new(source: S, config: DashboardConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_charts(&self, date: &str) -> ChartsData {
        tracing::info!(date, "fetching charts data");

        let query = DetectionQuery::for_date(date, self.config.detections_limit);
        let (hourly, detections) =
            tokio::join!(self.source.hourly(date), self.source.detections(&query));

        ChartsData {
            date: date.to_string(),
            hourly: Panel::from_result(hourly, HOURLY_ERROR),
            detailed: Panel::from_result(
                detections.map(|rows| hourly_activity(&rows)),
                DETAILED_ERROR,
            ),
        }
    }

    /// Fetches charts for `today` plus the observation and summary panels,
    /// then resolves an image for the latest observation.
    pub async fn fetch_dashboard(&self, today: &str) -> DashboardData {
        tracing::info!("fetching dashboard data");

        let (charts, latest, recent, summary) = tokio::join!(
            self.fetch_charts(today),
            self.source.recent(Some(1)),
            self.source.recent(None),
            self.source.overview(),
        );

        let latest = Panel::from_result(
            latest.map(|rows| rows.into_iter().next()),
            LATEST_ERROR,
        );
        let image_url = match &latest.data {
            Some(detection) => self.image_for(detection).await,
            None => self.config.default_image.clone(),
        };

        DashboardData {
            charts,
            latest,
            recent: Panel::from_result(recent, RECENT_ERROR),
            summary: Panel::from_result(summary, SUMMARY_ERROR),
            image_url,
        }
    }

    async fn image_for(&self, detection: &Detection) -> String {
        let species = detection.species();
        match self.source.thumbnail(species).await {
            Ok(Some(url)) => url,
            Ok(None) => self.config.default_image.clone(),
            Err(err) => {
                tracing::warn!(species, error = %err, "failed to fetch species image");
                self.config.default_image.clone()
            }
        }
    }
}
