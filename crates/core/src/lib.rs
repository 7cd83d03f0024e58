//! Core library for the BirdNET dashboard client.
//!
//! The crate talks to a BirdNET-Pi appliance over its JSON API, prepares the
//! fetched detections for charting, and plays stored clips through a
//! single-slot [`PlaybackController`] that guarantees only one clip is ever
//! playing.

pub mod api;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod media;
pub mod playback;
pub mod render;
pub mod routes;

pub use api::{ApiClient, Detection, DetectionQuery, HourlyCount, Overview, SpeciesSummary};
pub use charts::{CategoryValue, GridOverlay, MatrixCell, RowStats, SpeciesActivity, PALETTE};
pub use config::{ApiConfig, AppConfig, DashboardConfig, PlayerBackend, PlayerConfig};
pub use dashboard::{BirdDataSource, ChartsData, DashboardData, DashboardFetcher, Panel};
pub use error::{DashError, Result};
pub use media::MediaUrls;
pub use playback::{
    provider_from_config, ExternalPlayer, PlaybackController, PlaybackResource, PlaybackStatus,
    ResourceProvider, SinkPlayer,
};
pub use render::ChartRenderer;
pub use routes::View;
