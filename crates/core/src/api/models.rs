use serde::{Deserialize, Serialize};

/// One row of the detections table as served by `/recent` and `/detections`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection {
    pub id: i64,
    pub date: String,
    /// `HH:MM:SS` local time of the detection.
    pub time: String,
    pub common_name: String,
    pub scientific_name: String,
    pub confidence: f64,
    pub file_path: String,
    pub audio_path: String,
}

impl Detection {
    /// Display name, falling back to the scientific name when the common
    /// name is blank.
    pub fn species(&self) -> &str {
        if self.common_name.is_empty() {
            &self.scientific_name
        } else {
            &self.common_name
        }
    }

    /// Stable playback key for this detection.
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyCount {
    /// Two-digit hour, `"00"`..`"23"`.
    pub hour: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub total_detections: u64,
    pub unique_species: u64,
    pub today_count: u64,
    pub week_count: u64,
    pub top_species: Vec<SpeciesCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesCount {
    pub common_name: String,
    pub scientific_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesSummary {
    pub common_name: String,
    pub scientific_name: String,
    pub count: u64,
    pub max_confidence: f64,
    pub last_seen: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupStatus {
    pub complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub status: String,
}

/// Filters accepted by `/detections`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionQuery {
    pub date: Option<String>,
    pub species: Option<String>,
    pub limit: Option<u32>,
}

impl DetectionQuery {
    pub fn for_date(date: impl Into<String>, limit: u32) -> Self {
        Self {
            date: Some(date.into()),
            species: None,
            limit: Some(limit),
        }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(date) = &self.date {
            params.push(("date", date.clone()));
        }
        if let Some(species) = &self.species {
            params.push(("species", species.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Subset of the MediaWiki `prop=pageimages` response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PageImagesResponse {
    pub query: Option<PageImagesQuery>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PageImagesQuery {
    pub pages: serde_json::Map<String, serde_json::Value>,
}

impl PageImagesResponse {
    /// Thumbnail of the first page in the response, if it has one.
    pub fn first_thumbnail(&self) -> Option<String> {
        let page = self.query.as_ref()?.pages.values().next()?;
        page.get("thumbnail")?
            .get("source")?
            .as_str()
            .map(str::to_string)
    }
}
