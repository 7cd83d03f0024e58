use url::Url;

use crate::Result;

/// Builds links to the static clip files served next to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrls {
    origin: Url,
}

impl MediaUrls {
    /// Derives the media origin from the API base URL by dropping a trailing
    /// `api` path segment (`http://pi:7007/api` -> `http://pi:7007`).
    pub fn from_api_base(base_url: &str) -> Result<Self> {
        let mut origin = Url::parse(base_url)?;
        let mut segments: Vec<String> = origin
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if segments.last().map(String::as_str) == Some("api") {
            segments.pop();
        }

        origin.set_query(None);
        origin.set_fragment(None);
        origin.set_path(&segments.join("/"));
        Ok(Self { origin })
    }

    /// `<origin>/audio/<filename>` with the filename encoded as a single
    /// path segment, slashes included.
    pub fn audio_url(&self, filename: &str) -> Option<String> {
        if filename.is_empty() {
            return None;
        }

        let mut url = self.origin.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("audio")
            .push(filename);
        Some(url.to_string())
    }
}
