use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const SEARCH_URL: &str = "https://itunes.apple.com/search";

pub trait ArtworkLookup {
    /// Cover art URL for a track, or `None` when nothing matched.
    fn artwork_url(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    result_count: usize,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    artwork_url100: Option<String>,
}

/// Looks up album art through the public iTunes Search API.
pub struct ITunesSearch {
    agent: ureq::Agent,
    size: u32,
}

impl ITunesSearch {
    pub fn new(size: u32, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent, size }
    }
}

impl ArtworkLookup for ITunesSearch {
    fn artwork_url(&self, title: &str, artist: &str) -> Result<Option<String>> {
        let term = format!("{title} {artist}");
        let body = self
            .agent
            .get(SEARCH_URL)
            .query("term", &term)
            .query("entity", "song")
            .query("limit", "1")
            .header(
                "User-Agent",
                format!("music-presence/{}", env!("CARGO_PKG_VERSION")),
            )
            .call()
            .context("Failed to query iTunes search")?
            .body_mut()
            .read_to_string()
            .context("Failed to read iTunes response")?;

        parse_response(&body, self.size)
    }
}

fn parse_response(body: &str, size: u32) -> Result<Option<String>> {
    let response: SearchResponse =
        serde_json::from_str(body).context("Failed to parse iTunes response")?;

    if response.result_count == 0 {
        return Ok(None);
    }

    Ok(response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.artwork_url100)
        .map(|url| resize_artwork(&url, size)))
}

/// iTunes only returns a 100px thumbnail; the CDN serves other sizes by name.
pub fn resize_artwork(url: &str, size: u32) -> String {
    url.replacen("100x100bb.jpg", &format!("{size}x{size}.jpg"), 1)
}
