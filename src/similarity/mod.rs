//! Similar-artist expansion.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SimilarityConfig;

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("similarity request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("similarity service returned status {0}")]
    Status(u16),

    #[error("similarity service error {code}: {message}")]
    Service { code: i64, message: String },
}

/// Lookup of artists similar to a seed artist
#[async_trait]
pub trait SimilarArtists: Send + Sync {
    /// Names of up to `limit` similar artists, most similar first
    async fn similar(&self, artist: &str, limit: usize) -> Result<Vec<String>, SimilarityError>;
}

#[derive(Debug, Deserialize)]
struct SimilarResponse {
    #[serde(default)]
    similarartists: Option<SimilarArtistList>,
    #[serde(default)]
    error: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SimilarArtistList {
    #[serde(default)]
    artist: Vec<SimilarArtist>,
}

#[derive(Debug, Deserialize)]
struct SimilarArtist {
    #[serde(default)]
    name: String,
    /// Match confidence, sent as a string
    #[serde(default, rename = "match")]
    score: serde_json::Value,
}

impl SimilarArtist {
    fn confidence(&self) -> Option<f64> {
        match &self.score {
            serde_json::Value::String(s) => s.trim().parse().ok(),
            serde_json::Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

/// Last.fm `artist.getSimilar` client
#[derive(Clone)]
pub struct LastFmSimilarity {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    min_match: f64,
}

impl LastFmSimilarity {
    pub fn new(config: &SimilarityConfig) -> Result<Self, SimilarityError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            min_match: config.min_match,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SimilarArtists for LastFmSimilarity {
    async fn similar(&self, artist: &str, limit: usize) -> Result<Vec<String>, SimilarityError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Similarity API key not configured, skipping artist expansion");
            return Ok(Vec::new());
        };
        if artist.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("method", "artist.getsimilar"),
                ("artist", artist.trim()),
                ("api_key", api_key),
                ("format", "json"),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SimilarityError::Status(status.as_u16()));
        }

        let body: SimilarResponse = response.json().await?;
        if let Some(code) = body.error {
            return Err(SimilarityError::Service {
                code,
                message: body.message.unwrap_or_default(),
            });
        }

        let names: Vec<String> = body
            .similarartists
            .map(|list| list.artist)
            .unwrap_or_default()
            .into_iter()
            .filter(|a| !a.name.trim().is_empty())
            .filter(|a| a.confidence().is_some_and(|m| m >= self.min_match))
            .map(|a| a.name.trim().to_string())
            .take(limit)
            .collect();

        debug!(artist, found = names.len(), "Similar artists fetched");
        Ok(names)
    }
}
