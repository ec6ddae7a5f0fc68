//! HTTP catalog client speaking the Spotify Web API.
//!
//! Serves both text search and batched audio-feature lookup. Without an
//! access token every call fails fast with `NotConfigured`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::{decode_items, CandidateTrack, CatalogError, CatalogSearch};
use crate::config::CatalogConfig;
use crate::features::{FeatureError, FeatureSource, FeatureVector, MAX_BATCH};

/// Upstream page-size ceiling for search
pub const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Clone)]
pub struct SpotifyCatalog {
    search_client: Client,
    features_client: Client,
    base_url: String,
    access_token: Option<String>,
    market: String,
}

impl SpotifyCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let search_client = Client::builder().timeout(config.timeout()).build()?;
        let features_client = Client::builder().timeout(config.features_timeout()).build()?;

        Ok(Self {
            search_client,
            features_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.trim().is_empty()),
            market: config.market.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl CatalogSearch for SpotifyCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| CatalogError::NotConfigured("no access token".to_string()))?;

        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let response = self
            .search_client
            .get(self.endpoint("search"))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", limit.as_str()),
                ("market", self.market.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let items = match body.pointer("/tracks/items") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(CatalogError::Decode("missing tracks.items".to_string())),
        };

        let tracks = decode_items(items);
        debug!(query, found = tracks.len(), "Catalog search done");
        Ok(tracks)
    }
}

#[async_trait]
impl FeatureSource for SpotifyCatalog {
    async fn features(&self, ids: &[String]) -> Result<HashMap<String, FeatureVector>, FeatureError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        if ids.len() > MAX_BATCH {
            return Err(FeatureError::BatchTooLarge(ids.len()));
        }
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| FeatureError::NotConfigured("no access token".to_string()))?;

        let joined = ids.join(",");
        let response = self
            .features_client
            .get(self.endpoint("audio-features"))
            .bearer_auth(token)
            .query(&[("ids", joined.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeatureError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let Some(records) = body.get("audio_features").and_then(Value::as_array) else {
            return Err(FeatureError::Decode("missing audio_features".to_string()));
        };

        let mut found = HashMap::with_capacity(records.len());
        let mut dropped = 0usize;
        for record in records {
            match FeatureVector::from_record(record) {
                Some(fv) => {
                    found.insert(fv.id.clone(), fv);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(requested = ids.len(), dropped, "Dropped incomplete feature records");
        }
        Ok(found)
    }
}
