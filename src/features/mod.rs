//! Acoustic feature enrichment.
//!
//! [`FeatureSource`] fetches feature vectors for one batch of ids.
//! [`FeatureEnricher`] splits a candidate id list into batches the upstream
//! accepts, runs them concurrently and merges whatever comes back.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Hard ceiling on ids per enrichment call
pub const MAX_BATCH: usize = 100;

/// Fixed acoustic descriptors for one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub id: String,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    /// Beats per minute
    pub tempo: f64,
}

impl FeatureVector {
    /// Decode one upstream feature record.
    ///
    /// Every numeric field must be present and be a number or a numeric
    /// string, otherwise the record is rejected.
    pub fn from_record(record: &Value) -> Option<Self> {
        let id = record.get("id")?.as_str()?.trim();
        if id.is_empty() {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            valence: numeric(record, "valence")?,
            energy: numeric(record, "energy")?,
            danceability: numeric(record, "danceability")?,
            acousticness: numeric(record, "acousticness")?,
            instrumentalness: numeric(record, "instrumentalness")?,
            tempo: numeric(record, "tempo")?,
        })
    }
}

fn numeric(record: &Value, field: &str) -> Option<f64> {
    let value = match record.get(field)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("feature source not configured: {0}")]
    NotConfigured(String),

    #[error("feature request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feature source returned status {0}")]
    Status(u16),

    #[error("undecodable feature response: {0}")]
    Decode(String),

    #[error("feature batch of {0} ids exceeds the upstream ceiling")]
    BatchTooLarge(usize),
}

/// Upstream that returns feature vectors for a batch of ids
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetch features for at most [`MAX_BATCH`] ids.
    ///
    /// Ids without data are simply absent from the returned map.
    async fn features(&self, ids: &[String]) -> Result<HashMap<String, FeatureVector>, FeatureError>;
}

/// Batches ids and fans out to a [`FeatureSource`].
#[derive(Clone)]
pub struct FeatureEnricher {
    source: Arc<dyn FeatureSource>,
    batch_size: usize,
    concurrency: usize,
    timeout: Duration,
}

impl FeatureEnricher {
    pub fn new(source: Arc<dyn FeatureSource>, batch_size: usize, concurrency: usize, timeout: Duration) -> Self {
        Self {
            source,
            batch_size: batch_size.clamp(1, MAX_BATCH),
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Fetch features for every id, degrading failed batches to nothing.
    pub async fn enrich(&self, ids: &[String]) -> HashMap<String, FeatureVector> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return HashMap::new();
        }

        let batches: Vec<Vec<String>> = unique.chunks(self.batch_size).map(|c| c.to_vec()).collect();
        let batch_count = batches.len();

        let results: Vec<HashMap<String, FeatureVector>> = stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| {
                let source = Arc::clone(&self.source);
                let timeout = self.timeout;
                async move {
                    match tokio::time::timeout(timeout, source.features(&batch)).await {
                        Ok(Ok(found)) => {
                            debug!(batch = index, requested = batch.len(), found = found.len(), "Feature batch done");
                            found
                        }
                        Ok(Err(e)) => {
                            warn!(batch = index, error = %e, "Feature batch failed, continuing without it");
                            HashMap::new()
                        }
                        Err(_) => {
                            warn!(batch = index, timeout_s = timeout.as_secs(), "Feature batch timed out");
                            HashMap::new()
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut merged = HashMap::with_capacity(unique.len());
        for found in results {
            merged.extend(found);
        }

        debug!(ids = unique.len(), batches = batch_count, enriched = merged.len(), "Enrichment finished");
        merged
    }
}
