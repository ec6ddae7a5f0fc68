//! Candidate aggregation.
//!
//! Runs planned queries with bounded concurrency and merges their hits into
//! one pool that is unique by track id. A failing or slow query only costs
//! its own hits.

use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::planner::PlannedQuery;
use crate::catalog::{CandidateTrack, CatalogSearch};
use crate::similarity::SimilarArtists;

/// Merged result of one aggregation run
#[derive(Debug, Clone, Default)]
pub struct AggregateOutcome {
    /// Unique candidates, first occurrence order
    pub candidates: Vec<CandidateTrack>,
    /// Queries that errored or timed out
    pub failed_queries: usize,
    /// Hits dropped because their id was already in the pool
    pub duplicates: usize,
}

/// Insertion-ordered set of candidates keyed by id
#[derive(Debug, Default)]
pub struct CandidatePool {
    seen: HashSet<String>,
    tracks: Vec<CandidateTrack>,
}

impl CandidatePool {
    /// Add a candidate; returns false if its id is already present
    pub fn insert(&mut self, track: CandidateTrack) -> bool {
        if !self.seen.insert(track.id.clone()) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn into_vec(self) -> Vec<CandidateTrack> {
        self.tracks
    }
}

#[derive(Clone)]
pub struct CandidateAggregator {
    catalog: Arc<dyn CatalogSearch>,
    similarity: Option<Arc<dyn SimilarArtists>>,
    concurrency: usize,
    search_timeout: Duration,
    similarity_timeout: Duration,
}

impl CandidateAggregator {
    pub fn new(catalog: Arc<dyn CatalogSearch>, concurrency: usize, search_timeout: Duration) -> Self {
        Self {
            catalog,
            similarity: None,
            concurrency: concurrency.max(1),
            search_timeout,
            similarity_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn SimilarArtists>, timeout: Duration) -> Self {
        self.similarity = Some(similarity);
        self.similarity_timeout = timeout;
        self
    }

    /// Artists similar to `artist`, or nothing if the lookup is
    /// unavailable, fails or times out.
    pub async fn expand_artist(&self, artist: &str, limit: usize) -> Vec<String> {
        let Some(similarity) = &self.similarity else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        match tokio::time::timeout(self.similarity_timeout, similarity.similar(artist, limit)).await {
            Ok(Ok(names)) => names,
            Ok(Err(e)) => {
                warn!(artist, error = %e, "Similar-artist lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(artist, timeout_s = self.similarity_timeout.as_secs(), "Similar-artist lookup timed out");
                Vec::new()
            }
        }
    }

    /// Run every query and merge the hits.
    ///
    /// Queries run concurrently but results are merged in plan order, so
    /// the first query to mention a track decides its position.
    pub async fn collect(&self, queries: &[PlannedQuery]) -> AggregateOutcome {
        let results: Vec<Option<Vec<CandidateTrack>>> = stream::iter(queries.iter().cloned())
            .map(|query| {
                let catalog = Arc::clone(&self.catalog);
                let timeout = self.search_timeout;
                async move {
                    match tokio::time::timeout(timeout, catalog.search(&query.text, query.fetch_limit)).await {
                        Ok(Ok(hits)) => {
                            debug!(query = %query.text, hits = hits.len(), "Query done");
                            Some(hits)
                        }
                        Ok(Err(e)) => {
                            warn!(query = %query.text, error = %e, "Catalog query failed, skipping");
                            None
                        }
                        Err(_) => {
                            warn!(query = %query.text, timeout_s = timeout.as_secs(), "Catalog query timed out, skipping");
                            None
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut pool = CandidatePool::default();
        let mut outcome = AggregateOutcome::default();

        for result in results {
            let Some(hits) = result else {
                outcome.failed_queries += 1;
                continue;
            };
            for track in hits {
                if !pool.insert(track) {
                    outcome.duplicates += 1;
                }
            }
        }

        outcome.candidates = pool.into_vec();
        outcome
    }
}
