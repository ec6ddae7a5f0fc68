//! Recommendation pipeline.
//!
//! plan -> aggregate -> quality filter -> enrich -> mood select -> assemble.
//!
//! Every upstream failure inside a run degrades to fewer candidates; a run
//! always produces a (possibly empty) list. Dropping the returned future
//! cancels all in-flight upstream calls.

pub mod aggregate;
pub mod assemble;
pub mod dedup;
pub mod intent;
pub mod planner;
pub mod quality;

pub use aggregate::{AggregateOutcome, CandidateAggregator};
pub use assemble::RecommendedTrack;
pub use dedup::DedupTracker;
pub use intent::{fallback_intent, Intent, IntentAnalysis, IntentError, IntentSource, SceneIntent};
pub use planner::{PlannedQuery, QueryPlanner, QueryPurpose};
pub use quality::QualityFilter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::{CatalogSearch, SpotifyCatalog};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::{FeatureEnricher, FeatureSource};
use crate::mood::{MoodKind, MoodMatcher, MoodStage};
use crate::similarity::{LastFmSimilarity, SimilarArtists};

/// Counters describing one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub planned_queries: usize,
    pub failed_queries: usize,
    pub aggregated: usize,
    /// Candidates dropped because an earlier scene already emitted them
    pub already_emitted: usize,
    pub generic_removed: usize,
    pub quality_fallback: bool,
    pub enriched: usize,
    pub matched: usize,
    /// Unset when the run stopped before mood selection
    pub stage: Option<MoodStage>,
    pub emitted: usize,
}

/// Tracks for one intent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub tracks: Vec<RecommendedTrack>,
    pub stats: PipelineStats,
}

/// Tracks for one scene of a multi-scene request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRecommendation {
    pub scene_number: u32,
    pub description: String,
    /// Named mood closest to the scene's profile
    pub mood: Option<MoodKind>,
    pub tracks: Vec<RecommendedTrack>,
    pub stats: PipelineStats,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives final track lists after a request completes.
///
/// Called fire-and-forget; failures are only logged.
#[async_trait]
pub trait TrackSink: Send + Sync {
    async fn store(&self, request_id: Uuid, scenes: Vec<SceneRecommendation>) -> Result<(), SinkError>;
}

#[derive(Clone)]
pub struct Recommender {
    planner: QueryPlanner,
    aggregator: CandidateAggregator,
    quality: QualityFilter,
    enricher: FeatureEnricher,
    matcher: MoodMatcher,
    sink: Option<Arc<dyn TrackSink>>,
    max_scenes: usize,
}

impl Recommender {
    pub fn new(config: &AppConfig, catalog: Arc<dyn CatalogSearch>, features: Arc<dyn FeatureSource>) -> Self {
        let pipeline = &config.pipeline;
        let concurrency = pipeline.effective_concurrency();

        Self {
            planner: QueryPlanner::new(pipeline, config.similarity.expansion_limit),
            aggregator: CandidateAggregator::new(catalog, concurrency, config.catalog.timeout()),
            quality: QualityFilter::new(&config.quality),
            enricher: FeatureEnricher::new(
                features,
                pipeline.effective_batch_size(),
                concurrency,
                config.catalog.features_timeout(),
            ),
            matcher: MoodMatcher::new(config.matcher.clone()),
            sink: None,
            max_scenes: pipeline.max_scenes.max(1),
        }
    }

    /// Wire the HTTP catalog and similarity clients described by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let catalog = Arc::new(SpotifyCatalog::new(&config.catalog)?);
        let similarity = Arc::new(LastFmSimilarity::new(&config.similarity)?);

        Ok(Self::new(config, catalog.clone(), catalog).with_similarity(similarity, config))
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn SimilarArtists>, config: &AppConfig) -> Self {
        self.aggregator = self.aggregator.with_similarity(similarity, config.similarity.timeout());
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TrackSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn max_scenes(&self) -> usize {
        self.max_scenes
    }

    /// Run the pipeline for one intent, sharing `tracker` with sibling runs.
    pub async fn recommend(&self, intent: &Intent, tracker: &mut DedupTracker) -> Recommendation {
        let intent = intent.normalized();
        let limit = intent.effective_limit();
        let mut stats = PipelineStats::default();

        let similar = match intent.seed_artists.first() {
            Some(first) => {
                self.aggregator
                    .expand_artist(first, self.planner.expansion_limit())
                    .await
            }
            None => Vec::new(),
        };

        let plan = self.planner.plan(&intent, &similar);
        stats.planned_queries = plan.len();
        if plan.is_empty() {
            info!("Nothing to search for, returning no tracks");
            return Recommendation { tracks: Vec::new(), stats };
        }

        let aggregate = self.aggregator.collect(&plan).await;
        stats.failed_queries = aggregate.failed_queries;
        stats.aggregated = aggregate.candidates.len();
        info!(
            queries = plan.len(),
            failed = aggregate.failed_queries,
            candidates = aggregate.candidates.len(),
            "Candidates aggregated"
        );
        if aggregate.candidates.is_empty() {
            return Recommendation { tracks: Vec::new(), stats };
        }

        let mut candidates = aggregate.candidates;
        stats.already_emitted = tracker.retain_unseen(&mut candidates);
        if candidates.is_empty() {
            info!(already_emitted = stats.already_emitted, "Every candidate was emitted by an earlier scene");
            return Recommendation { tracks: Vec::new(), stats };
        }

        let filtered = self.quality.apply(candidates);
        stats.generic_removed = filtered.removed;
        stats.quality_fallback = filtered.fell_back;

        // Without a target every candidate matches, so features cannot
        // change the outcome.
        let features = match &intent.mood {
            Some(_) => {
                let ids: Vec<String> = filtered.candidates.iter().map(|c| c.id.clone()).collect();
                self.enricher.enrich(&ids).await
            }
            None => HashMap::new(),
        };
        stats.enriched = features.len();

        let selection = self
            .matcher
            .select(filtered.candidates, &features, intent.mood.as_ref(), limit);
        stats.matched = selection.matched;
        stats.stage = Some(selection.stage);
        if selection.stage == MoodStage::Fallback {
            warn!(
                matched = selection.matched,
                limit,
                pool = selection.candidates.len(),
                "Too few mood matches, using the whole pool"
            );
        }

        let tracks = assemble::assemble(selection.candidates, limit, tracker);
        stats.emitted = tracks.len();
        info!(stage = %selection.stage, emitted = tracks.len(), limit, "Recommendation assembled");

        Recommendation { tracks, stats }
    }

    /// One intent as a whole request, with its own tracker
    pub async fn recommend_one(&self, intent: &Intent) -> Recommendation {
        let request_id = Uuid::new_v4();
        let mut tracker = DedupTracker::new();
        let recommendation = self
            .recommend(intent, &mut tracker)
            .instrument(info_span!("recommend", %request_id))
            .await;

        self.persist(
            request_id,
            vec![SceneRecommendation {
                scene_number: 1,
                description: intent.keywords.trim().to_string(),
                mood: intent.mood.map(|m| m.nearest_kind()),
                tracks: recommendation.tracks.clone(),
                stats: recommendation.stats.clone(),
            }],
        );
        recommendation
    }

    /// Scenes in order, one at a time, sharing one tracker so no track
    /// appears in two scenes. Scenes past the configured maximum are dropped.
    pub async fn recommend_scenes(&self, scenes: Vec<SceneIntent>) -> Vec<SceneRecommendation> {
        let request_id = Uuid::new_v4();
        let mut scenes = scenes;
        if scenes.len() > self.max_scenes {
            warn!(
                %request_id,
                requested = scenes.len(),
                max = self.max_scenes,
                "Too many scenes, dropping the rest"
            );
            scenes.truncate(self.max_scenes);
        }

        let mut tracker = DedupTracker::new();
        let mut results = Vec::with_capacity(scenes.len());

        for scene in scenes {
            let span = info_span!("scene", %request_id, scene = scene.scene_number);
            let recommendation = self.recommend(&scene.intent, &mut tracker).instrument(span).await;

            results.push(SceneRecommendation {
                scene_number: scene.scene_number,
                description: scene.description,
                mood: scene.intent.mood.map(|m| m.nearest_kind()),
                tracks: recommendation.tracks,
                stats: recommendation.stats,
            });
        }

        info!(
            %request_id,
            scenes = results.len(),
            tracks = tracker.len(),
            "Scene request complete"
        );
        self.persist(request_id, results.clone());
        results
    }

    /// Ask `source` to interpret a prompt, then run whatever it returns.
    ///
    /// If the source fails, the empty fallback intent is used, which yields
    /// one scene with no tracks.
    pub async fn recommend_prompt(
        &self,
        source: &dyn IntentSource,
        prompt: &str,
        genres: &[String],
        result_limit: usize,
    ) -> Vec<SceneRecommendation> {
        let analysis = match source.analyze(prompt, genres).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Intent source failed, using fallback intent");
                IntentAnalysis::Direct(fallback_intent(result_limit))
            }
        };

        match analysis {
            IntentAnalysis::Direct(intent) => {
                self.recommend_scenes(vec![SceneIntent {
                    scene_number: 1,
                    description: prompt.trim().to_string(),
                    intent,
                }])
                .await
            }
            IntentAnalysis::Scenes(scenes) => self.recommend_scenes(scenes).await,
        }
    }

    fn persist(&self, request_id: Uuid, scenes: Vec<SceneRecommendation>) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = sink.store(request_id, scenes).await {
                warn!(%request_id, error = %e, "Failed to hand tracks to sink");
            }
        });
    }
}
