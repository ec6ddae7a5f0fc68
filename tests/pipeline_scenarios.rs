//! End-to-end pipeline behaviour against in-memory collaborators.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use scene_curator::catalog::{CandidateTrack, CatalogError, CatalogSearch};
use scene_curator::features::{FeatureError, FeatureSource, FeatureVector};
use scene_curator::pipeline::{
    IntentAnalysis, IntentError, IntentSource, SceneIntent, SceneRecommendation, SinkError, TrackSink,
};
use scene_curator::similarity::{SimilarArtists, SimilarityError};
use scene_curator::{AppConfig, DedupTracker, Intent, MoodProfile, MoodStage, Recommender};

type Responder = Box<dyn Fn(&str, usize) -> Vec<CandidateTrack> + Send + Sync>;

struct FakeCatalog {
    respond: Responder,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn new(respond: impl Fn(&str, usize) -> Vec<CandidateTrack> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Same hits for every query
    fn fixed(tracks: Vec<CandidateTrack>) -> Arc<Self> {
        Self::new(move |_, limit| tracks.iter().take(limit).cloned().collect())
    }

    fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((self.respond)(query, limit))
    }
}

struct FailingCatalog;

#[async_trait]
impl CatalogSearch for FailingCatalog {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<CandidateTrack>, CatalogError> {
        Err(CatalogError::Status(503))
    }
}

#[derive(Default)]
struct FakeFeatures {
    known: HashMap<String, FeatureVector>,
    calls: AtomicUsize,
}

impl FakeFeatures {
    fn with(vectors: Vec<FeatureVector>) -> Arc<Self> {
        Arc::new(Self {
            known: vectors.into_iter().map(|f| (f.id.clone(), f)).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FeatureSource for FakeFeatures {
    async fn features(&self, ids: &[String]) -> Result<HashMap<String, FeatureVector>, FeatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.known.get(id).map(|f| (id.clone(), f.clone())))
            .collect())
    }
}

struct FakeSimilarity {
    calls: AtomicUsize,
}

#[async_trait]
impl SimilarArtists for FakeSimilarity {
    async fn similar(&self, _artist: &str, limit: usize) -> Result<Vec<String>, SimilarityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(["Tycho", "Emancipator"].iter().take(limit).map(|s| s.to_string()).collect())
    }
}

fn track(id: &str, name: &str) -> CandidateTrack {
    CandidateTrack::from_item(json!({
        "id": id,
        "name": name,
        "artists": [{"name": format!("Artist {id}")}],
        "album": {"name": "Album"}
    }))
    .unwrap()
}

fn tracks(prefix: &str, n: usize) -> Vec<CandidateTrack> {
    (0..n).map(|i| track(&format!("{prefix}{i}"), &format!("Song {prefix}{i}"))).collect()
}

fn features(id: &str, valence: f64, energy: f64) -> FeatureVector {
    FeatureVector {
        id: id.to_string(),
        valence,
        energy,
        danceability: 0.5,
        acousticness: 0.5,
        instrumentalness: 0.0,
        tempo: 100.0,
    }
}

fn intent(keywords: &str, genres: &[&str], mood: Option<MoodProfile>, limit: usize) -> Intent {
    Intent {
        keywords: keywords.to_string(),
        genres: genres.iter().map(|s| s.to_string()).collect(),
        seed_artists: Vec::new(),
        mood,
        result_limit: limit,
    }
}

fn recommender(catalog: Arc<dyn CatalogSearch>, features: Arc<dyn FeatureSource>) -> Recommender {
    Recommender::new(&AppConfig::default(), catalog, features)
}

fn ids(tracks: &[scene_curator::pipeline::RecommendedTrack]) -> Vec<String> {
    tracks.iter().map(|t| t.id.clone()).collect()
}

#[tokio::test]
async fn test_rainy_afternoon_matches_mood() {
    // 40 unique hits: c0..c4 generic, c5..c24 calm, c25..c34 loud, c35..c39 unknown
    let mut pool = Vec::new();
    for i in 0..5 {
        pool.push(track(&format!("c{i}"), &format!("Rain Sounds {i}")));
    }
    pool.extend((5..40).map(|i| track(&format!("c{i}"), &format!("Song {i}"))));

    let mut vectors: Vec<FeatureVector> = (5..25).map(|i| features(&format!("c{i}"), 0.3, 0.2)).collect();
    vectors.extend((25..35).map(|i| features(&format!("c{i}"), 0.9, 0.9)));
    let known: HashMap<String, FeatureVector> = vectors.iter().map(|f| (f.id.clone(), f.clone())).collect();

    let catalog = FakeCatalog::fixed(pool);
    let rec = recommender(catalog.clone(), FakeFeatures::with(vectors));

    let target = MoodProfile::new(0.3, 0.2);
    let mut tracker = DedupTracker::new();
    let result = rec
        .recommend(&intent("rainy afternoon", &["jazz"], Some(target), 10), &mut tracker)
        .await;

    assert_eq!(catalog.calls(), 3);
    assert_eq!(result.stats.aggregated, 40);
    assert_eq!(result.stats.generic_removed, 5);
    assert_eq!(result.stats.enriched, 30);
    assert!(result.tracks.len() <= 10);
    assert!(result.tracks.iter().all(|t| !t.name.contains("Rain Sounds")));

    // Count matches before deciding which stage must have fired
    assert_eq!(result.stats.matched, 20);
    assert_eq!(result.stats.stage, Some(MoodStage::Matched));
    for t in &result.tracks {
        if let Some(f) = known.get(&t.id) {
            assert!(f.valence <= 0.5 && f.energy <= 0.45, "{} escaped the mood filter", t.id);
        }
    }
    assert_eq!(result.tracks.len(), 10);
}

#[tokio::test]
async fn test_unknown_genre_without_keywords_makes_no_calls() {
    let catalog = FakeCatalog::fixed(tracks("t", 5));
    let features = FakeFeatures::with(Vec::new());
    let rec = recommender(catalog.clone(), features.clone());

    let mut tracker = DedupTracker::new();
    let result = rec
        .recommend(
            &intent("", &["madeup-genre"], Some(MoodProfile::new(0.5, 0.5)), 10),
            &mut tracker,
        )
        .await;

    assert!(result.tracks.is_empty());
    assert_eq!(result.stats.planned_queries, 0);
    assert_eq!(catalog.calls(), 0);
    assert_eq!(features.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_features_skips_mood_filter() {
    let pool = tracks("p", 8);
    let pool_ids: HashSet<String> = pool.iter().map(|t| t.id.clone()).collect();
    let rec = recommender(FakeCatalog::fixed(pool), FakeFeatures::with(Vec::new()));
    let target = Some(MoodProfile::new(0.9, 0.9));

    let mut tracker = DedupTracker::new();
    let all = rec.recommend(&intent("anything", &[], target, 20), &mut tracker).await;
    assert_eq!(all.stats.stage, Some(MoodStage::NoFeatures));
    assert_eq!(all.tracks.len(), 8);
    let got: HashSet<String> = ids(&all.tracks).into_iter().collect();
    assert_eq!(got, pool_ids);

    let mut tracker = DedupTracker::new();
    let some = rec.recommend(&intent("anything", &[], target, 5), &mut tracker).await;
    assert_eq!(some.tracks.len(), 5);
    assert!(ids(&some.tracks).iter().all(|id| pool_ids.contains(id)));
}

#[tokio::test]
async fn test_too_few_matches_falls_back_to_pool() {
    let pool = tracks("p", 30);
    let vectors = vec![features("p0", 0.5, 0.5), features("p1", 0.5, 0.5), features("p2", 0.95, 0.95)];
    let rec = recommender(FakeCatalog::fixed(pool), FakeFeatures::with(vectors));

    let mut tracker = DedupTracker::new();
    let result = rec
        .recommend(&intent("dusk", &[], Some(MoodProfile::new(0.5, 0.5)), 10), &mut tracker)
        .await;

    assert_eq!(result.stats.matched, 2);
    assert!(result.stats.matched * 2 < 10);
    assert_eq!(result.stats.stage, Some(MoodStage::Fallback));
    assert_eq!(result.tracks.len(), 10);
    assert!(result.stats.matched <= result.stats.aggregated - result.stats.generic_removed);
}

#[tokio::test]
async fn test_no_mood_passes_everything_without_enrichment() {
    let features = FakeFeatures::with(vec![features("p0", 0.0, 1.0)]);
    let rec = recommender(FakeCatalog::fixed(tracks("p", 12)), features.clone());

    let mut tracker = DedupTracker::new();
    let result = rec.recommend(&intent("anything", &[], None, 12), &mut tracker).await;

    assert_eq!(result.stats.stage, Some(MoodStage::Unconstrained));
    assert_eq!(result.stats.matched, 12);
    assert_eq!(result.tracks.len(), 12);
    assert_eq!(features.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let catalog = FakeCatalog::new(|query, limit| {
        let prefix = if query.contains("genre:") && query.contains("year:") {
            "x"
        } else if query.contains("genre:") {
            "g"
        } else {
            "k"
        };
        tracks(prefix, 80).into_iter().take(limit).collect()
    });
    let rec = recommender(catalog, FakeFeatures::with(Vec::new()));

    let mut tracker = DedupTracker::new();
    let many = rec.recommend(&intent("drive", &["synth-pop"], None, 500), &mut tracker).await;
    assert_eq!(many.stats.aggregated, 150);
    assert_eq!(many.tracks.len(), 50);

    let mut tracker = DedupTracker::new();
    let one = rec.recommend(&intent("drive", &["synth-pop"], None, 0), &mut tracker).await;
    assert_eq!(one.tracks.len(), 1);
}

#[tokio::test]
async fn test_scenes_never_repeat_a_track() {
    let catalog = FakeCatalog::new(|query, _| {
        if query.starts_with("sunrise") {
            vec![track("T1", "Morning"), track("A1", "Dawn"), track("A2", "Coffee")]
        } else {
            vec![track("T1", "Morning"), track("B1", "Dusk"), track("B2", "Lamps")]
        }
    });
    let rec = recommender(catalog, FakeFeatures::with(Vec::new()));

    let scenes = vec![
        SceneIntent {
            scene_number: 1,
            description: "waking up".to_string(),
            intent: intent("sunrise", &[], None, 10),
        },
        SceneIntent {
            scene_number: 2,
            description: "going home".to_string(),
            intent: intent("sunset", &[], None, 10),
        },
    ];
    let results = rec.recommend_scenes(scenes).await;

    assert_eq!(results.len(), 2);
    let first = ids(&results[0].tracks);
    let second = ids(&results[1].tracks);
    assert!(first.contains(&"T1".to_string()));
    assert!(!second.contains(&"T1".to_string()));
    assert_eq!(second.len(), 2);

    let all: Vec<String> = first.into_iter().chain(second).collect();
    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(unique.len(), all.len());
    assert_eq!(results[1].description, "going home");
}

#[tokio::test]
async fn test_shared_tracker_across_direct_calls() {
    let rec = recommender(FakeCatalog::fixed(tracks("s", 6)), FakeFeatures::with(Vec::new()));
    let mut tracker = DedupTracker::new();

    let a = rec.recommend(&intent("x", &[], None, 4), &mut tracker).await;
    let b = rec.recommend(&intent("y", &[], None, 4), &mut tracker).await;

    assert_eq!(a.tracks.len(), 4);
    assert_eq!(b.tracks.len(), 2);
    assert_eq!(tracker.len(), 6);
}

#[tokio::test]
async fn test_later_scene_is_not_starved_by_emitted_matches() {
    // 40 candidates, only m0..m4 match the mood
    let mut pool: Vec<CandidateTrack> = (0..5).map(|i| track(&format!("m{i}"), &format!("Quiet {i}"))).collect();
    pool.extend(tracks("o", 35));
    let mut vectors: Vec<FeatureVector> = (0..5).map(|i| features(&format!("m{i}"), 0.3, 0.2)).collect();
    vectors.extend((0..35).map(|i| features(&format!("o{i}"), 0.9, 0.9)));
    let rec = recommender(FakeCatalog::fixed(pool), FakeFeatures::with(vectors));

    let calm = intent("rainy afternoon", &[], Some(MoodProfile::new(0.3, 0.2)), 10);
    let mut tracker = DedupTracker::new();
    let first = rec.recommend(&calm, &mut tracker).await;
    let second = rec.recommend(&calm, &mut tracker).await;

    assert_eq!(first.stats.stage, Some(MoodStage::Matched));
    assert_eq!(first.tracks.len(), 5);

    assert_eq!(second.stats.already_emitted, 5);
    assert_eq!(second.stats.matched, 0);
    assert_eq!(second.stats.stage, Some(MoodStage::Fallback));
    assert_eq!(second.tracks.len(), 10);

    let earlier: HashSet<String> = ids(&first.tracks).into_iter().collect();
    assert!(ids(&second.tracks).iter().all(|id| !earlier.contains(id)));
}

#[tokio::test]
async fn test_exhausted_pool_returns_nothing_for_later_scene() {
    let rec = recommender(FakeCatalog::fixed(tracks("s", 3)), FakeFeatures::with(Vec::new()));
    let mut tracker = DedupTracker::new();

    let a = rec.recommend(&intent("x", &[], None, 5), &mut tracker).await;
    let b = rec.recommend(&intent("x", &[], None, 5), &mut tracker).await;

    assert_eq!(a.tracks.len(), 3);
    assert!(b.tracks.is_empty());
    assert_eq!(b.stats.already_emitted, 3);
    assert!(b.stats.stage.is_none());
}

#[tokio::test]
async fn test_failing_catalog_yields_empty_list() {
    let rec = recommender(Arc::new(FailingCatalog), FakeFeatures::with(Vec::new()));
    let mut tracker = DedupTracker::new();
    let result = rec.recommend(&intent("anything", &["jazz"], None, 10), &mut tracker).await;

    assert!(result.tracks.is_empty());
    assert_eq!(result.stats.planned_queries, 3);
    assert_eq!(result.stats.failed_queries, 3);
    assert!(result.stats.stage.is_none());
}

#[tokio::test]
async fn test_all_generic_pool_is_kept() {
    let pool = vec![track("g1", "Track 01"), track("g2", "White Noise"), track("g3", "2011")];
    let rec = recommender(FakeCatalog::fixed(pool), FakeFeatures::with(Vec::new()));

    let mut tracker = DedupTracker::new();
    let result = rec.recommend(&intent("anything", &[], None, 10), &mut tracker).await;

    assert!(result.stats.quality_fallback);
    assert_eq!(result.tracks.len(), 3);
}

#[tokio::test]
async fn test_seed_artists_expand_through_similarity() {
    let catalog = FakeCatalog::fixed(tracks("a", 3));
    let similarity = Arc::new(FakeSimilarity {
        calls: AtomicUsize::new(0),
    });
    let config = AppConfig::default();
    let rec = Recommender::new(&config, catalog.clone(), FakeFeatures::with(Vec::new()))
        .with_similarity(similarity.clone(), &config);

    let mut seeded = intent("night drive", &[], None, 5);
    seeded.seed_artists = vec!["Bonobo".to_string(), "Boards of Canada".to_string()];

    let mut tracker = DedupTracker::new();
    rec.recommend(&seeded, &mut tracker).await;

    assert_eq!(similarity.calls.load(Ordering::SeqCst), 1);
    let queries = catalog.queries.lock().unwrap().clone();
    // keyword query plus one artist query per name: 2 seeds + 1 similar (capped at 3)
    assert_eq!(queries.len(), 4);
    assert!(queries.iter().any(|q| q == "artist:\"Tycho\" night drive"));
    assert!(!queries.iter().any(|q| q.contains("Emancipator")));
}

struct ChannelSink(mpsc::UnboundedSender<Vec<SceneRecommendation>>);

#[async_trait]
impl TrackSink for ChannelSink {
    async fn store(&self, _request_id: uuid::Uuid, scenes: Vec<SceneRecommendation>) -> Result<(), SinkError> {
        self.0
            .send(scenes)
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}

#[tokio::test]
async fn test_sink_receives_final_lists() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rec = recommender(FakeCatalog::fixed(tracks("s", 3)), FakeFeatures::with(Vec::new()))
        .with_sink(Arc::new(ChannelSink(tx)));

    let result = rec.recommend_one(&intent("x", &[], None, 10)).await;

    let stored = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(ids(&stored[0].tracks), ids(&result.tracks));
}

struct FailingSource;

#[async_trait]
impl IntentSource for FailingSource {
    async fn analyze(&self, _prompt: &str, _genres: &[String]) -> Result<IntentAnalysis, IntentError> {
        Err(IntentError::Unavailable("offline".to_string()))
    }
}

struct SceneSource;

#[async_trait]
impl IntentSource for SceneSource {
    async fn analyze(&self, _prompt: &str, _genres: &[String]) -> Result<IntentAnalysis, IntentError> {
        Ok(IntentAnalysis::Scenes(vec![
            SceneIntent {
                scene_number: 1,
                description: "opening".to_string(),
                intent: intent("harbour", &[], Some(MoodProfile::new(0.2, 0.3)), 2),
            },
            SceneIntent {
                scene_number: 2,
                description: "storm".to_string(),
                intent: intent("thunder", &[], Some(MoodProfile::new(0.3, 0.8)), 2),
            },
        ]))
    }
}

#[tokio::test]
async fn test_unavailable_intent_source_gives_empty_result() {
    let catalog = FakeCatalog::fixed(tracks("t", 5));
    let rec = recommender(catalog.clone(), FakeFeatures::with(Vec::new()));

    let scenes = rec.recommend_prompt(&FailingSource, "a rainy day in paris", &[], 10).await;

    assert_eq!(scenes.len(), 1);
    assert!(scenes[0].tracks.is_empty());
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn test_scene_source_runs_every_scene() {
    let rec = recommender(FakeCatalog::fixed(tracks("t", 6)), FakeFeatures::with(Vec::new()));

    let scenes = rec.recommend_prompt(&SceneSource, "a voyage", &[], 10).await;

    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].tracks.len(), 2);
    assert_eq!(scenes[1].tracks.len(), 2);
    assert_eq!(scenes[0].mood, Some(scene_curator::MoodKind::Melancholic));
    assert_eq!(scenes[1].mood, Some(scene_curator::MoodKind::Intense));
}
