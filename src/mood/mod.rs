//! Mood matching over acoustic feature vectors.
//!
//! A [`MoodProfile`] holds target values for a handful of acoustic
//! descriptors. [`MoodMatcher`] decides per candidate whether its
//! [`FeatureVector`] fits a profile (tolerance bands plus hard override
//! rules) and applies the three-stage fallback over a whole pool.

pub mod profiles;

pub use profiles::{get_mood_by_id, MoodDefinition, MoodKind, ALL_MOODS};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

use crate::features::FeatureVector;

/// Target values for one emotional/energy intent.
///
/// Unit-range fields default to the neutral 0.5 and tempo to 110 bpm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    #[serde(default = "neutral")]
    pub target_valence: f64,
    #[serde(default = "neutral")]
    pub target_energy: f64,
    #[serde(default = "neutral")]
    pub target_danceability: f64,
    #[serde(default = "default_tempo")]
    pub target_tempo: f64,
    #[serde(default = "neutral")]
    pub target_acousticness: f64,
}

fn neutral() -> f64 {
    0.5
}

fn default_tempo() -> f64 {
    110.0
}

impl Default for MoodProfile {
    fn default() -> Self {
        Self {
            target_valence: neutral(),
            target_energy: neutral(),
            target_danceability: neutral(),
            target_tempo: default_tempo(),
            target_acousticness: neutral(),
        }
    }
}

impl MoodProfile {
    /// Profile with explicit valence/energy targets and neutral everything else
    pub fn new(valence: f64, energy: f64) -> Self {
        Self {
            target_valence: valence,
            target_energy: energy,
            ..Default::default()
        }
    }

    /// Clamp unit-range targets into [0, 1]; a non-positive or NaN tempo
    /// becomes the default.
    pub fn normalized(self) -> Self {
        let unit = |v: f64| if v.is_nan() { neutral() } else { v.clamp(0.0, 1.0) };
        Self {
            target_valence: unit(self.target_valence),
            target_energy: unit(self.target_energy),
            target_danceability: unit(self.target_danceability),
            target_tempo: if self.target_tempo > 0.0 {
                self.target_tempo
            } else {
                default_tempo()
            },
            target_acousticness: unit(self.target_acousticness),
        }
    }

    /// Named mood closest to this profile on the valence/energy plane
    pub fn nearest_kind(&self) -> MoodKind {
        let distance = |m: &MoodDefinition| {
            let dv = m.profile.target_valence - self.target_valence;
            let de = m.profile.target_energy - self.target_energy;
            (dv * dv + de * de).sqrt()
        };

        ALL_MOODS
            .iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))
            .map(|m| m.kind)
            .unwrap_or(MoodKind::Balanced)
    }
}

/// Tolerances and hard override thresholds for the matcher.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRules {
    /// Accepted distance between candidate and target valence
    #[serde(default = "default_valence_tolerance")]
    pub valence_tolerance: f64,

    /// Accepted distance between candidate and target energy
    #[serde(default = "default_energy_tolerance")]
    pub energy_tolerance: f64,

    /// Targets above this are "strongly positive" / "high energy"
    #[serde(default = "default_high_target")]
    pub high_target: f64,

    /// Targets below this are "strongly negative" / "low energy"
    #[serde(default = "default_low_target")]
    pub low_target: f64,

    /// Minimum valence for a strongly positive target
    #[serde(default = "default_positive_valence_floor")]
    pub positive_valence_floor: f64,

    /// Minimum energy for a high energy target
    #[serde(default = "default_high_energy_floor")]
    pub high_energy_floor: f64,

    /// Maximum valence for a strongly negative target
    #[serde(default = "default_negative_valence_ceiling")]
    pub negative_valence_ceiling: f64,

    /// Maximum energy for a low energy target
    #[serde(default = "default_low_energy_ceiling")]
    pub low_energy_ceiling: f64,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            valence_tolerance: default_valence_tolerance(),
            energy_tolerance: default_energy_tolerance(),
            high_target: default_high_target(),
            low_target: default_low_target(),
            positive_valence_floor: default_positive_valence_floor(),
            high_energy_floor: default_high_energy_floor(),
            negative_valence_ceiling: default_negative_valence_ceiling(),
            low_energy_ceiling: default_low_energy_ceiling(),
        }
    }
}

fn default_valence_tolerance() -> f64 {
    0.2
}

fn default_energy_tolerance() -> f64 {
    0.25
}

fn default_high_target() -> f64 {
    0.65
}

fn default_low_target() -> f64 {
    0.35
}

fn default_positive_valence_floor() -> f64 {
    0.4
}

fn default_high_energy_floor() -> f64 {
    0.4
}

fn default_negative_valence_ceiling() -> f64 {
    0.6
}

fn default_low_energy_ceiling() -> f64 {
    0.7
}

/// Hard override rule that rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    NegativeForPositive,
    LowEnergyForHighEnergy,
    PositiveForNegative,
    HighEnergyForLowEnergy,
}

/// Outcome of matching one feature vector against a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchVerdict {
    Accepted,
    OutOfBand,
    Rejected(OverrideRule),
}

impl MatchVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchVerdict::Accepted)
    }
}

/// Which branch of the fallback cascade produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodStage {
    /// No profile was supplied; the whole pool is eligible
    Unconstrained,
    /// Enrichment returned nothing; mood filtering skipped
    NoFeatures,
    /// Enough candidates matched the profile
    Matched,
    /// Too few matches; the full pool is used instead
    Fallback,
}

impl std::fmt::Display for MoodStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MoodStage::Unconstrained => "unconstrained",
            MoodStage::NoFeatures => "no_features",
            MoodStage::Matched => "matched",
            MoodStage::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// Result of running the cascade over a pool
#[derive(Debug, Clone)]
pub struct MoodSelection<T> {
    pub stage: MoodStage,
    /// Number of candidates that matched the profile
    pub matched: usize,
    /// Candidates handed on to assembly, in pool order
    pub candidates: Vec<T>,
}

/// Something that can be looked up in a feature map
pub trait Keyed {
    type Key: Eq + Hash + ?Sized;

    fn key(&self) -> &Self::Key;
}

#[derive(Debug, Clone, Default)]
pub struct MoodMatcher {
    rules: MatchRules,
}

impl MoodMatcher {
    pub fn new(rules: MatchRules) -> Self {
        Self { rules }
    }

    /// Match a single feature vector against a target profile
    pub fn verdict(&self, target: &MoodProfile, features: &FeatureVector) -> MatchVerdict {
        let r = &self.rules;
        let tv = target.target_valence;
        let te = target.target_energy;

        if tv > r.high_target && features.valence < r.positive_valence_floor {
            return MatchVerdict::Rejected(OverrideRule::NegativeForPositive);
        }
        if te > r.high_target && features.energy < r.high_energy_floor {
            return MatchVerdict::Rejected(OverrideRule::LowEnergyForHighEnergy);
        }
        if tv < r.low_target && features.valence > r.negative_valence_ceiling {
            return MatchVerdict::Rejected(OverrideRule::PositiveForNegative);
        }
        if te < r.low_target && features.energy > r.low_energy_ceiling {
            return MatchVerdict::Rejected(OverrideRule::HighEnergyForLowEnergy);
        }

        let valence_ok = (features.valence - tv).abs() <= r.valence_tolerance;
        let energy_ok = (features.energy - te).abs() <= r.energy_tolerance;

        if valence_ok && energy_ok {
            MatchVerdict::Accepted
        } else {
            MatchVerdict::OutOfBand
        }
    }

    /// Whether a feature vector fits the target; no target matches everything
    pub fn matches(&self, target: Option<&MoodProfile>, features: &FeatureVector) -> bool {
        match target {
            Some(t) => self.verdict(t, features).is_match(),
            None => true,
        }
    }

    /// Run the fallback cascade over a post-quality-filter pool.
    ///
    /// Candidates without a feature vector never count as matches; they
    /// can only come back through the no-features or fallback branches.
    pub fn select<T>(
        &self,
        pool: Vec<T>,
        features: &HashMap<String, FeatureVector>,
        target: Option<&MoodProfile>,
        limit: usize,
    ) -> MoodSelection<T>
    where
        T: Keyed<Key = str>,
    {
        let Some(target) = target else {
            return MoodSelection {
                stage: MoodStage::Unconstrained,
                matched: pool.len(),
                candidates: pool,
            };
        };

        if features.is_empty() {
            return MoodSelection {
                stage: MoodStage::NoFeatures,
                matched: 0,
                candidates: pool,
            };
        }

        let matched = pool
            .iter()
            .filter(|c| {
                features
                    .get(c.key())
                    .is_some_and(|f| self.verdict(target, f).is_match())
            })
            .count();

        if matched > 0 && matched * 2 >= limit {
            let candidates = pool
                .into_iter()
                .filter(|c| {
                    features
                        .get(c.key())
                        .is_some_and(|f| self.verdict(target, f).is_match())
                })
                .collect();
            MoodSelection {
                stage: MoodStage::Matched,
                matched,
                candidates,
            }
        } else {
            MoodSelection {
                stage: MoodStage::Fallback,
                matched,
                candidates: pool,
            }
        }
    }
}
