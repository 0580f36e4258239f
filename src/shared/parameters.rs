//! The structs used for specifying the scoring and inference parameters
use crate::shared::errors::CogError;
use crate::shared::segment::FeatureSystem;
use crate::shared::sound_class::SoundClass;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Boundary conditions of the alignment search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentMode {
    // whole words against each other
    #[default]
    Global,
    // free end gaps, the best cell of the last row or column wins
    SemiGlobal,
    // must reach the end of both words, may start anywhere
    HalfLocal,
    // best-scoring sub-alignment
    Local,
}

/// Mutable, serializable description of the scoring model. `build` turns it
/// into the immutable [`AlineSettings`] that aligners hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlineSettingsBuilder {
    pub mode: AlignmentMode,
    pub expansion_compression_enabled: bool,
    pub sound_change_scoring_enabled: bool,
    pub syllable_position_cost_enabled: bool,

    pub max_substitution_score: i32,
    pub max_expansion_compression_score: i32,
    pub max_sound_change_score: i32,
    pub indel_cost: i32,
    // only charged on vowels
    pub vowel_cost: i32,
    pub syllable_position_cost: i32,

    pub feature_system: FeatureSystem,
    pub relevant_vowel_features: Vec<String>,
    pub relevant_consonant_features: Vec<String>,
    // feature id -> weight
    pub feature_weights: BTreeMap<String, i32>,
    // symbol id -> metric
    pub value_metrics: BTreeMap<String, i32>,
    // tried in order when looking for the environment of a segment
    pub contextual_sound_classes: Vec<SoundClass>,
}

impl Default for AlineSettingsBuilder {
    fn default() -> AlineSettingsBuilder {
        AlineSettingsBuilder {
            mode: AlignmentMode::Global,
            expansion_compression_enabled: true,
            sound_change_scoring_enabled: true,
            syllable_position_cost_enabled: true,
            max_substitution_score: 3500,
            max_expansion_compression_score: 4500,
            max_sound_change_score: 800,
            indel_cost: 1000,
            vowel_cost: 0,
            syllable_position_cost: 500,
            feature_system: FeatureSystem::default(),
            relevant_vowel_features: Vec::new(),
            relevant_consonant_features: Vec::new(),
            feature_weights: BTreeMap::new(),
            value_metrics: BTreeMap::new(),
            contextual_sound_classes: Vec::new(),
        }
    }
}

impl AlineSettingsBuilder {
    pub fn new(feature_system: FeatureSystem) -> AlineSettingsBuilder {
        AlineSettingsBuilder {
            feature_system,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<AlineSettingsBuilder> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build(self) -> Result<AlineSettings> {
        for f in self
            .relevant_vowel_features
            .iter()
            .chain(self.relevant_consonant_features.iter())
        {
            let feature = self.feature_system.feature(f).ok_or_else(|| {
                CogError::InvalidSettings(format!("unknown relevant feature `{}`", f))
            })?;
            if !self.feature_weights.contains_key(f) {
                return Err(
                    CogError::InvalidSettings(format!("feature `{}` has no weight", f)).into(),
                );
            }
            if let Some(s) = feature
                .symbols
                .iter()
                .find(|s| !self.value_metrics.contains_key(*s))
            {
                return Err(
                    CogError::InvalidSettings(format!("symbol `{}` has no metric", s)).into(),
                );
            }
        }
        if self.indel_cost < 0 || self.max_sound_change_score < 0 {
            return Err(CogError::InvalidSettings(
                "indel cost and sound change score must be non-negative".to_string(),
            )
            .into());
        }
        Ok(AlineSettings { values: self })
    }
}

/// Validated scoring settings. Never changes once built; aligners share it
/// behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct AlineSettings {
    values: AlineSettingsBuilder,
}

impl AlineSettings {
    pub fn mode(&self) -> AlignmentMode {
        self.values.mode
    }

    pub fn expansion_compression_enabled(&self) -> bool {
        self.values.expansion_compression_enabled
    }

    pub fn sound_change_scoring_enabled(&self) -> bool {
        self.values.sound_change_scoring_enabled
    }

    pub fn syllable_position_cost_enabled(&self) -> bool {
        self.values.syllable_position_cost_enabled
    }

    pub fn max_substitution_score(&self) -> i32 {
        self.values.max_substitution_score
    }

    pub fn max_expansion_compression_score(&self) -> i32 {
        self.values.max_expansion_compression_score
    }

    pub fn max_sound_change_score(&self) -> i32 {
        self.values.max_sound_change_score
    }

    pub fn indel_cost(&self) -> i32 {
        self.values.indel_cost
    }

    pub fn vowel_cost(&self) -> i32 {
        self.values.vowel_cost
    }

    pub fn syllable_position_cost(&self) -> i32 {
        self.values.syllable_position_cost
    }

    pub fn feature_system(&self) -> &FeatureSystem {
        &self.values.feature_system
    }

    pub fn relevant_vowel_features(&self) -> &[String] {
        &self.values.relevant_vowel_features
    }

    pub fn relevant_consonant_features(&self) -> &[String] {
        &self.values.relevant_consonant_features
    }

    pub fn feature_weight(&self, feature: &str) -> i32 {
        self.values.feature_weights.get(feature).copied().unwrap_or(0)
    }

    pub fn value_metric(&self, symbol: &str) -> i32 {
        self.values.value_metrics.get(symbol).copied().unwrap_or(0)
    }

    pub fn contextual_sound_classes(&self) -> &[SoundClass] {
        &self.values.contextual_sound_classes
    }

    /// A fresh builder holding a copy of these settings.
    pub fn to_builder(&self) -> AlineSettingsBuilder {
        self.values.clone()
    }
}

/// Parameters of the sound-change inducer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmParameters {
    pub max_iterations: usize,
    // largest probability change still considered converged
    pub convergence_tolerance: f64,
    // pairs scoring at least this much feed the first iteration
    pub initial_alignment_threshold: f64,
}

impl Default for EmParameters {
    fn default() -> EmParameters {
        EmParameters {
            max_iterations: 15,
            convergence_tolerance: 1e-4,
            initial_alignment_threshold: 0.7,
        }
    }
}

impl EmParameters {
    pub fn new(
        max_iterations: usize,
        convergence_tolerance: f64,
        initial_alignment_threshold: f64,
    ) -> Self {
        Self {
            max_iterations,
            convergence_tolerance,
            initial_alignment_threshold,
        }
    }
}
