//! Phonetic segments, their feature bundles and the pool that interns them.
use crate::shared::utils::FastHashMap;
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

/// String form of the word-boundary anchor.
pub const ANCHOR_STR: &str = "#";

static ANCHOR: Lazy<Arc<Segment>> = Lazy::new(|| {
    Arc::new(Segment::new(
        ANCHOR_STR,
        SegmentType::Anchor,
        FeatureBundle::default(),
    ))
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    Consonant,
    Vowel,
    // word boundary
    Anchor,
    // syllable/morpheme boundary marks, never aligned
    Boundary,
    ToneLetter,
}

impl SegmentType {
    /// Only consonants and vowels take part in alignments.
    pub fn is_segmental(&self) -> bool {
        matches!(self, SegmentType::Consonant | SegmentType::Vowel)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyllablePosition {
    Onset,
    Nucleus,
    Coda,
}

/// A feature with a closed set of symbolic values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicFeature {
    pub id: String,
    pub symbols: Vec<String>,
}

/// All the features segments can be described with. Symbol ids are unique
/// across the whole system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSystem {
    features: Vec<SymbolicFeature>,
}

impl FeatureSystem {
    pub fn new() -> FeatureSystem {
        FeatureSystem::default()
    }

    pub fn add_feature(&mut self, id: &str, symbols: &[&str]) -> Result<()> {
        if self.feature(id).is_some() {
            return Err(anyhow!("Feature `{}` is already defined", id));
        }
        for s in symbols {
            if let Some(f) = self.feature_of_symbol(s) {
                return Err(anyhow!(
                    "Symbol `{}` is already used by the feature `{}`",
                    s,
                    f.id
                ));
            }
        }
        self.features.push(SymbolicFeature {
            id: id.to_string(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        });
        Ok(())
    }

    pub fn feature(&self, id: &str) -> Option<&SymbolicFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn feature_of_symbol(&self, symbol: &str) -> Option<&SymbolicFeature> {
        self.features
            .iter()
            .find(|f| f.symbols.iter().any(|s| s == symbol))
    }

    pub fn features(&self) -> impl Iterator<Item = &SymbolicFeature> {
        self.features.iter()
    }
}

/// Feature id -> the symbols the segment may take for it. More than one
/// symbol means the feature is underspecified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBundle {
    values: BTreeMap<String, Vec<String>>,
}

impl FeatureBundle {
    pub fn new() -> FeatureBundle {
        FeatureBundle::default()
    }

    pub fn with(mut self, feature: &str, symbols: &[&str]) -> FeatureBundle {
        self.set(feature, symbols);
        self
    }

    pub fn set(&mut self, feature: &str, symbols: &[&str]) {
        self.values.insert(
            feature.to_string(),
            symbols.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn values(&self, feature: &str) -> Option<&[String]> {
        self.values
            .get(feature)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.values.iter()
    }

    /// Check that every feature and symbol is known to `system`.
    pub fn check(&self, system: &FeatureSystem) -> Result<()> {
        for (feature, symbols) in &self.values {
            let f = system
                .feature(feature)
                .ok_or(anyhow!("Unknown feature `{}`", feature))?;
            if let Some(s) = symbols.iter().find(|s| !f.symbols.contains(s)) {
                return Err(anyhow!("`{}` is not a symbol of the feature `{}`", s, feature));
            }
        }
        Ok(())
    }
}

/// One phonetic unit. Equality, ordering and hashing only look at the
/// string representation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    str_rep: String,
    kind: SegmentType,
    features: FeatureBundle,
}

impl Segment {
    pub fn new(str_rep: &str, kind: SegmentType, features: FeatureBundle) -> Segment {
        Segment {
            str_rep: str_rep.to_string(),
            kind,
            features,
        }
    }

    pub fn anchor() -> Arc<Segment> {
        ANCHOR.clone()
    }

    pub fn str_rep(&self) -> &str {
        &self.str_rep
    }

    pub fn kind(&self) -> SegmentType {
        self.kind
    }

    pub fn features(&self) -> &FeatureBundle {
        &self.features
    }

    pub fn is_vowel(&self) -> bool {
        self.kind == SegmentType::Vowel
    }

    pub fn is_consonant(&self) -> bool {
        self.kind == SegmentType::Consonant
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.str_rep == other.str_rep
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.str_rep.hash(state);
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.str_rep.cmp(&other.str_rep)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.str_rep)
    }
}

/// Interns segments by string representation so that every phone of a
/// given form shares one instance.
#[derive(Debug, Default)]
pub struct SegmentPool {
    segments: Mutex<FastHashMap<String, Arc<Segment>>>,
}

impl SegmentPool {
    pub fn new() -> SegmentPool {
        SegmentPool::default()
    }

    /// Return the pooled instance for `segment`, inserting it if it is new.
    /// The first segment registered under a string form wins.
    pub fn intern(&self, segment: Segment) -> Arc<Segment> {
        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);
        segments
            .entry(segment.str_rep.clone())
            .or_insert_with(|| Arc::new(segment))
            .clone()
    }

    pub fn get(&self, str_rep: &str) -> Option<Arc<Segment>> {
        if str_rep == ANCHOR_STR {
            return Some(Segment::anchor());
        }
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(str_rep)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
