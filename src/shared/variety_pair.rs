//! Word pairs and the variety pairs that own them.
use crate::shared::distributions::{
    ConditionalFrequencyDistribution, ConditionalProbabilityDistribution,
};
use crate::shared::ngram::Ngram;
use crate::shared::segment::{Segment, SyllablePosition};
use crate::shared::sound_class::SoundContext;
use crate::shared::utils::{mean, FastHashMap};
use crate::shared::word::{Variety, Word};
use std::sync::Arc;

pub type SoundChangeCounts = ConditionalFrequencyDistribution<SoundContext, Ngram>;
pub type SoundChangeProbabilities = ConditionalProbabilityDistribution<SoundContext, Ngram>;

/// Outcome of a cognate identifier on one word pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CognacyDecision {
    pub predicted: bool,
    pub score: f64,
    // one note per alignment column
    pub notes: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct WordPair {
    pub word1: Arc<Word>,
    pub word2: Arc<Word>,
    pub predicted_cognacy: bool,
    pub predicted_cognacy_score: f64,
    // decision made by a user, overrides the prediction
    pub actual_cognacy: Option<bool>,
    pub phonetic_similarity_score: f64,
    pub alignment_notes: Vec<String>,
}

impl WordPair {
    pub fn new(word1: Arc<Word>, word2: Arc<Word>) -> WordPair {
        WordPair {
            word1,
            word2,
            predicted_cognacy: false,
            predicted_cognacy_score: 0.,
            actual_cognacy: None,
            phonetic_similarity_score: 0.,
            alignment_notes: Vec::new(),
        }
    }

    pub fn meaning(&self) -> &str {
        self.word1.meaning()
    }

    pub fn cognacy(&self) -> bool {
        self.actual_cognacy.unwrap_or(self.predicted_cognacy)
    }

    pub fn apply(&mut self, decision: CognacyDecision) {
        self.predicted_cognacy = decision.predicted;
        self.predicted_cognacy_score = decision.score;
        self.alignment_notes = decision.notes;
    }

    pub fn key(&self) -> WordPairKey {
        WordPairKey {
            variety1: self.word1.variety().to_string(),
            variety2: self.word2.variety().to_string(),
            meaning: self.meaning().to_string(),
        }
    }
}

/// Identifies a word pair across the project.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordPairKey {
    pub variety1: String,
    pub variety2: String,
    pub meaning: String,
}

/// Two segments that correspond in cognate words.
#[derive(Clone, Debug)]
pub struct SoundCorrespondence {
    pub segment1: Arc<Segment>,
    pub segment2: Arc<Segment>,
    pub frequency: usize,
    pub word_pairs: Vec<WordPairKey>,
}

#[derive(Clone, Debug, Default)]
pub struct SoundCorrespondenceCollection {
    correspondences: FastHashMap<(String, String), SoundCorrespondence>,
}

impl SoundCorrespondenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, segment1: &Arc<Segment>, segment2: &Arc<Segment>, pair: WordPairKey) {
        let corr = self
            .correspondences
            .entry((segment1.str_rep().to_string(), segment2.str_rep().to_string()))
            .or_insert_with(|| SoundCorrespondence {
                segment1: segment1.clone(),
                segment2: segment2.clone(),
                frequency: 0,
                word_pairs: Vec::new(),
            });
        corr.frequency += 1;
        corr.word_pairs.push(pair);
    }

    pub fn get(&self, segment1: &str, segment2: &str) -> Option<&SoundCorrespondence> {
        self.correspondences
            .get(&(segment1.to_string(), segment2.to_string()))
    }

    /// Fold `other` into `self`, adding frequencies.
    pub fn merge(&mut self, other: SoundCorrespondenceCollection) {
        for (key, corr) in other.correspondences {
            match self.correspondences.get_mut(&key) {
                Some(c) => {
                    c.frequency += corr.frequency;
                    c.word_pairs.extend(corr.word_pairs);
                }
                None => {
                    self.correspondences.insert(key, corr);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundCorrespondence> {
        self.correspondences.values()
    }

    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct VarietyPair {
    pub variety1: Arc<Variety>,
    pub variety2: Arc<Variety>,
    // one per meaning, in the meaning order of variety1
    pub word_pairs: Vec<WordPair>,

    pub sound_change_frequency_distribution: SoundChangeCounts,
    // None until the inducer has run
    pub sound_change_probability_distribution: Option<SoundChangeProbabilities>,
    // probability of a correspondence under a condition never observed
    pub default_correspondence_probability: f64,

    // None when there are no word pairs
    pub phonetic_similarity_score: Option<f64>,
    pub lexical_similarity_score: Option<f64>,

    pub sound_correspondences: FastHashMap<SyllablePosition, SoundCorrespondenceCollection>,
}

impl VarietyPair {
    pub fn new(variety1: Arc<Variety>, variety2: Arc<Variety>) -> VarietyPair {
        VarietyPair {
            variety1,
            variety2,
            word_pairs: Vec::new(),
            sound_change_frequency_distribution: SoundChangeCounts::new(),
            sound_change_probability_distribution: None,
            default_correspondence_probability: 0.,
            phonetic_similarity_score: None,
            lexical_similarity_score: None,
            sound_correspondences: FastHashMap::default(),
        }
    }

    pub fn word_pair(&self, meaning: &str) -> Option<&WordPair> {
        self.word_pairs.iter().find(|wp| wp.meaning() == meaning)
    }

    /// Probability of `correspondence` under `context`, falling back on the
    /// default probability for unseen contexts. 0 before any fit.
    pub fn correspondence_probability(&self, context: &SoundContext, correspondence: &Ngram) -> f64 {
        match &self.sound_change_probability_distribution {
            None => 0.,
            Some(cpd) => cpd
                .probability(context, correspondence)
                .unwrap_or(self.default_correspondence_probability),
        }
    }

    /// Recompute the mean phonetic score and the fraction of predicted
    /// cognates.
    pub fn update_phonetic_similarity_score(&mut self) {
        self.phonetic_similarity_score =
            mean(self.word_pairs.iter().map(|wp| wp.phonetic_similarity_score));
    }

    pub fn update_similarity_scores(&mut self) {
        self.update_phonetic_similarity_score();
        self.lexical_similarity_score = mean(
            self.word_pairs
                .iter()
                .map(|wp| if wp.predicted_cognacy { 1. } else { 0. }),
        );
    }
}
