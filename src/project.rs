//! Registry of the varieties and of the named components working on them.
use crate::align::WordAligner;
use crate::cognate::CognateIdentifier;
use crate::shared::errors::CogError;
use crate::shared::segment::SegmentPool;
use crate::shared::utils::FastHashMap;
use crate::shared::variety_pair::{VarietyPair, WordPairKey};
use crate::shared::word::{Variety, Word};
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Project {
    pub segment_pool: SegmentPool,
    pub varieties: Vec<Arc<Variety>>,
    aligners: FastHashMap<String, Arc<WordAligner>>,
    cognate_identifiers: FastHashMap<String, Arc<CognateIdentifier>>,
    // user decisions, keyed by word pair and the two word strings
    cognacy_decisions: FastHashMap<(WordPairKey, String, String), bool>,
}

impl Project {
    pub fn new() -> Project {
        Project::default()
    }

    pub fn add_variety(&mut self, variety: Variety) -> Arc<Variety> {
        let variety = Arc::new(variety);
        self.varieties.push(variety.clone());
        variety
    }

    pub fn variety(&self, name: &str) -> Option<&Arc<Variety>> {
        self.varieties.iter().find(|v| v.name() == name)
    }

    pub fn add_aligner(&mut self, id: &str, aligner: WordAligner) -> Arc<WordAligner> {
        let aligner = Arc::new(aligner);
        self.aligners.insert(id.to_string(), aligner.clone());
        aligner
    }

    pub fn add_cognate_identifier(&mut self, id: &str, identifier: CognateIdentifier) {
        self.cognate_identifiers
            .insert(id.to_string(), Arc::new(identifier));
    }

    pub fn aligner(&self, id: &str) -> Result<&Arc<WordAligner>> {
        self.aligners
            .get(id)
            .ok_or_else(|| CogError::UnknownAligner(id.to_string()).into())
    }

    pub fn cognate_identifier(&self, id: &str) -> Result<&Arc<CognateIdentifier>> {
        self.cognate_identifiers
            .get(id)
            .ok_or_else(|| CogError::UnknownCognateIdentifier(id.to_string()).into())
    }

    /// Record that `word1` and `word2` are (or are not) cognate.
    pub fn set_cognacy_decision(&mut self, word1: &Word, word2: &Word, cognate: bool) {
        self.cognacy_decisions.insert(decision_key(word1, word2), cognate);
    }

    pub fn cognacy_decision(&self, word1: &Word, word2: &Word) -> Option<bool> {
        self.cognacy_decisions
            .get(&decision_key(word1, word2))
            .or_else(|| self.cognacy_decisions.get(&decision_key(word2, word1)))
            .copied()
    }

    /// Every unordered pair of varieties, the first one earlier in the
    /// project.
    pub fn variety_pairs(&self) -> Vec<VarietyPair> {
        let mut pairs = Vec::new();
        for (i, v1) in self.varieties.iter().enumerate() {
            for v2 in &self.varieties[i + 1..] {
                pairs.push(VarietyPair::new(v1.clone(), v2.clone()));
            }
        }
        pairs
    }
}

fn decision_key(word1: &Word, word2: &Word) -> (WordPairKey, String, String) {
    (
        WordPairKey {
            variety1: word1.variety().to_string(),
            variety2: word2.variety().to_string(),
            meaning: word1.meaning().to_string(),
        },
        word1.str_rep(),
        word2.str_rep(),
    )
}
