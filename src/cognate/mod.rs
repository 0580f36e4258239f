//! Cognate identifiers: interchangeable policies labelling word pairs from
//! their alignments.
pub mod blair;
pub mod dolgopolsky;
pub mod segment_mappings;
pub mod threshold;

pub use blair::BlairCognateIdentifier;
pub use dolgopolsky::DolgopolskyCognateIdentifier;
pub use segment_mappings::{
    ListSegmentMappings, MapSegments, SegmentMappings, ThresholdSegmentMappings,
    TypeSegmentMappings,
};
pub use threshold::ThresholdCognateIdentifier;

use crate::align::{AlignerResult, WordAligner};
use crate::shared::variety_pair::{CognacyDecision, VarietyPair, WordPair};
use anyhow::Result;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait IdentifyCognates {
    /// Label one alignment of a word pair of `pair`.
    fn decide(&self, pair: &VarietyPair, result: &AlignerResult) -> CognacyDecision;

    /// Label a batch of alignments of `pair`, in order.
    fn decide_all(&self, pair: &VarietyPair, results: &[AlignerResult]) -> Vec<CognacyDecision> {
        results.iter().map(|r| self.decide(pair, r)).collect()
    }

    fn update_cognacy(&self, pair: &VarietyPair, word_pair: &mut WordPair, result: &AlignerResult) {
        word_pair.apply(self.decide(pair, result));
    }

    /// Realign and relabel every word pair of `pair`, then refresh its
    /// similarity scores.
    fn update_variety_pair(&self, aligner: &WordAligner, pair: &mut VarietyPair) -> Result<()> {
        let results = align_word_pairs(aligner, pair)?;
        let decisions = self.decide_all(pair, &results);
        apply_decisions(pair, &results, decisions);
        Ok(())
    }
}

#[enum_dispatch(IdentifyCognates)]
#[derive(Clone, Debug)]
pub enum CognateIdentifier {
    Threshold(ThresholdCognateIdentifier),
    Dolgopolsky(DolgopolskyCognateIdentifier),
    Blair(BlairCognateIdentifier),
}

pub(crate) fn align_word_pairs(
    aligner: &WordAligner,
    pair: &VarietyPair,
) -> Result<Vec<AlignerResult>> {
    pair.word_pairs
        .iter()
        .map(|wp| aligner.compute_word_pair(pair, wp))
        .collect()
}

pub(crate) fn apply_decisions(
    pair: &mut VarietyPair,
    results: &[AlignerResult],
    decisions: Vec<CognacyDecision>,
) {
    for ((wp, r), d) in pair.word_pairs.iter_mut().zip(results).zip(decisions) {
        wp.phonetic_similarity_score = r.normalized_score();
        wp.apply(d);
    }
    pair.update_similarity_scores();
}
