//! Building the word pairs of a variety pair, one per shared meaning.
use crate::align::{AlignerResult, WordAligner};
use crate::cognate::{IdentifyCognates, ThresholdCognateIdentifier};
use crate::inference::count_correspondences;
use crate::pipeline::Processor;
use crate::project::Project;
use crate::shared::errors::CogError;
use crate::shared::variety_pair::{CognacyDecision, SoundChangeCounts, VarietyPair, WordPair};
use crate::shared::word::{Variety, Word};
use anyhow::Result;
use itertools::iproduct;
use log::debug;
use std::sync::Arc;

/// Words of both varieties for `meaning` that have something to align.
fn candidates(pair: &VarietyPair, meaning: &str) -> (Vec<Arc<Word>>, Vec<Arc<Word>>) {
    let pick = |v: &Variety| {
        v.words_for(meaning)
            .into_iter()
            .filter(|w| w.has_stem_nodes())
            .cloned()
            .collect::<Vec<_>>()
    };
    (pick(&pair.variety1), pick(&pair.variety2))
}

fn align_candidates(
    aligner: &WordAligner,
    pair: &VarietyPair,
    words1: &[Arc<Word>],
    words2: &[Arc<Word>],
) -> Result<Vec<AlignerResult>> {
    iproduct!(words1.iter(), words2.iter())
        .map(|(w1, w2)| aligner.compute(Some(pair), w1, w2))
        .collect()
}

/// Index of the first result with the highest raw score.
fn best_raw_index(results: &[AlignerResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, r) in results.iter().enumerate() {
        match best {
            Some(b) if results[b].best_raw_score() >= r.best_raw_score() => {}
            _ => best = Some(i),
        }
    }
    best
}

fn new_word_pair(project: &Project, result: &AlignerResult) -> WordPair {
    let words = result.words();
    let mut wp = WordPair::new(words[0].clone(), words[1].clone());
    wp.actual_cognacy = project.cognacy_decision(&words[0], &words[1]);
    wp.phonetic_similarity_score = result.normalized_score();
    wp
}

/// Pairs, for each meaning, the two words with the best raw alignment
/// score. Pairs clearing the threshold are predicted cognate and their
/// alignments make up the correspondence counts.
pub struct SimpleWordPairGenerator {
    project: Arc<Project>,
    aligner_id: String,
    identifier: ThresholdCognateIdentifier,
}

impl SimpleWordPairGenerator {
    pub fn new(
        project: Arc<Project>,
        aligner_id: &str,
        initial_alignment_threshold: f64,
    ) -> SimpleWordPairGenerator {
        SimpleWordPairGenerator {
            project,
            aligner_id: aligner_id.to_string(),
            identifier: ThresholdCognateIdentifier::new(initial_alignment_threshold),
        }
    }
}

impl Processor<VarietyPair> for SimpleWordPairGenerator {
    fn process(&self, pair: &mut VarietyPair) -> Result<()> {
        let aligner = self.project.aligner(&self.aligner_id)?;
        let variety1 = pair.variety1.clone();

        let mut chosen = Vec::new();
        for meaning in variety1.meanings() {
            let (words1, words2) = candidates(pair, meaning);
            if words1.is_empty() || words2.is_empty() {
                continue;
            }
            let mut results = align_candidates(aligner, pair, &words1, &words2)?;
            if let Some(best) = best_raw_index(&results) {
                chosen.push(results.swap_remove(best));
            }
        }

        let mut counts = SoundChangeCounts::new();
        let mut word_pairs = Vec::with_capacity(chosen.len());
        for result in &chosen {
            let mut wp = new_word_pair(&self.project, result);
            wp.apply(self.identifier.decide(pair, result));
            if wp.cognacy() {
                count_correspondences(&mut counts, result);
            }
            word_pairs.push(wp);
        }
        debug!(
            "{} - {}: {} word pairs",
            pair.variety1.name(),
            pair.variety2.name(),
            word_pairs.len()
        );
        pair.word_pairs = word_pairs;
        pair.sound_change_frequency_distribution = counts;
        pair.update_similarity_scores();
        Ok(())
    }
}

struct MeaningCandidates {
    meaning: String,
    results: Vec<AlignerResult>,
    // several words on both sides
    ambiguous: bool,
    choice: usize,
}

impl MeaningCandidates {
    fn chosen(&self) -> &AlignerResult {
        &self.results[self.choice]
    }
}

/// Pairs words the way a cognate identifier would. When both varieties
/// have several words for a meaning, the candidate is picked with the
/// identifier itself, one ambiguous meaning at a time, under the counts of
/// everything chosen so far plus the best guesses for the meanings still
/// open.
pub struct CognacyWordPairGenerator {
    project: Arc<Project>,
    aligner_id: String,
    cognate_identifier_id: String,
    initial_alignment_threshold: f64,
}

impl CognacyWordPairGenerator {
    pub fn new(
        project: Arc<Project>,
        aligner_id: &str,
        cognate_identifier_id: &str,
        initial_alignment_threshold: f64,
    ) -> CognacyWordPairGenerator {
        CognacyWordPairGenerator {
            project,
            aligner_id: aligner_id.to_string(),
            cognate_identifier_id: cognate_identifier_id.to_string(),
            initial_alignment_threshold,
        }
    }

    /// Whether an alignment feeds the correspondence counts. A user
    /// decision can only add a pair, never remove one that clears the
    /// threshold.
    fn counts_toward_model(&self, result: &AlignerResult) -> bool {
        let words = result.words();
        self.project.cognacy_decision(&words[0], &words[1]) == Some(true)
            || result.normalized_score() >= self.initial_alignment_threshold
    }

    fn add_counts(&self, counts: &mut SoundChangeCounts, result: &AlignerResult) {
        if self.counts_toward_model(result) {
            count_correspondences(counts, result);
        }
    }
}

fn is_better(decision: &CognacyDecision, phonetic: f64, best: &(usize, CognacyDecision, f64)) -> bool {
    (decision.predicted, decision.score, phonetic) > (best.1.predicted, best.1.score, best.2)
}

impl Processor<VarietyPair> for CognacyWordPairGenerator {
    fn process(&self, pair: &mut VarietyPair) -> Result<()> {
        let aligner = self.project.aligner(&self.aligner_id)?;
        let identifier = self.project.cognate_identifier(&self.cognate_identifier_id)?;
        let variety1 = pair.variety1.clone();

        let mut meanings = Vec::new();
        for meaning in variety1.meanings() {
            let (words1, words2) = candidates(pair, meaning);
            if words1.is_empty() || words2.is_empty() {
                continue;
            }
            let results = align_candidates(aligner, pair, &words1, &words2)?;
            let choice = best_raw_index(&results)
                .ok_or_else(|| CogError::UnresolvedAmbiguity(meaning.to_string()))?;
            meanings.push(MeaningCandidates {
                meaning: meaning.to_string(),
                results,
                ambiguous: words1.len() > 1 && words2.len() > 1,
                choice,
            });
        }

        let mut committed = SoundChangeCounts::new();
        for m in meanings.iter().filter(|m| !m.ambiguous) {
            self.add_counts(&mut committed, m.chosen());
        }

        let ambiguous: Vec<usize> = (0..meanings.len())
            .filter(|&i| meanings[i].ambiguous)
            .collect();
        for (k, &slot) in ambiguous.iter().enumerate() {
            let mut snapshot = committed.clone();
            for &later in &ambiguous[k + 1..] {
                self.add_counts(&mut snapshot, meanings[later].chosen());
            }

            let mut best: Option<(usize, CognacyDecision, f64)> = None;
            for (c, candidate) in meanings[slot].results.iter().enumerate() {
                let mut counts = snapshot.clone();
                self.add_counts(&mut counts, candidate);
                pair.sound_change_frequency_distribution = counts;
                let decision = identifier.decide(pair, candidate);
                let phonetic = candidate.normalized_score();
                if best
                    .as_ref()
                    .map_or(true, |b| is_better(&decision, phonetic, b))
                {
                    best = Some((c, decision, phonetic));
                }
            }
            let (choice, ..) = best
                .ok_or_else(|| CogError::UnresolvedAmbiguity(meanings[slot].meaning.clone()))?;
            debug!(
                "Ambiguous meaning `{}` resolved to candidate {}",
                meanings[slot].meaning, choice
            );
            meanings[slot].choice = choice;
            self.add_counts(&mut committed, meanings[slot].chosen());
        }

        pair.sound_change_frequency_distribution = committed;
        let chosen: Vec<AlignerResult> = meanings.iter().map(|m| m.chosen().clone()).collect();
        let decisions = identifier.decide_all(pair, &chosen);
        let mut word_pairs = Vec::with_capacity(chosen.len());
        for (result, decision) in chosen.iter().zip(decisions) {
            let mut wp = new_word_pair(&self.project, result);
            wp.apply(decision);
            word_pairs.push(wp);
        }
        debug!(
            "{} - {}: {} word pairs, {} ambiguous",
            pair.variety1.name(),
            pair.variety2.name(),
            word_pairs.len(),
            ambiguous.len()
        );
        pair.word_pairs = word_pairs;
        pair.update_similarity_scores();
        Ok(())
    }
}
