//! Expectation-maximization of the sound-change model of a variety pair.
use crate::align::WordAligner;
use crate::cognate::{align_word_pairs, CognateIdentifier, IdentifyCognates};
use crate::inference::count_correspondences;
use crate::pipeline::Processor;
use crate::project::Project;
use crate::shared::parameters::EmParameters;
use crate::shared::variety_pair::{SoundChangeCounts, SoundChangeProbabilities, VarietyPair};
use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;

/// Hard cap on the number of iterations, whatever the parameters say.
pub const MAX_EM_ITERATIONS: usize = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InductionSummary {
    pub iterations: usize,
    pub converged: bool,
}

/// Alternates between counting correspondences in the pairs believed
/// cognate (E-step) and refitting the Witten-Bell smoothed model on those
/// counts (M-step).
///
/// The first iteration has no model yet: it counts every pair whose
/// alignment clears `initial_alignment_threshold`. Later iterations relabel
/// the pairs with the cognate identifier and count the predicted cognates.
pub struct EmSoundChangeInducer {
    project: Arc<Project>,
    aligner_id: String,
    cognate_identifier_id: String,
    params: EmParameters,
}

impl EmSoundChangeInducer {
    pub fn new(
        project: Arc<Project>,
        aligner_id: &str,
        cognate_identifier_id: &str,
        params: EmParameters,
    ) -> EmSoundChangeInducer {
        EmSoundChangeInducer {
            project,
            aligner_id: aligner_id.to_string(),
            cognate_identifier_id: cognate_identifier_id.to_string(),
            params,
        }
    }

    pub fn params(&self) -> &EmParameters {
        &self.params
    }

    /// Fit the sound-change model of `pair` from scratch.
    pub fn induce(&self, pair: &mut VarietyPair) -> Result<InductionSummary> {
        let aligner = self.project.aligner(&self.aligner_id)?;
        let identifier = self.project.cognate_identifier(&self.cognate_identifier_id)?;
        let max_iterations = self.params.max_iterations.min(MAX_EM_ITERATIONS);

        pair.sound_change_probability_distribution = None;
        for iteration in 1..=max_iterations {
            self.expectation(aligner, identifier, pair)?;
            let converged = self.maximization(aligner, pair)?;
            debug!(
                "{} - {}: iteration {}, {} conditions, converged: {}",
                pair.variety1.name(),
                pair.variety2.name(),
                iteration,
                pair.sound_change_frequency_distribution.len(),
                converged
            );
            if converged {
                return Ok(InductionSummary {
                    iterations: iteration,
                    converged: true,
                });
            }
        }
        warn!(
            "{} - {}: no convergence after {} iterations",
            pair.variety1.name(),
            pair.variety2.name(),
            max_iterations
        );
        Ok(InductionSummary {
            iterations: max_iterations,
            converged: false,
        })
    }

    fn expectation(
        &self,
        aligner: &WordAligner,
        identifier: &CognateIdentifier,
        pair: &mut VarietyPair,
    ) -> Result<()> {
        let bootstrap = pair.sound_change_probability_distribution.is_none();
        let results = align_word_pairs(aligner, pair)?;
        let decisions: Vec<_> = if bootstrap {
            Vec::new()
        } else {
            identifier.decide_all(pair, &results)
        };

        let mut counts = SoundChangeCounts::new();
        let mut decisions = decisions.into_iter();
        for (wp, result) in pair.word_pairs.iter_mut().zip(&results) {
            wp.phonetic_similarity_score = result.normalized_score();
            let include = match decisions.next() {
                Some(decision) => {
                    wp.apply(decision);
                    wp.predicted_cognacy
                }
                None => result.normalized_score() >= self.params.initial_alignment_threshold,
            };
            if include {
                count_correspondences(&mut counts, result);
            }
        }
        pair.sound_change_frequency_distribution = counts;
        if bootstrap {
            // predictions only exist from the second iteration on
            pair.update_phonetic_similarity_score();
        } else {
            pair.update_similarity_scores();
        }
        Ok(())
    }

    /// Refit and commit the model. True when it did not move since the
    /// previous iteration.
    fn maximization(&self, aligner: &WordAligner, pair: &mut VarietyPair) -> Result<bool> {
        let segment_count = pair.variety2.segment_count();
        let possible_correspondences = if aligner.expansion_compression_enabled() {
            segment_count * segment_count + segment_count + 1
        } else {
            segment_count + 1
        };
        let cpd = SoundChangeProbabilities::witten_bell(
            &pair.sound_change_frequency_distribution,
            possible_correspondences,
        )?;
        let converged = pair
            .sound_change_probability_distribution
            .as_ref()
            .is_some_and(|previous| previous.similar_to(&cpd, self.params.convergence_tolerance));
        pair.sound_change_probability_distribution = Some(cpd);
        pair.default_correspondence_probability = 1. / possible_correspondences as f64;
        Ok(converged)
    }
}

impl Processor<VarietyPair> for EmSoundChangeInducer {
    fn process(&self, pair: &mut VarietyPair) -> Result<()> {
        self.induce(pair)?;
        Ok(())
    }
}
