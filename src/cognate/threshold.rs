use crate::align::AlignerResult;
use crate::cognate::IdentifyCognates;
use crate::shared::variety_pair::{CognacyDecision, VarietyPair};

/// Cognate when the normalized alignment score reaches the threshold.
#[derive(Clone, Debug)]
pub struct ThresholdCognateIdentifier {
    pub threshold: f64,
}

impl ThresholdCognateIdentifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdCognateIdentifier {
    fn default() -> Self {
        Self { threshold: 0.7 }
    }
}

impl IdentifyCognates for ThresholdCognateIdentifier {
    fn decide(&self, _pair: &VarietyPair, result: &AlignerResult) -> CognacyDecision {
        let score = result.normalized_score();
        CognacyDecision {
            predicted: score >= self.threshold,
            score,
            notes: Vec::new(),
        }
    }
}
