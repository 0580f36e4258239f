use crate::align::AlignerResult;
use crate::cognate::IdentifyCognates;
use crate::shared::ngram::Ngram;
use crate::shared::sound_class::SoundClass;
use crate::shared::variety_pair::{CognacyDecision, VarietyPair};

/// Compares consonants through coarse sound classes. Words agreeing on
/// every consonant, or on enough consonants before the first mismatch, are
/// cognate.
#[derive(Clone, Debug)]
pub struct DolgopolskyCognateIdentifier {
    pub sound_classes: Vec<SoundClass>,
    pub initial_equivalence_threshold: usize,
}

impl DolgopolskyCognateIdentifier {
    pub fn new(sound_classes: Vec<SoundClass>, initial_equivalence_threshold: usize) -> Self {
        Self {
            sound_classes,
            initial_equivalence_threshold,
        }
    }
}

impl IdentifyCognates for DolgopolskyCognateIdentifier {
    fn decide(&self, _pair: &VarietyPair, result: &AlignerResult) -> CognacyDecision {
        let alignment = result.alignment();
        let mut notes = Vec::with_capacity(alignment.column_count());
        let mut initial_equivalent = 0;
        let mut mismatch = false;
        for col in 0..alignment.column_count() {
            let u = alignment.ngram(0, col);
            let v = alignment.ngram(1, col);
            let vowel = |n: &Ngram| n.first().is_some_and(|s| s.is_vowel());
            if vowel(&u) || vowel(&v) {
                notes.push("X".to_string());
                continue;
            }
            let equivalent = u.to_string() == v.to_string() || {
                let sc1 = alignment.matching_sound_class(0, col, &self.sound_classes);
                let sc2 = alignment.matching_sound_class(1, col, &self.sound_classes);
                matches!((sc1, sc2), (Some(a), Some(b)) if a.name() == b.name())
            };
            if equivalent {
                notes.push("1".to_string());
                if !mismatch {
                    initial_equivalent += 1;
                }
            } else {
                notes.push("0".to_string());
                mismatch = true;
            }
        }
        let columns = alignment.column_count();
        CognacyDecision {
            predicted: !mismatch || initial_equivalent >= self.initial_equivalence_threshold,
            score: if columns == 0 {
                0.
            } else {
                initial_equivalent as f64 / columns as f64
            },
            notes,
        }
    }
}
