//! Processors working on variety pairs: word-pair generation, sound-change
//! induction and correspondence collection.
pub mod correspondences;
pub mod em;
pub mod word_pairs;

pub use correspondences::{
    CognateIdentifierProcessor, CorrespondenceCategory, GlobalSoundCorrespondenceIdentifier,
    GlobalSoundCorrespondences, SoundCorrespondenceIdentifier,
};
pub use em::{EmSoundChangeInducer, InductionSummary, MAX_EM_ITERATIONS};
pub use word_pairs::{CognacyWordPairGenerator, SimpleWordPairGenerator};

use crate::align::AlignerResult;
use crate::shared::variety_pair::SoundChangeCounts;

/// Count every column of a two-row alignment: the correspondence seen in
/// the second word under the context of the first.
pub fn count_correspondences(counts: &mut SoundChangeCounts, result: &AlignerResult) {
    let alignment = result.alignment();
    let classes = result.contextual_sound_classes();
    for col in 0..alignment.column_count() {
        counts.increment(
            alignment.sound_context(0, col, classes),
            alignment.ngram(1, col),
        );
    }
}
