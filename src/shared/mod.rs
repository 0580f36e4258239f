//! Data model shared by the aligner, the cognate identifiers and the
//! inference processors.
pub mod alignment;
pub mod distributions;
pub mod errors;
pub mod ngram;
pub mod parameters;
pub mod segment;
pub mod sound_class;
pub mod utils;
pub mod variety_pair;
pub mod word;

pub use alignment::{Alignment, AlignmentCell};
pub use distributions::{
    ConditionalFrequencyDistribution, ConditionalProbabilityDistribution, FrequencyDistribution,
    WittenBellProbabilityDistribution,
};
pub use errors::CogError;
pub use ngram::Ngram;
pub use parameters::{AlignmentMode, AlineSettings, AlineSettingsBuilder, EmParameters};
pub use segment::{
    FeatureBundle, FeatureSystem, Segment, SegmentPool, SegmentType, SyllablePosition,
    SymbolicFeature,
};
pub use sound_class::{SoundClass, SoundContext};
pub use variety_pair::{
    CognacyDecision, SoundChangeCounts, SoundChangeProbabilities, SoundCorrespondence,
    SoundCorrespondenceCollection, VarietyPair, WordPair, WordPairKey,
};
pub use word::{Node, Phone, Variety, Word};
