//! Word alignment: the ALINE scorer and the searches driven by it.
pub mod aligner;
pub mod multiple;
pub mod pairwise;
pub mod scorer;

pub use aligner::{AlignerResult, WordAligner};
pub use scorer::{delta, AlineScorer, Scorer};
