//! Errors that callers are expected to match on.
//! Everything else travels as a plain `anyhow::Error`.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CogError {
    /// The aligner already produced results with its current settings.
    #[error("aligner settings are frozen after the first alignment was computed")]
    SettingsFrozen,
    #[error("no aligner registered under the id `{0}`")]
    UnknownAligner(String),
    #[error("no cognate identifier registered under the id `{0}`")]
    UnknownCognateIdentifier(String),
    #[error("invalid scoring settings: {0}")]
    InvalidSettings(String),
    #[error("the word `{0}` has no stem segments to align")]
    EmptyStem(String),
    /// Ambiguous meanings always have candidates on both sides, so this is a bug.
    #[error("no candidate alignment left for the ambiguous meaning `{0}`")]
    UnresolvedAmbiguity(String),
}
