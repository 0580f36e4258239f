#![warn(clippy::large_types_passed_by_value)]

pub mod align;
pub mod cognate;
pub mod inference;
pub mod pipeline;
pub mod project;
pub mod shared;

pub use crate::align::{AlignerResult, WordAligner};
pub use crate::cognate::{CognateIdentifier, IdentifyCognates};
pub use crate::pipeline::{MultiThreadedPipeline, Pipeline, PipelineHandle, Processor};
pub use crate::project::Project;
pub use crate::shared::{
    AlignmentMode, AlineSettings, AlineSettingsBuilder, CogError, EmParameters, Segment, Variety,
    VarietyPair, Word, WordPair,
};
