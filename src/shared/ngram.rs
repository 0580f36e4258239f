use crate::shared::segment::Segment;
use std::fmt;
use std::sync::Arc;

/// Zero, one or two segments treated as a single alignment unit. The empty
/// ngram stands for an insertion or a deletion.
/// ```
/// use cog_align::shared::{Ngram, Segment};
/// assert_eq!(Ngram::empty().to_string(), "-");
/// assert_eq!(Ngram::from(Segment::anchor()).to_string(), "#");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ngram {
    segments: Vec<Arc<Segment>>,
}

impl Ngram {
    pub fn empty() -> Ngram {
        Ngram::default()
    }

    pub fn new(segments: Vec<Arc<Segment>>) -> Ngram {
        Ngram { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&Arc<Segment>> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Arc<Segment>> {
        self.segments.last()
    }

    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }
}

impl From<Arc<Segment>> for Ngram {
    fn from(segment: Arc<Segment>) -> Ngram {
        Ngram {
            segments: vec![segment],
        }
    }
}

impl fmt::Display for Ngram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "-");
        }
        for s in &self.segments {
            write!(f, "{}", s.str_rep())?;
        }
        Ok(())
    }
}
