//! Sound classes and the sound contexts built from them.
use crate::shared::ngram::Ngram;
use crate::shared::segment::{FeatureBundle, Segment, SegmentType, ANCHOR_STR};
use crate::shared::word::{Node, Word};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named predicate over segments in context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SoundClass {
    /// Every segment of the given type whose feature values are all
    /// allowed by `features`.
    Natural {
        name: String,
        kind: Option<SegmentType>,
        features: FeatureBundle,
    },
    /// An explicit list of segments. `#x` only matches `x` at the start of
    /// a stem, `x#` at its end and `#` the word boundary itself.
    Unnatural { name: String, members: Vec<String> },
}

impl SoundClass {
    pub fn natural(name: &str, kind: Option<SegmentType>, features: FeatureBundle) -> SoundClass {
        SoundClass::Natural {
            name: name.to_string(),
            kind,
            features,
        }
    }

    pub fn unnatural(name: &str, members: &[&str]) -> SoundClass {
        SoundClass::Unnatural {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SoundClass::Natural { name, .. } | SoundClass::Unnatural { name, .. } => name,
        }
    }

    pub fn matches(&self, left: &Segment, target: &Ngram, right: &Segment) -> bool {
        match self {
            SoundClass::Natural { kind, features, .. } => {
                let segment = match target.segments() {
                    [s] if s.kind().is_segmental() => s,
                    _ => return false,
                };
                if kind.is_some_and(|k| k != segment.kind()) {
                    return false;
                }
                features.iter().all(|(feature, allowed)| {
                    segment
                        .features()
                        .values(feature)
                        .is_some_and(|vals| vals.iter().all(|v| allowed.contains(v)))
                })
            }
            SoundClass::Unnatural { members, .. } => {
                let t = target.to_string();
                let has = |s: &str| members.iter().any(|m| m == s);
                if has(&t) {
                    return true;
                }
                (left.kind() == SegmentType::Anchor && has(&format!("{}{}", ANCHOR_STR, t)))
                    || (right.kind() == SegmentType::Anchor
                        && has(&format!("{}{}", t, ANCHOR_STR)))
            }
        }
    }

    /// First class of `classes` that matches `node` of `word`, looking at
    /// the node's own neighbours. The word boundary is its own target.
    pub fn first_match<'a>(
        classes: &'a [SoundClass],
        word: &Word,
        node: Node,
    ) -> Option<&'a SoundClass> {
        let (left, right) = match node {
            Node::Anchor => (Segment::anchor(), Segment::anchor()),
            Node::Phone(i) => (
                word.node_segment(word.left_of(i)),
                word.node_segment(word.right_of(i)),
            ),
        };
        let target = Ngram::from(word.node_segment(node));
        classes.iter().find(|c| c.matches(&left, &target, &right))
    }
}

/// Condition of a sound correspondence: a target plus the names of the
/// sound classes matched on each side, if any.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundContext {
    pub left: Option<String>,
    pub target: Ngram,
    pub right: Option<String>,
}

impl SoundContext {
    pub fn new(left: Option<&SoundClass>, target: Ngram, right: Option<&SoundClass>) -> SoundContext {
        SoundContext {
            left: left.map(|c| c.name().to_string()),
            target,
            right: right.map(|c| c.name().to_string()),
        }
    }

    /// Context of `target` placed between the nodes `left` and `right` of `word`.
    pub fn in_word(
        classes: &[SoundClass],
        word: &Word,
        left: Node,
        target: Ngram,
        right: Node,
    ) -> SoundContext {
        SoundContext::new(
            SoundClass::first_match(classes, word, left),
            target,
            SoundClass::first_match(classes, word, right),
        )
    }
}

impl fmt::Display for SoundContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if self.left.is_some() || self.right.is_some() {
            write!(f, " -> ? / ")?;
            if let Some(l) = &self.left {
                write!(f, "[{}]", l)?;
            }
            write!(f, "_")?;
            if let Some(r) = &self.right {
                write!(f, "[{}]", r)?;
            }
        }
        Ok(())
    }
}
