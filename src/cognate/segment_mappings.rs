//! Policies deciding whether two aligned segments count as similar.
use crate::align::WordAligner;
use crate::shared::ngram::Ngram;
use crate::shared::segment::{Segment, SegmentType};
use crate::shared::utils::FastHashMap;
use enum_dispatch::enum_dispatch;
use std::sync::Arc;

#[enum_dispatch]
pub trait MapSegments {
    /// Each target comes with the segments on its left and right.
    fn is_mapped(
        &self,
        left1: &Segment,
        target1: &Ngram,
        right1: &Segment,
        left2: &Segment,
        target2: &Ngram,
        right2: &Segment,
    ) -> bool;
}

#[enum_dispatch(MapSegments)]
#[derive(Clone, Debug)]
pub enum SegmentMappings {
    Threshold(ThresholdSegmentMappings),
    List(ListSegmentMappings),
    Type(TypeSegmentMappings),
}

/// Two segments of the same type whose feature distance is at most
/// `threshold`.
#[derive(Clone, Debug)]
pub struct ThresholdSegmentMappings {
    aligner: Arc<WordAligner>,
    threshold: i32,
}

impl ThresholdSegmentMappings {
    pub fn new(aligner: Arc<WordAligner>, threshold: i32) -> Self {
        Self { aligner, threshold }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }
}

impl MapSegments for ThresholdSegmentMappings {
    fn is_mapped(
        &self,
        _left1: &Segment,
        target1: &Ngram,
        _right1: &Segment,
        _left2: &Segment,
        target2: &Ngram,
        _right2: &Segment,
    ) -> bool {
        match (target1.first(), target2.first()) {
            (Some(s1), Some(s2)) if s1.kind() == s2.kind() => {
                self.aligner.delta(s1, s2) <= self.threshold
            }
            _ => false,
        }
    }
}

// type the neighbour on each side must have, if any
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Environment {
    left: Option<SegmentType>,
    right: Option<SegmentType>,
}

impl Environment {
    fn accepts(&self, left: &Segment, right: &Segment) -> bool {
        self.left.map_or(true, |t| t == left.kind()) && self.right.map_or(true, |t| t == right.kind())
    }
}

fn environment_type(c: char) -> Option<SegmentType> {
    match c {
        '#' => Some(SegmentType::Anchor),
        'C' => Some(SegmentType::Consonant),
        'V' => Some(SegmentType::Vowel),
        _ => None,
    }
}

/// Split `#p`, `pV`, ... into the segment and its environment. `-` and
/// `_` stand for the empty target.
fn normalize(entry: &str) -> Option<(String, Environment)> {
    if entry.is_empty() || matches!(entry, "#" | "C" | "V") {
        return None;
    }
    let mut s = entry;
    let mut env = Environment::default();
    if let Some(t) = s.chars().next().and_then(environment_type) {
        env.left = Some(t);
        s = &s[1..];
    }
    if let Some(t) = s.chars().last().and_then(environment_type) {
        env.right = Some(t);
        s = &s[..s.len() - 1];
    }
    match s {
        "" => None,
        "-" | "_" => Some(("-".to_string(), env)),
        _ => Some((s.to_string(), env)),
    }
}

/// Explicit pairs of segments, usable in both directions.
#[derive(Clone, Debug, Default)]
pub struct ListSegmentMappings {
    mappings: Vec<(String, String)>,
    lookup: FastHashMap<String, FastHashMap<String, Vec<(Environment, Environment)>>>,
}

impl ListSegmentMappings {
    pub fn new(mappings: &[(&str, &str)]) -> Self {
        let mut lookup: FastHashMap<String, FastHashMap<String, Vec<(Environment, Environment)>>> =
            FastHashMap::default();
        for (a, b) in mappings {
            // entries that are only an environment are ignored
            let (Some((s1, e1)), Some((s2, e2))) = (normalize(a), normalize(b)) else {
                continue;
            };
            lookup
                .entry(s1.clone())
                .or_default()
                .entry(s2.clone())
                .or_default()
                .push((e1, e2));
            lookup.entry(s2).or_default().entry(s1).or_default().push((e2, e1));
        }
        ListSegmentMappings {
            mappings: mappings
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            lookup,
        }
    }

    pub fn mappings(&self) -> &[(String, String)] {
        &self.mappings
    }

    fn str_reps(target: &Ngram) -> Vec<String> {
        if target.is_empty() {
            vec!["-".to_string()]
        } else {
            target.segments().iter().map(|s| s.str_rep().to_string()).collect()
        }
    }
}

impl MapSegments for ListSegmentMappings {
    fn is_mapped(
        &self,
        left1: &Segment,
        target1: &Ngram,
        right1: &Segment,
        left2: &Segment,
        target2: &Ngram,
        right2: &Segment,
    ) -> bool {
        for s1 in Self::str_reps(target1) {
            for s2 in Self::str_reps(target2) {
                if let Some(envs) = self.lookup.get(&s1).and_then(|m| m.get(&s2)) {
                    return envs
                        .iter()
                        .any(|(e1, e2)| e1.accepts(left1, right1) && e2.accepts(left2, right2));
                }
            }
        }
        false
    }
}

/// Delegates to one policy for vowels and another for consonants.
#[derive(Clone, Debug)]
pub struct TypeSegmentMappings {
    vowels: Box<SegmentMappings>,
    consonants: Box<SegmentMappings>,
}

impl TypeSegmentMappings {
    pub fn new(vowels: SegmentMappings, consonants: SegmentMappings) -> Self {
        Self {
            vowels: Box::new(vowels),
            consonants: Box::new(consonants),
        }
    }
}

impl MapSegments for TypeSegmentMappings {
    fn is_mapped(
        &self,
        left1: &Segment,
        target1: &Ngram,
        right1: &Segment,
        left2: &Segment,
        target2: &Ngram,
        right2: &Segment,
    ) -> bool {
        let kind1 = target1.first().map(|s| s.kind());
        let kind2 = target2.first().map(|s| s.kind());
        // an empty side takes the type of the other one
        let kind = match (kind1, kind2) {
            (Some(a), Some(b)) if a != b => return false,
            (Some(a), _) | (None, Some(a)) => a,
            (None, None) => return false,
        };
        let policy = match kind {
            SegmentType::Vowel => &self.vowels,
            SegmentType::Consonant => &self.consonants,
            _ => return false,
        };
        policy.is_mapped(left1, target1, right1, left2, target2, right2)
    }
}
