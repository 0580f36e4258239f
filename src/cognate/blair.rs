use crate::align::AlignerResult;
use crate::cognate::segment_mappings::{MapSegments, SegmentMappings};
use crate::cognate::IdentifyCognates;
use crate::shared::ngram::Ngram;
use crate::shared::segment::SegmentType;
use crate::shared::sound_class::SoundContext;
use crate::shared::utils::FastHashSet;
use crate::shared::variety_pair::{CognacyDecision, SoundChangeCounts, VarietyPair};

/// A correspondence is regular once it was seen this many times.
pub const REGULAR_CORRESPONDENCE_THRESHOLD: usize = 3;

/// Correspondences frequent enough in a variety pair to count as regular.
#[derive(Clone, Debug, Default)]
pub struct RegularCorrespondences {
    regular: FastHashSet<(SoundContext, Ngram)>,
}

impl RegularCorrespondences {
    pub fn from_counts(counts: &SoundChangeCounts) -> Self {
        let regular = counts
            .iter()
            .flat_map(|(ctx, fd)| {
                fd.iter()
                    .filter(|(_, c)| *c >= REGULAR_CORRESPONDENCE_THRESHOLD)
                    .map(move |(corr, _)| (ctx.clone(), corr.clone()))
            })
            .collect();
        RegularCorrespondences { regular }
    }

    pub fn contains(&self, context: &SoundContext, correspondence: &Ngram) -> bool {
        self.regular
            .contains(&(context.clone(), correspondence.clone()))
    }

    pub fn len(&self) -> usize {
        self.regular.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_empty()
    }
}

/// Sorts the columns into identical or regular (1), similar (2) and
/// unrelated (3). Cognate when at least half are of type 1 and three
/// quarters of type 1 or 2. Ignored columns do not count.
#[derive(Clone, Debug)]
pub struct BlairCognateIdentifier {
    pub ignore_regular_insertion_deletion: bool,
    // regular consonant correspondences are type 1 even when not similar
    pub regular_consonants_equal: bool,
    pub ignored_mappings: SegmentMappings,
    pub similar_segments: SegmentMappings,
}

impl BlairCognateIdentifier {
    pub fn new(
        ignore_regular_insertion_deletion: bool,
        regular_consonants_equal: bool,
        ignored_mappings: SegmentMappings,
        similar_segments: SegmentMappings,
    ) -> Self {
        Self {
            ignore_regular_insertion_deletion,
            regular_consonants_equal,
            ignored_mappings,
            similar_segments,
        }
    }

    /// Category of every column, 0 for ignored ones.
    pub fn categories(&self, regular: &RegularCorrespondences, result: &AlignerResult) -> Vec<u8> {
        let alignment = result.alignment();
        (0..alignment.column_count())
            .map(|col| {
                let (ul, u, ur) = alignment.environment(0, col);
                let (vl, v, vr) = alignment.environment(1, col);
                let context = alignment.sound_context(0, col, result.contextual_sound_classes());
                let is_regular = regular.contains(&context, &v);
                let similar = || self.similar_segments.is_mapped(&ul, &u, &ur, &vl, &v, &vr);
                let kind = |n: &Ngram| n.first().map(|s| s.kind());
                if u == v {
                    1
                } else if self.ignored_mappings.is_mapped(&ul, &u, &ur, &vl, &v, &vr) {
                    0
                } else if u.is_empty() || v.is_empty() {
                    if similar() {
                        1
                    } else if self.ignore_regular_insertion_deletion && is_regular {
                        0
                    } else {
                        3
                    }
                } else {
                    match (kind(&u), kind(&v)) {
                        (Some(SegmentType::Vowel), Some(SegmentType::Vowel)) => {
                            if similar() {
                                1
                            } else {
                                2
                            }
                        }
                        (Some(SegmentType::Consonant), Some(SegmentType::Consonant)) => {
                            if self.regular_consonants_equal {
                                if is_regular {
                                    1
                                } else if similar() {
                                    2
                                } else {
                                    3
                                }
                            } else if similar() {
                                if is_regular {
                                    1
                                } else {
                                    2
                                }
                            } else {
                                3
                            }
                        }
                        _ => 3,
                    }
                }
            })
            .collect()
    }

    pub fn decide_with(&self, regular: &RegularCorrespondences, result: &AlignerResult) -> CognacyDecision {
        let categories = self.categories(regular, result);
        let total = categories.iter().filter(|&&c| c > 0).count();
        let cat1 = categories.iter().filter(|&&c| c == 1).count();
        let cat12 = categories.iter().filter(|&&c| c == 1 || c == 2).count();
        let notes = categories
            .iter()
            .map(|c| if *c == 0 { "-".to_string() } else { c.to_string() })
            .collect();
        if total == 0 {
            return CognacyDecision {
                predicted: false,
                score: 0.,
                notes,
            };
        }
        let type1 = cat1 as f64 / total as f64;
        let type12 = cat12 as f64 / total as f64;
        CognacyDecision {
            predicted: type1 >= 0.5 && type12 >= 0.75,
            score: type1 * 0.75 + type12 * 0.25,
            notes,
        }
    }
}

impl IdentifyCognates for BlairCognateIdentifier {
    fn decide(&self, pair: &VarietyPair, result: &AlignerResult) -> CognacyDecision {
        let regular = RegularCorrespondences::from_counts(&pair.sound_change_frequency_distribution);
        self.decide_with(&regular, result)
    }

    fn decide_all(&self, pair: &VarietyPair, results: &[AlignerResult]) -> Vec<CognacyDecision> {
        // one table for the whole batch
        let regular = RegularCorrespondences::from_counts(&pair.sound_change_frequency_distribution);
        results.iter().map(|r| self.decide_with(&regular, r)).collect()
    }
}
