//! Feature-weighted scoring of the alignment operations.
use crate::shared::ngram::Ngram;
use crate::shared::parameters::AlineSettings;
use crate::shared::segment::{FeatureBundle, Segment};
use crate::shared::sound_class::SoundContext;
use crate::shared::utils::round_even;
use crate::shared::variety_pair::VarietyPair;
use crate::shared::word::{Node, Word};

/// Cost model consumed by the alignment search. Positions are phone
/// indices in the first (`p`) and second (`q`) word. `None` stands for
/// "before the first node" when an insertion or deletion happens at the
/// start of a word.
pub trait Scorer {
    fn insertion_score(&self, p: Option<usize>, q: usize) -> i32;
    fn deletion_score(&self, p: usize, q: Option<usize>) -> i32;
    fn substitution_score(&self, p: usize, q: usize) -> i32;
    /// `p` aligned with `q1 q2`.
    fn expansion_score(&self, p: usize, q1: usize, q2: usize) -> i32;
    /// `p1 p2` aligned with `q`.
    fn compression_score(&self, p1: usize, p2: usize, q: usize) -> i32;
    /// Best score a node of the first word can contribute.
    fn max_score1(&self, p: usize) -> i32;
    /// Best score a node of the second word can contribute.
    fn max_score2(&self, q: usize) -> i32;
}

/// Feature-weighted distance between two segments. Vowels are compared on
/// the vowel features, anything else on the consonant features.
pub fn delta(settings: &AlineSettings, s1: &Segment, s2: &Segment) -> i32 {
    let features = if s1.is_vowel() && s2.is_vowel() {
        settings.relevant_vowel_features()
    } else {
        settings.relevant_consonant_features()
    };
    features
        .iter()
        .map(|f| diff(settings, f, s1.features(), s2.features()) * settings.feature_weight(f))
        .sum()
}

fn diff(settings: &AlineSettings, feature: &str, fs1: &FeatureBundle, fs2: &FeatureBundle) -> i32 {
    let (v1, v2) = (fs1.values(feature), fs2.values(feature));
    if v1.is_none() && v2.is_none() {
        return 0;
    }
    // a missing value can be any symbol of the feature
    let all: Vec<String> = settings
        .feature_system()
        .feature(feature)
        .map(|f| f.symbols.clone())
        .unwrap_or_default();
    let mut values1 = v1.unwrap_or(&all);
    let mut values2 = v2.unwrap_or(&all);
    if values1.is_empty() || values2.is_empty() {
        return 0;
    }
    // average over the larger set so the result does not depend on the order
    if values1.len() < values2.len() {
        std::mem::swap(&mut values1, &mut values2);
    }
    let sum: i32 = values1
        .iter()
        .map(|a| {
            let ma = settings.value_metric(a);
            values2
                .iter()
                .map(|b| (ma - settings.value_metric(b)).abs())
                .min()
                .unwrap_or(0)
        })
        .sum();
    round_even(sum as f64 / values1.len() as f64)
}

/// ALINE-style scorer for one pair of words, optionally biased by the
/// sound-change model of their variety pair.
pub struct AlineScorer<'a> {
    settings: &'a AlineSettings,
    word1: &'a Word,
    word2: &'a Word,
    pair: Option<&'a VarietyPair>,
}

impl<'a> AlineScorer<'a> {
    pub fn new(
        settings: &'a AlineSettings,
        word1: &'a Word,
        word2: &'a Word,
        pair: Option<&'a VarietyPair>,
    ) -> AlineScorer<'a> {
        AlineScorer {
            settings,
            word1,
            word2,
            pair,
        }
    }

    fn vowel_cost(&self, segment: &Segment) -> i32 {
        if segment.is_vowel() {
            self.settings.vowel_cost()
        } else {
            0
        }
    }

    fn syllable_position_cost(&self, p: usize, q: usize) -> i32 {
        if !self.settings.syllable_position_cost_enabled() {
            return 0;
        }
        match (self.word1.phone(p).position, self.word2.phone(q).position) {
            (Some(a), Some(b)) if a != b => self.settings.syllable_position_cost(),
            _ => 0,
        }
    }

    fn delta(&self, p: usize, q: usize) -> i32 {
        delta(self.settings, self.word1.segment(p), self.word2.segment(q))
    }

    /// The fitted model, when it can bias this pair of words.
    fn model(&self) -> Option<&'a VarietyPair> {
        let pair = self.pair?;
        if !self.settings.sound_change_scoring_enabled()
            || self.word1.variety() == self.word2.variety()
            || pair.sound_change_probability_distribution.is_none()
        {
            return None;
        }
        Some(pair)
    }

    /// Bonus for the correspondence `p1 p2` -> `q1 q2`. A missing `p1`
    /// means an empty target located after `p2`, and likewise for `q1`.
    fn sound_change_score(
        &self,
        p1: Option<usize>,
        p2: Option<usize>,
        q1: Option<usize>,
        q2: Option<usize>,
    ) -> i32 {
        let Some(pair) = self.model() else {
            return 0;
        };
        // the target always comes from the first variety of the pair
        let (w1, p1, p2, w2, q1, q2) = if self.word1.variety() == pair.variety2.name() {
            (self.word2, q1, q2, self.word1, p1, p2)
        } else {
            (self.word1, p1, p2, self.word2, q1, q2)
        };
        let (target, left, right) = match p1 {
            None => (
                Ngram::empty(),
                p2.map_or(Node::Anchor, Node::Phone),
                p2.map_or(w1.first_node(), |p| w1.right_of(p)),
            ),
            Some(a) => {
                let nodes: Vec<usize> = std::iter::once(a).chain(p2).collect();
                (w1.ngram(&nodes), w1.left_of(a), w1.right_of(p2.unwrap_or(a)))
            }
        };
        let corr = match q1 {
            None => Ngram::empty(),
            Some(a) => w2.ngram(&std::iter::once(a).chain(q2).collect::<Vec<_>>()),
        };
        let context = SoundContext::in_word(
            self.settings.contextual_sound_classes(),
            w1,
            left,
            target,
            right,
        );
        let prob = pair.correspondence_probability(&context, &corr);
        (self.settings.max_sound_change_score() as f64 * prob) as i32
    }

    fn max_score(&self, segment: &Segment) -> i32 {
        self.settings.max_substitution_score() - 2 * self.vowel_cost(segment)
    }

    /// Largest bonus a node of `word` can earn.
    fn max_sound_change_score(&self, word: &Word, node: usize) -> i32 {
        let Some(pair) = self.model() else {
            return 0;
        };
        let Some(cpd) = &pair.sound_change_probability_distribution else {
            return 0;
        };
        let prob = if word.variety() == pair.variety1.name() {
            let context = SoundContext::in_word(
                self.settings.contextual_sound_classes(),
                word,
                word.left_of(node),
                word.ngram(&[node]),
                word.right_of(node),
            );
            cpd.get(&context)
                .and_then(|d| d.max_observed_probability())
                .unwrap_or(pair.default_correspondence_probability)
        } else {
            let corr = word.ngram(&[node]);
            cpd.iter()
                .map(|(_, d)| d.probability(&corr))
                .fold(0., f64::max)
        };
        (self.settings.max_sound_change_score() as f64 * prob) as i32
    }
}

impl Scorer for AlineScorer<'_> {
    fn insertion_score(&self, p: Option<usize>, q: usize) -> i32 {
        -self.settings.indel_cost() + self.sound_change_score(None, p, Some(q), None)
    }

    fn deletion_score(&self, p: usize, q: Option<usize>) -> i32 {
        // q only locates the gap when the words are swapped
        -self.settings.indel_cost() + self.sound_change_score(Some(p), None, None, q)
    }

    fn substitution_score(&self, p: usize, q: usize) -> i32 {
        let s1 = self.word1.segment(p);
        let s2 = self.word2.segment(q);
        self.settings.max_substitution_score()
            - (self.delta(p, q)
                + self.vowel_cost(s1)
                + self.vowel_cost(s2)
                + self.syllable_position_cost(p, q))
            + self.sound_change_score(Some(p), None, Some(q), None)
    }

    fn expansion_score(&self, p: usize, q1: usize, q2: usize) -> i32 {
        let s = self.word1.segment(p);
        let v = self
            .vowel_cost(self.word2.segment(q1))
            .max(self.vowel_cost(self.word2.segment(q2)));
        let sp = self
            .syllable_position_cost(p, q1)
            .max(self.syllable_position_cost(p, q2));
        self.settings.max_expansion_compression_score()
            - (self.delta(p, q1) + self.delta(p, q2) + self.vowel_cost(s) + v + sp)
            + self.sound_change_score(Some(p), None, Some(q1), Some(q2))
    }

    fn compression_score(&self, p1: usize, p2: usize, q: usize) -> i32 {
        let s = self.word2.segment(q);
        let v = self
            .vowel_cost(self.word1.segment(p1))
            .max(self.vowel_cost(self.word1.segment(p2)));
        let sp = self
            .syllable_position_cost(p1, q)
            .max(self.syllable_position_cost(p2, q));
        self.settings.max_expansion_compression_score()
            - (self.delta(p1, q) + self.delta(p2, q) + self.vowel_cost(s) + v + sp)
            + self.sound_change_score(Some(p1), Some(p2), Some(q), None)
    }

    fn max_score1(&self, p: usize) -> i32 {
        self.max_score(self.word1.segment(p)) + self.max_sound_change_score(self.word1, p)
    }

    fn max_score2(&self, q: usize) -> i32 {
        self.max_score(self.word2.segment(q)) + self.max_sound_change_score(self.word2, q)
    }
}
