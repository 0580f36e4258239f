use crate::align::multiple::align_multiple;
use crate::align::pairwise::PairwiseAlignmentAlgorithm;
use crate::align::scorer::{delta, AlineScorer};
use crate::shared::alignment::Alignment;
use crate::shared::errors::CogError;
use crate::shared::parameters::AlineSettings;
use crate::shared::segment::Segment;
use crate::shared::sound_class::SoundClass;
use crate::shared::variety_pair::{VarietyPair, WordPair};
use crate::shared::word::Word;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Output of one `compute` call.
#[derive(Clone, Debug)]
pub struct AlignerResult {
    alignment: Alignment,
    // settings of the aligner that produced it
    settings: Arc<AlineSettings>,
}

impl AlignerResult {
    pub fn new(alignment: Alignment, settings: Arc<AlineSettings>) -> AlignerResult {
        AlignerResult {
            alignment,
            settings,
        }
    }

    pub fn contextual_sound_classes(&self) -> &[SoundClass] {
        self.settings.contextual_sound_classes()
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn words(&self) -> &[Arc<Word>] {
        self.alignment.words()
    }

    pub fn best_raw_score(&self) -> i32 {
        self.alignment.raw_score()
    }

    pub fn normalized_score(&self) -> f64 {
        self.alignment.normalized_score()
    }
}

/// Aligns words with the ALINE scorer. The settings are frozen as soon as
/// a first alignment has been computed.
#[derive(Debug)]
pub struct WordAligner {
    settings: Arc<AlineSettings>,
    used: AtomicBool,
}

impl WordAligner {
    pub fn new(settings: AlineSettings) -> WordAligner {
        WordAligner {
            settings: Arc::new(settings),
            used: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &Arc<AlineSettings> {
        &self.settings
    }

    pub fn is_frozen(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    /// Swap the settings. Fails once any alignment has been computed.
    pub fn reconfigure(&mut self, settings: AlineSettings) -> Result<()> {
        if self.is_frozen() {
            return Err(CogError::SettingsFrozen.into());
        }
        self.settings = Arc::new(settings);
        Ok(())
    }

    pub fn contextual_sound_classes(&self) -> &[SoundClass] {
        self.settings.contextual_sound_classes()
    }

    pub fn expansion_compression_enabled(&self) -> bool {
        self.settings.expansion_compression_enabled()
    }

    /// Feature distance between two segments.
    pub fn delta(&self, s1: &Segment, s2: &Segment) -> i32 {
        delta(&self.settings, s1, s2)
    }

    fn check_stem(word: &Word) -> Result<()> {
        if !word.has_stem_nodes() {
            return Err(CogError::EmptyStem(word.str_rep()).into());
        }
        Ok(())
    }

    /// Align two words. With `pair`, its fitted sound-change model biases
    /// the scores.
    pub fn compute(
        &self,
        pair: Option<&VarietyPair>,
        word1: &Arc<Word>,
        word2: &Arc<Word>,
    ) -> Result<AlignerResult> {
        Self::check_stem(word1)?;
        Self::check_stem(word2)?;
        self.used.store(true, Ordering::Release);
        let scorer = AlineScorer::new(&self.settings, word1, word2, pair);
        let mut algo = PairwiseAlignmentAlgorithm::new(
            &scorer,
            word1.clone(),
            word2.clone(),
            self.settings.mode(),
            self.settings.expansion_compression_enabled(),
        );
        algo.compute();
        Ok(AlignerResult::new(algo.alignment()?, self.settings.clone()))
    }

    pub fn compute_word_pair(&self, pair: &VarietyPair, word_pair: &WordPair) -> Result<AlignerResult> {
        self.compute(Some(pair), &word_pair.word1, &word_pair.word2)
    }

    /// Two words give a pairwise alignment, more a multiple alignment.
    pub fn compute_many(
        &self,
        pair: Option<&VarietyPair>,
        words: &[Arc<Word>],
    ) -> Result<AlignerResult> {
        if let [w1, w2] = words {
            return self.compute(pair, w1, w2);
        }
        for w in words {
            Self::check_stem(w)?;
        }
        self.used.store(true, Ordering::Release);
        Ok(AlignerResult::new(
            align_multiple(&self.settings, pair, words)?,
            self.settings.clone(),
        ))
    }
}
