mod common;
use anyhow::Result;
use approx_eq::assert_approx_eq;
use cog_align::align::WordAligner;
use cog_align::cognate::blair::RegularCorrespondences;
use cog_align::cognate::{
    BlairCognateIdentifier, CognateIdentifier, DolgopolskyCognateIdentifier, IdentifyCognates,
    ListSegmentMappings, SegmentMappings, ThresholdCognateIdentifier, ThresholdSegmentMappings,
    TypeSegmentMappings,
};
use cog_align::shared::{Ngram, SoundChangeCounts, SoundContext, Variety, VarietyPair};
use common::*;
use std::sync::Arc;

fn empty_pair() -> VarietyPair {
    VarietyPair::new(Arc::new(Variety::new("v1")), Arc::new(Variety::new("v2")))
}

fn no_mappings() -> SegmentMappings {
    SegmentMappings::List(ListSegmentMappings::new(&[]))
}

#[test]
fn threshold_is_inclusive() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "father", "pa")?);
    let w2 = Arc::new(word(&pool, "v2", "father", "ba")?);
    let result = aligner.compute(None, &w1, &w2)?;
    let pair = empty_pair();

    let at = ThresholdCognateIdentifier::new(result.normalized_score());
    assert!(at.decide(&pair, &result).predicted);
    let above = ThresholdCognateIdentifier::new(result.normalized_score() + 1e-9);
    assert!(!above.decide(&pair, &result).predicted);
    Ok(())
}

#[test]
fn dolgopolsky_without_mismatch_is_cognate() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "x", "pati")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "bado")?);
    let result = aligner.compute(None, &w1, &w2)?;

    // far above the number of consonants
    let identifier = DolgopolskyCognateIdentifier::new(consonant_classes(), 10);
    let decision = identifier.decide(&empty_pair(), &result);
    assert!(decision.predicted);
    assert_eq!(decision.notes, vec!["1", "X", "1", "X"]);
    assert_approx_eq!(decision.score, 0.5);
    Ok(())
}

#[test]
fn dolgopolsky_counts_classes_before_first_mismatch() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "x", "patak")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "bata")?);
    let w3 = Arc::new(word(&pool, "v2", "x", "batan")?);
    let pair = empty_pair();

    let identifier = DolgopolskyCognateIdentifier::new(consonant_classes(), 2);
    let short = aligner.compute(None, &w1, &w2)?;
    // p/b and t/t agree, k is deleted
    assert!(identifier.decide(&pair, &short).predicted);

    let result = aligner.compute(None, &w1, &w3)?;
    let decision = identifier.decide(&pair, &result);
    assert_eq!(decision.notes.last().map(String::as_str), Some("0"));
    assert!(decision.predicted);

    let strict = DolgopolskyCognateIdentifier::new(consonant_classes(), 3);
    assert!(!strict.decide(&pair, &result).predicted);
    Ok(())
}

#[test]
fn blair_boundary_is_inclusive() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "x", "pata")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "peka")?);
    let result = aligner.compute(None, &w1, &w2)?;

    let identifier = BlairCognateIdentifier::new(false, false, no_mappings(), no_mappings());
    let regular = RegularCorrespondences::default();
    // p/p identical, a/e vowels, t/k unrelated, a/a identical
    assert_eq!(identifier.categories(&regular, &result), vec![1, 2, 3, 1]);
    let decision = identifier.decide(&empty_pair(), &result);
    assert!(decision.predicted);
    assert_approx_eq!(decision.score, 0.5 * 0.75 + 0.75 * 0.25);
    Ok(())
}

#[test]
fn blair_regular_consonants_count_as_identical() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "x", "pata")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "peka")?);
    let result = aligner.compute(None, &w1, &w2)?;

    let t = pool.get("t").unwrap();
    let k = pool.get("k").unwrap();
    let mut counts = SoundChangeCounts::new();
    for _ in 0..3 {
        counts.increment(SoundContext::new(None, Ngram::from(t.clone()), None), Ngram::from(k.clone()));
    }
    let regular = RegularCorrespondences::from_counts(&counts);
    assert_eq!(regular.len(), 1);

    let equal = BlairCognateIdentifier::new(false, true, no_mappings(), no_mappings());
    assert_eq!(equal.categories(&regular, &result), vec![1, 2, 1, 1]);

    // without the option a regular correspondence still has to be similar
    let similar_first = BlairCognateIdentifier::new(false, false, no_mappings(), no_mappings());
    assert_eq!(similar_first.categories(&regular, &result), vec![1, 2, 3, 1]);

    let mut pair = empty_pair();
    pair.sound_change_frequency_distribution = counts;
    assert!(equal.decide(&pair, &result).predicted);
    Ok(())
}

#[test]
fn blair_batch_decisions_share_one_regular_table() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let results = [("pata", "peka"), ("tiko", "kiko"), ("mesi", "kuno")]
        .iter()
        .map(|(a, b)| {
            let w1 = Arc::new(word(&pool, "v1", "x", a)?);
            let w2 = Arc::new(word(&pool, "v2", "x", b)?);
            aligner.compute(None, &w1, &w2)
        })
        .collect::<Result<Vec<_>>>()?;

    let t = pool.get("t").unwrap();
    let k = pool.get("k").unwrap();
    let mut pair = empty_pair();
    for _ in 0..3 {
        pair.sound_change_frequency_distribution
            .increment(SoundContext::new(None, Ngram::from(t.clone()), None), Ngram::from(k.clone()));
    }
    let identifier = CognateIdentifier::Blair(BlairCognateIdentifier::new(
        false,
        true,
        no_mappings(),
        no_mappings(),
    ));
    let batch = identifier.decide_all(&pair, &results);
    assert_eq!(batch.len(), results.len());
    for (decision, result) in batch.iter().zip(&results) {
        let single = identifier.decide(&pair, result);
        assert_eq!(decision.predicted, single.predicted);
        assert_approx_eq!(decision.score, single.score);
        assert_eq!(decision.notes, single.notes);
    }
    assert!(batch[0].predicted);
    Ok(())
}

#[test]
fn blair_ignored_columns_do_not_count() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "x", "pata")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "peka")?);
    let result = aligner.compute(None, &w1, &w2)?;

    let ignored = SegmentMappings::List(ListSegmentMappings::new(&[("t", "k")]));
    let identifier = BlairCognateIdentifier::new(false, false, ignored, no_mappings());
    let categories = identifier.categories(&RegularCorrespondences::default(), &result);
    assert_eq!(categories, vec![1, 2, 0, 1]);
    let decision = identifier.decide(&empty_pair(), &result);
    assert_eq!(decision.notes, vec!["1", "2", "-", "1"]);
    assert!(decision.predicted);
    Ok(())
}

#[test]
fn threshold_mappings_compare_deltas() -> Result<()> {
    let pool = segment_pool();
    let aligner = Arc::new(WordAligner::new(settings_without_expansion()?));
    let w1 = Arc::new(word(&pool, "v1", "x", "pata")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "peka")?);
    let result = aligner.compute(None, &w1, &w2)?;

    // a/e and t/k both cost 1000
    let similar = SegmentMappings::Type(TypeSegmentMappings::new(
        SegmentMappings::Threshold(ThresholdSegmentMappings::new(aligner.clone(), 1000)),
        SegmentMappings::Threshold(ThresholdSegmentMappings::new(aligner.clone(), 999)),
    ));
    let identifier = BlairCognateIdentifier::new(false, false, no_mappings(), similar);
    let categories = identifier.categories(&RegularCorrespondences::default(), &result);
    assert_eq!(categories, vec![1, 1, 3, 1]);
    Ok(())
}

#[test]
fn update_variety_pair_refreshes_aggregates() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings()?);
    let v1 = Arc::new(variety(&pool, "v1", &[("one", "pata"), ("two", "mesi")])?);
    let v2 = Arc::new(variety(&pool, "v2", &[("one", "pata"), ("two", "kuno")])?);
    let mut pair = VarietyPair::new(v1.clone(), v2.clone());
    assert_eq!(pair.lexical_similarity_score, None);
    for meaning in ["one", "two"] {
        pair.word_pairs.push(cog_align::WordPair::new(
            v1.words_for(meaning)[0].clone(),
            v2.words_for(meaning)[0].clone(),
        ));
    }

    let identifier = CognateIdentifier::Threshold(ThresholdCognateIdentifier::default());
    identifier.update_variety_pair(&aligner, &mut pair)?;
    assert!(pair.word_pairs[0].predicted_cognacy);
    assert!(!pair.word_pairs[1].predicted_cognacy);
    assert_approx_eq!(pair.lexical_similarity_score.unwrap(), 0.5);
    assert_approx_eq!(pair.word_pairs[0].phonetic_similarity_score, 1.);
    Ok(())
}
