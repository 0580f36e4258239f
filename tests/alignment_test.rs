mod common;
use anyhow::Result;
use approx_eq::assert_approx_eq;
use cog_align::align::{delta, WordAligner};
use cog_align::shared::{AlignmentMode, AlineSettingsBuilder, CogError};
use common::*;
use std::sync::Arc;

#[test]
fn delta_is_symmetric() -> Result<()> {
    let settings = settings()?;
    let pool = segment_pool();
    let symbols = ["p", "b", "m", "t", "s", "k", "a", "e", "i", "o", "u"];
    for a in symbols {
        for b in symbols {
            let (sa, sb) = (pool.get(a).unwrap(), pool.get(b).unwrap());
            assert_eq!(delta(&settings, &sa, &sb), delta(&settings, &sb, &sa));
        }
    }
    assert_eq!(delta(&settings, &pool.get("p").unwrap(), &pool.get("p").unwrap()), 0);
    Ok(())
}

#[test]
fn voicing_difference_costs_one_feature() -> Result<()> {
    let settings = settings()?;
    let pool = segment_pool();
    assert_eq!(delta(&settings, &pool.get("p").unwrap(), &pool.get("b").unwrap()), 1000);
    assert_eq!(delta(&settings, &pool.get("t").unwrap(), &pool.get("k").unwrap()), 1000);
    assert_eq!(delta(&settings, &pool.get("a").unwrap(), &pool.get("e").unwrap()), 1000);
    Ok(())
}

#[test]
fn align_pa_ba() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "father", "pa")?);
    let w2 = Arc::new(word(&pool, "v2", "father", "ba")?);
    let result = aligner.compute(None, &w1, &w2)?;

    assert_eq!(result.best_raw_score(), 3500 - 1000 + 3500);
    assert_approx_eq!(result.normalized_score(), 6000. / 7000.);
    let alignment = result.alignment();
    assert_eq!(alignment.column_count(), 2);
    assert_eq!(alignment.ngram(0, 0).to_string(), "p");
    assert_eq!(alignment.ngram(1, 0).to_string(), "b");
    Ok(())
}

#[test]
fn identical_words_score_one() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings()?);
    let w1 = Arc::new(word(&pool, "v1", "two", "tupa")?);
    let w2 = Arc::new(word(&pool, "v2", "two", "tupa")?);
    let result = aligner.compute(None, &w1, &w2)?;
    assert_approx_eq!(result.normalized_score(), 1.);
    assert_eq!(result.alignment().column_count(), 4);
    Ok(())
}

#[test]
fn deletion_leaves_empty_cell() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings_without_expansion()?);
    let w1 = Arc::new(word(&pool, "v1", "dog", "kanu")?);
    let w2 = Arc::new(word(&pool, "v2", "dog", "kan")?);
    let result = aligner.compute(None, &w1, &w2)?;
    let alignment = result.alignment();
    assert_eq!(alignment.column_count(), 4);
    assert!(alignment.cell(1, 3).is_empty());
    assert_eq!(result.best_raw_score(), 3 * 3500 - 1000);
    assert!(result.normalized_score() < 1.);
    Ok(())
}

#[test]
fn local_mode_skips_unrelated_ends() -> Result<()> {
    let pool = segment_pool();
    let mut builder = settings_builder()?;
    builder.mode = AlignmentMode::Local;
    builder.expansion_compression_enabled = false;
    let aligner = WordAligner::new(builder.build()?);
    let w1 = Arc::new(word(&pool, "v1", "x", "gosapa")?);
    let w2 = Arc::new(word(&pool, "v2", "x", "sapa")?);
    let result = aligner.compute(None, &w1, &w2)?;
    assert_eq!(result.best_raw_score(), 4 * 3500);
    assert_eq!(result.alignment().column_count(), 4);
    Ok(())
}

#[test]
fn multiple_alignment_has_one_row_per_word() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings()?);
    let words = vec![
        Arc::new(word(&pool, "v1", "x", "pata")?),
        Arc::new(word(&pool, "v2", "x", "bata")?),
        Arc::new(word(&pool, "v3", "x", "pat")?),
    ];
    let result = aligner.compute_many(None, &words)?;
    let alignment = result.alignment();
    assert_eq!(alignment.sequence_count(), 3);
    assert!(alignment.column_count() >= 4);
    assert!(result.normalized_score() > 0. && result.normalized_score() <= 1.);
    Ok(())
}

#[test]
fn settings_are_frozen_after_first_use() -> Result<()> {
    let pool = segment_pool();
    let mut aligner = WordAligner::new(settings()?);
    // still free before any alignment
    aligner.reconfigure(settings_without_expansion()?)?;
    assert!(!aligner.is_frozen());

    let w = Arc::new(word(&pool, "v1", "x", "pa")?);
    aligner.compute(None, &w, &w)?;
    assert!(aligner.is_frozen());
    let err = aligner.reconfigure(settings()?).unwrap_err();
    assert_eq!(err.downcast_ref::<CogError>(), Some(&CogError::SettingsFrozen));
    Ok(())
}

#[test]
fn words_without_stem_are_rejected() -> Result<()> {
    let pool = segment_pool();
    let aligner = WordAligner::new(settings()?);
    let empty = Arc::new(word(&pool, "v1", "x", "")?);
    let w = Arc::new(word(&pool, "v2", "x", "pa")?);
    let err = aligner.compute(None, &empty, &w).unwrap_err();
    assert!(matches!(err.downcast_ref::<CogError>(), Some(CogError::EmptyStem(_))));
    Ok(())
}

#[test]
fn settings_from_json() -> Result<()> {
    let builder = settings_builder()?;
    let json = builder.to_json()?;
    let parsed = AlineSettingsBuilder::from_json(&json)?;
    assert_eq!(parsed, builder);

    // missing fields take the defaults
    let partial = AlineSettingsBuilder::from_json(r#"{"indel_cost": 1200, "mode": "SemiGlobal"}"#)?;
    assert_eq!(partial.indel_cost, 1200);
    assert_eq!(partial.mode, AlignmentMode::SemiGlobal);
    assert_eq!(partial.max_substitution_score, 3500);
    assert_eq!(partial.max_sound_change_score, 800);
    Ok(())
}

#[test]
fn settings_need_weights_for_relevant_features() -> Result<()> {
    let mut builder = settings_builder()?;
    builder.feature_weights.remove("voice");
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CogError>(),
        Some(CogError::InvalidSettings(_))
    ));
    Ok(())
}
