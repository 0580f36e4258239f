use anyhow::{anyhow, Result};
use cog_align::shared::{
    AlineSettings, AlineSettingsBuilder, FeatureBundle, FeatureSystem, Phone, Segment,
    SegmentPool, SegmentType, SoundClass, SyllablePosition, Variety, Word,
};
use std::collections::BTreeMap;

#[cfg(test)]
#[allow(dead_code)]
pub fn feature_system() -> Result<FeatureSystem> {
    let mut fs = FeatureSystem::new();
    fs.add_feature("place", &["bilabial", "alveolar", "velar"])?;
    fs.add_feature("manner", &["stop", "fricative", "nasal"])?;
    fs.add_feature("voice", &["voiceless", "voiced"])?;
    fs.add_feature("height", &["close", "mid", "open"])?;
    fs.add_feature("backness", &["front", "central", "back"])?;
    Ok(fs)
}

/// Voicing costs 100 * 10 = 1000, t/k 25 * 40 = 1000, a/e 500 + 500.
#[cfg(test)]
#[allow(dead_code)]
pub fn settings_builder() -> Result<AlineSettingsBuilder> {
    let mut builder = AlineSettingsBuilder::new(feature_system()?);
    builder.relevant_consonant_features = vec![
        "place".to_string(),
        "manner".to_string(),
        "voice".to_string(),
    ];
    builder.relevant_vowel_features = vec!["height".to_string(), "backness".to_string()];
    builder.feature_weights = BTreeMap::from([
        ("place".to_string(), 40),
        ("manner".to_string(), 50),
        ("voice".to_string(), 10),
        ("height".to_string(), 10),
        ("backness".to_string(), 10),
    ]);
    builder.value_metrics = [
        ("bilabial", 100),
        ("alveolar", 85),
        ("velar", 60),
        ("stop", 100),
        ("fricative", 80),
        ("nasal", 60),
        ("voiceless", 0),
        ("voiced", 100),
        ("close", 100),
        ("mid", 50),
        ("open", 0),
        ("front", 100),
        ("central", 50),
        ("back", 0),
    ]
    .into_iter()
    .map(|(s, m)| (s.to_string(), m))
    .collect();
    Ok(builder)
}

#[cfg(test)]
#[allow(dead_code)]
pub fn settings() -> Result<AlineSettings> {
    settings_builder()?.build()
}

/// Substitution and indels only, which keeps the expected alignments simple.
#[cfg(test)]
#[allow(dead_code)]
pub fn settings_without_expansion() -> Result<AlineSettings> {
    let mut builder = settings_builder()?;
    builder.expansion_compression_enabled = false;
    builder.build()
}

#[allow(dead_code)]
fn consonant(symbol: &str, place: &str, manner: &str, voice: &str) -> Segment {
    Segment::new(
        symbol,
        SegmentType::Consonant,
        FeatureBundle::new()
            .with("place", &[place])
            .with("manner", &[manner])
            .with("voice", &[voice]),
    )
}

#[allow(dead_code)]
fn vowel(symbol: &str, height: &str, backness: &str) -> Segment {
    Segment::new(
        symbol,
        SegmentType::Vowel,
        FeatureBundle::new()
            .with("height", &[height])
            .with("backness", &[backness]),
    )
}

#[cfg(test)]
#[allow(dead_code)]
pub fn segment_pool() -> SegmentPool {
    let pool = SegmentPool::new();
    for s in [
        consonant("p", "bilabial", "stop", "voiceless"),
        consonant("b", "bilabial", "stop", "voiced"),
        consonant("m", "bilabial", "nasal", "voiced"),
        consonant("t", "alveolar", "stop", "voiceless"),
        consonant("d", "alveolar", "stop", "voiced"),
        consonant("s", "alveolar", "fricative", "voiceless"),
        consonant("n", "alveolar", "nasal", "voiced"),
        consonant("k", "velar", "stop", "voiceless"),
        consonant("g", "velar", "stop", "voiced"),
        vowel("i", "close", "front"),
        vowel("e", "mid", "front"),
        vowel("a", "open", "central"),
        vowel("o", "mid", "back"),
        vowel("u", "close", "back"),
    ] {
        pool.intern(s);
    }
    pool
}

/// Coarse consonant classes, in the manner of Dolgopolsky.
#[cfg(test)]
#[allow(dead_code)]
pub fn consonant_classes() -> Vec<SoundClass> {
    vec![
        SoundClass::unnatural("P", &["p", "b"]),
        SoundClass::unnatural("T", &["t", "d", "s"]),
        SoundClass::unnatural("K", &["k", "g"]),
        SoundClass::unnatural("M", &["m"]),
        SoundClass::unnatural("N", &["n"]),
    ]
}

/// A word made of one segment per character.
#[cfg(test)]
#[allow(dead_code)]
pub fn word(pool: &SegmentPool, variety: &str, meaning: &str, form: &str) -> Result<Word> {
    let segments = form
        .chars()
        .map(|c| {
            pool.get(&c.to_string())
                .ok_or(anyhow!("Unknown segment `{}`", c))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Word::from_segments(variety, meaning, segments))
}

/// Same as `word`, with syllable positions: consonants before a vowel are
/// onsets, the others codas.
#[cfg(test)]
#[allow(dead_code)]
pub fn syllabified_word(pool: &SegmentPool, variety: &str, meaning: &str, form: &str) -> Result<Word> {
    let segments = form
        .chars()
        .map(|c| {
            pool.get(&c.to_string())
                .ok_or(anyhow!("Unknown segment `{}`", c))
        })
        .collect::<Result<Vec<_>>>()?;
    let phones = (0..segments.len())
        .map(|i| {
            let position = if segments[i].is_vowel() {
                SyllablePosition::Nucleus
            } else if segments.get(i + 1).is_some_and(|s| s.is_vowel()) {
                SyllablePosition::Onset
            } else {
                SyllablePosition::Coda
            };
            Phone::with_position(segments[i].clone(), position)
        })
        .collect();
    Word::new(variety, meaning, phones, 0, 0)
}

#[cfg(test)]
#[allow(dead_code)]
pub fn variety(pool: &SegmentPool, name: &str, entries: &[(&str, &str)]) -> Result<Variety> {
    let mut v = Variety::new(name);
    for (meaning, form) in entries {
        v.add_word(word(pool, name, meaning, form)?)?;
    }
    Ok(v)
}

#[cfg(test)]
#[allow(dead_code)]
pub fn syllabified_variety(pool: &SegmentPool, name: &str, entries: &[(&str, &str)]) -> Result<Variety> {
    let mut v = Variety::new(name);
    for (meaning, form) in entries {
        v.add_word(syllabified_word(pool, name, meaning, form)?)?;
    }
    Ok(v)
}
