//! Collecting sound correspondences from the cognate word pairs.
use crate::align::AlignerResult;
use crate::cognate::IdentifyCognates;
use crate::pipeline::Processor;
use crate::project::Project;
use crate::shared::alignment::Alignment;
use crate::shared::segment::{Segment, SegmentType, SyllablePosition};
use crate::shared::utils::FastHashMap;
use crate::shared::variety_pair::{SoundCorrespondenceCollection, VarietyPair, WordPair};
use anyhow::{anyhow, Result};
use log::debug;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// The two segments of a column when both cells hold exactly one, and they
/// differ.
fn single_segment_change(alignment: &Alignment, col: usize) -> Option<(Arc<Segment>, Arc<Segment>)> {
    let (cell1, cell2) = (alignment.cell(0, col), alignment.cell(1, col));
    match (cell1.nodes(), cell2.nodes()) {
        ([p], [q]) => {
            let s1 = alignment.word(0).segment(*p);
            let s2 = alignment.word(1).segment(*q);
            (s1 != s2).then(|| (s1.clone(), s2.clone()))
        }
        _ => None,
    }
}

fn cognate_alignments<'a>(
    project: &Project,
    aligner_id: &str,
    pair: &'a VarietyPair,
    keep: impl Fn(&WordPair) -> bool,
) -> Result<Vec<(&'a WordPair, AlignerResult)>> {
    let aligner = project.aligner(aligner_id)?;
    pair.word_pairs
        .iter()
        .filter(|wp| keep(wp))
        .map(|wp| Ok((wp, aligner.compute_word_pair(pair, wp)?)))
        .collect()
}

/// Re-runs a registered cognate identifier over a variety pair.
pub struct CognateIdentifierProcessor {
    project: Arc<Project>,
    aligner_id: String,
    cognate_identifier_id: String,
}

impl CognateIdentifierProcessor {
    pub fn new(project: Arc<Project>, aligner_id: &str, cognate_identifier_id: &str) -> Self {
        Self {
            project,
            aligner_id: aligner_id.to_string(),
            cognate_identifier_id: cognate_identifier_id.to_string(),
        }
    }
}

impl Processor<VarietyPair> for CognateIdentifierProcessor {
    fn process(&self, pair: &mut VarietyPair) -> Result<()> {
        let aligner = self.project.aligner(&self.aligner_id)?;
        let identifier = self.project.cognate_identifier(&self.cognate_identifier_id)?;
        identifier.update_variety_pair(aligner, pair)
    }
}

/// Single-segment correspondences of the cognate pairs, grouped by the
/// syllable position both segments share.
pub struct SoundCorrespondenceIdentifier {
    project: Arc<Project>,
    aligner_id: String,
}

impl SoundCorrespondenceIdentifier {
    pub fn new(project: Arc<Project>, aligner_id: &str) -> Self {
        Self {
            project,
            aligner_id: aligner_id.to_string(),
        }
    }
}

impl Processor<VarietyPair> for SoundCorrespondenceIdentifier {
    fn process(&self, pair: &mut VarietyPair) -> Result<()> {
        let mut collections: FastHashMap<SyllablePosition, SoundCorrespondenceCollection> =
            [
                SyllablePosition::Onset,
                SyllablePosition::Nucleus,
                SyllablePosition::Coda,
            ]
            .into_iter()
            .map(|p| (p, SoundCorrespondenceCollection::new()))
            .collect();

        for (wp, result) in cognate_alignments(&self.project, &self.aligner_id, pair, WordPair::cognacy)? {
            let alignment = result.alignment();
            for col in 0..alignment.column_count() {
                let (&[p], &[q]) = (alignment.cell(0, col).nodes(), alignment.cell(1, col).nodes())
                else {
                    continue;
                };
                let pos1 = alignment.word(0).phone(p).position;
                let pos2 = alignment.word(1).phone(q).position;
                let (Some(position), true) = (pos1, pos1 == pos2) else {
                    continue;
                };
                if let Some((s1, s2)) = single_segment_change(alignment, col) {
                    if let Some(coll) = collections.get_mut(&position) {
                        coll.add(&s1, &s2, wp.key());
                    }
                }
            }
        }
        debug!(
            "{} - {}: {} correspondences",
            pair.variety1.name(),
            pair.variety2.name(),
            collections.values().map(|c| c.len()).sum::<usize>()
        );
        pair.sound_correspondences = collections;
        Ok(())
    }
}

/// Where in the words a project-wide correspondence was seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CorrespondenceCategory {
    StemInitialConsonant,
    StemMedialConsonant,
    StemFinalConsonant,
    OnsetConsonant,
    CodaConsonant,
    Vowel,
}

impl CorrespondenceCategory {
    pub const ALL: [CorrespondenceCategory; 6] = [
        CorrespondenceCategory::StemInitialConsonant,
        CorrespondenceCategory::StemMedialConsonant,
        CorrespondenceCategory::StemFinalConsonant,
        CorrespondenceCategory::OnsetConsonant,
        CorrespondenceCategory::CodaConsonant,
        CorrespondenceCategory::Vowel,
    ];

    fn kind(self) -> SegmentType {
        match self {
            CorrespondenceCategory::Vowel => SegmentType::Vowel,
            _ => SegmentType::Consonant,
        }
    }

    fn accepts(self, alignment: &Alignment, col: usize) -> bool {
        let last = alignment.column_count().saturating_sub(1);
        let has_position = |pick_last: bool, position: SyllablePosition| {
            (0..2).any(|row| {
                let cell = alignment.cell(row, col);
                let node = if pick_last { cell.last() } else { cell.first() };
                node.is_some_and(|n| alignment.word(row).phone(n).position == Some(position))
            })
        };
        match self {
            CorrespondenceCategory::StemInitialConsonant => col == 0,
            CorrespondenceCategory::StemMedialConsonant => col > 0 && col < last,
            CorrespondenceCategory::StemFinalConsonant => col == last,
            CorrespondenceCategory::OnsetConsonant => has_position(false, SyllablePosition::Onset),
            CorrespondenceCategory::CodaConsonant => has_position(true, SyllablePosition::Coda),
            CorrespondenceCategory::Vowel => true,
        }
    }
}

/// Correspondences of the whole project, by category.
#[derive(Clone, Debug, Default)]
pub struct GlobalSoundCorrespondences {
    collections: FastHashMap<CorrespondenceCategory, SoundCorrespondenceCollection>,
}

impl GlobalSoundCorrespondences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: CorrespondenceCategory) -> Option<&SoundCorrespondenceCollection> {
        self.collections.get(&category)
    }

    pub fn collection_mut(
        &mut self,
        category: CorrespondenceCategory,
    ) -> &mut SoundCorrespondenceCollection {
        self.collections.entry(category).or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.values().all(|c| c.is_empty())
    }

    /// Fold a delta into these correspondences.
    pub fn merge(&mut self, delta: GlobalSoundCorrespondences) {
        for (category, coll) in delta.collections {
            self.collection_mut(category).merge(coll);
        }
    }

    /// Merge every delta sent on `receiver` until all senders are gone.
    pub fn collect(receiver: Receiver<GlobalSoundCorrespondences>) -> Self {
        receiver.into_iter().fold(Self::new(), |mut acc, delta| {
            acc.merge(delta);
            acc
        })
    }
}

/// Builds, for each variety pair, the correspondences of its predicted
/// cognates and sends them as one delta to the merging side.
pub struct GlobalSoundCorrespondenceIdentifier {
    project: Arc<Project>,
    aligner_id: String,
    sender: Sender<GlobalSoundCorrespondences>,
}

impl GlobalSoundCorrespondenceIdentifier {
    pub fn new(
        project: Arc<Project>,
        aligner_id: &str,
        sender: Sender<GlobalSoundCorrespondences>,
    ) -> Self {
        Self {
            project,
            aligner_id: aligner_id.to_string(),
            sender,
        }
    }

    /// An identifier together with the receiving end of its deltas.
    pub fn channel(
        project: Arc<Project>,
        aligner_id: &str,
    ) -> (Self, Receiver<GlobalSoundCorrespondences>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(project, aligner_id, tx), rx)
    }

    pub fn correspondences(&self, pair: &VarietyPair) -> Result<GlobalSoundCorrespondences> {
        let mut delta = GlobalSoundCorrespondences::new();
        let keep = |wp: &WordPair| wp.predicted_cognacy;
        for (wp, result) in cognate_alignments(&self.project, &self.aligner_id, pair, keep)? {
            let alignment = result.alignment();
            for col in 0..alignment.column_count() {
                let Some((s1, s2)) = single_segment_change(alignment, col) else {
                    continue;
                };
                for category in CorrespondenceCategory::ALL {
                    if s1.kind() == category.kind()
                        && s2.kind() == category.kind()
                        && category.accepts(alignment, col)
                    {
                        delta.collection_mut(category).add(&s1, &s2, wp.key());
                    }
                }
            }
        }
        Ok(delta)
    }
}

impl Processor<VarietyPair> for GlobalSoundCorrespondenceIdentifier {
    fn process(&self, pair: &mut VarietyPair) -> Result<()> {
        let delta = self.correspondences(pair)?;
        if delta.is_empty() {
            return Ok(());
        }
        self.sender
            .send(delta)
            .map_err(|_| anyhow!("Correspondence receiver closed"))
    }
}
