//! Words, the phones they are made of, and the varieties they belong to.
use crate::shared::ngram::Ngram;
use crate::shared::segment::{Segment, SyllablePosition};
use crate::shared::utils::FastHashSet;
use anyhow::{anyhow, Result};
use std::ops::Range;
use std::sync::Arc;

/// One position of a word.
#[derive(Clone, Debug)]
pub struct Phone {
    pub segment: Arc<Segment>,
    pub position: Option<SyllablePosition>,
}

impl Phone {
    pub fn new(segment: Arc<Segment>) -> Phone {
        Phone {
            segment,
            position: None,
        }
    }

    pub fn with_position(segment: Arc<Segment>, position: SyllablePosition) -> Phone {
        Phone {
            segment,
            position: Some(position),
        }
    }
}

/// Neighbour of a phone when looking for its environment: either another
/// phone of the stem or the word boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    Anchor,
    Phone(usize),
}

#[derive(Clone, Debug)]
pub struct Word {
    variety: String,
    meaning: String,
    phones: Vec<Phone>,
    // prefix is phones[..stem.start], suffix is phones[stem.end..]
    stem: Range<usize>,
}

impl Word {
    pub fn new(
        variety: &str,
        meaning: &str,
        phones: Vec<Phone>,
        prefix_len: usize,
        suffix_len: usize,
    ) -> Result<Word> {
        if prefix_len + suffix_len > phones.len() {
            return Err(anyhow!(
                "Affixes ({} + {}) are longer than the word ({})",
                prefix_len,
                suffix_len,
                phones.len()
            ));
        }
        let stem = prefix_len..phones.len() - suffix_len;
        Ok(Word {
            variety: variety.to_string(),
            meaning: meaning.to_string(),
            phones,
            stem,
        })
    }

    /// A word that is only a stem.
    pub fn from_segments(variety: &str, meaning: &str, segments: Vec<Arc<Segment>>) -> Word {
        let phones: Vec<Phone> = segments.into_iter().map(Phone::new).collect();
        let stem = 0..phones.len();
        Word {
            variety: variety.to_string(),
            meaning: meaning.to_string(),
            phones,
            stem,
        }
    }

    pub fn variety(&self) -> &str {
        &self.variety
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    pub fn phone(&self, idx: usize) -> &Phone {
        &self.phones[idx]
    }

    pub fn segment(&self, idx: usize) -> &Arc<Segment> {
        &self.phones[idx].segment
    }

    pub fn prefix(&self) -> Range<usize> {
        0..self.stem.start
    }

    pub fn stem(&self) -> Range<usize> {
        self.stem.clone()
    }

    pub fn suffix(&self) -> Range<usize> {
        self.stem.end..self.phones.len()
    }

    pub fn str_rep(&self) -> String {
        self.phones.iter().map(|p| p.segment.str_rep()).collect()
    }

    fn is_node(&self, idx: usize) -> bool {
        self.stem.contains(&idx) && self.phones[idx].segment.kind().is_segmental()
    }

    /// Indices of the phones that take part in alignments: the segmental
    /// phones of the stem.
    pub fn stem_nodes(&self) -> Vec<usize> {
        self.stem.clone().filter(|&i| self.is_node(i)).collect()
    }

    pub fn has_stem_nodes(&self) -> bool {
        self.stem.clone().any(|i| self.is_node(i))
    }

    pub fn prev_node(&self, idx: usize) -> Option<usize> {
        (self.stem.start..idx).rev().find(|&i| self.is_node(i))
    }

    pub fn next_node(&self, idx: usize) -> Option<usize> {
        (idx + 1..self.stem.end).find(|&i| self.is_node(i))
    }

    pub fn left_of(&self, idx: usize) -> Node {
        self.prev_node(idx).map_or(Node::Anchor, Node::Phone)
    }

    pub fn right_of(&self, idx: usize) -> Node {
        self.next_node(idx).map_or(Node::Anchor, Node::Phone)
    }

    pub fn first_node(&self) -> Node {
        self.stem
            .clone()
            .find(|&i| self.is_node(i))
            .map_or(Node::Anchor, Node::Phone)
    }

    pub fn last_node(&self) -> Node {
        self.stem
            .clone()
            .rev()
            .find(|&i| self.is_node(i))
            .map_or(Node::Anchor, Node::Phone)
    }

    pub fn node_segment(&self, node: Node) -> Arc<Segment> {
        match node {
            Node::Anchor => Segment::anchor(),
            Node::Phone(i) => self.phones[i].segment.clone(),
        }
    }

    pub fn ngram(&self, idxs: &[usize]) -> Ngram {
        Ngram::new(idxs.iter().map(|&i| self.phones[i].segment.clone()).collect())
    }
}

/// A named word list.
#[derive(Clone, Debug, Default)]
pub struct Variety {
    name: String,
    words: Vec<Arc<Word>>,
}

impl Variety {
    pub fn new(name: &str) -> Variety {
        Variety {
            name: name.to_string(),
            words: Vec::new(),
        }
    }

    pub fn add_word(&mut self, word: Word) -> Result<()> {
        if word.variety() != self.name {
            return Err(anyhow!(
                "Word `{}` belongs to `{}`, not to `{}`",
                word.str_rep(),
                word.variety(),
                self.name
            ));
        }
        self.words.push(Arc::new(word));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn words(&self) -> &[Arc<Word>] {
        &self.words
    }

    /// Meanings in order of first appearance.
    pub fn meanings(&self) -> Vec<&str> {
        let mut seen = FastHashSet::default();
        self.words
            .iter()
            .map(|w| w.meaning())
            .filter(|m| seen.insert(*m))
            .collect()
    }

    pub fn words_for(&self, meaning: &str) -> Vec<&Arc<Word>> {
        self.words.iter().filter(|w| w.meaning() == meaning).collect()
    }

    /// Number of distinct consonants and vowels used by the variety.
    pub fn segment_count(&self) -> usize {
        self.words
            .iter()
            .flat_map(|w| w.phones().iter())
            .filter(|p| p.segment.kind().is_segmental())
            .map(|p| p.segment.str_rep())
            .collect::<FastHashSet<_>>()
            .len()
    }
}
