//! Alignments of two or more words.
use crate::shared::ngram::Ngram;
use crate::shared::segment::Segment;
use crate::shared::sound_class::{SoundClass, SoundContext};
use crate::shared::word::{Node, Word};
use anyhow::{anyhow, Result};
use std::fmt::Write;
use std::sync::Arc;

/// Phones of one word placed in one column (0, 1 or 2 of them).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignmentCell {
    // indices into the word's phones, in order
    nodes: Vec<usize>,
}

impl AlignmentCell {
    pub fn null() -> AlignmentCell {
        AlignmentCell::default()
    }

    pub fn new(nodes: Vec<usize>) -> AlignmentCell {
        AlignmentCell { nodes }
    }

    pub fn is_null(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn first(&self) -> Option<usize> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.nodes.last().copied()
    }
}

#[derive(Clone, Debug)]
pub struct Alignment {
    words: Vec<Arc<Word>>,
    // stem nodes left out of the aligned region, one cell per word
    prefixes: Vec<AlignmentCell>,
    // columns[col][row]
    columns: Vec<Vec<AlignmentCell>>,
    suffixes: Vec<AlignmentCell>,
    raw_score: i32,
    normalized_score: f64,
}

impl Alignment {
    pub fn new(
        words: Vec<Arc<Word>>,
        prefixes: Vec<AlignmentCell>,
        columns: Vec<Vec<AlignmentCell>>,
        suffixes: Vec<AlignmentCell>,
        raw_score: i32,
        normalized_score: f64,
    ) -> Result<Alignment> {
        let n = words.len();
        if prefixes.len() != n || suffixes.len() != n || columns.iter().any(|c| c.len() != n) {
            return Err(anyhow!(
                "Every column of an alignment of {} words needs {} cells",
                n,
                n
            ));
        }
        Ok(Alignment {
            words,
            prefixes,
            columns,
            suffixes,
            raw_score,
            normalized_score,
        })
    }

    pub fn sequence_count(&self) -> usize {
        self.words.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn word(&self, row: usize) -> &Arc<Word> {
        &self.words[row]
    }

    pub fn words(&self) -> &[Arc<Word>] {
        &self.words
    }

    pub fn cell(&self, row: usize, col: usize) -> &AlignmentCell {
        &self.columns[col][row]
    }

    pub fn prefix(&self, row: usize) -> &AlignmentCell {
        &self.prefixes[row]
    }

    pub fn suffix(&self, row: usize) -> &AlignmentCell {
        &self.suffixes[row]
    }

    pub fn raw_score(&self) -> i32 {
        self.raw_score
    }

    /// Score in [0, 1].
    pub fn normalized_score(&self) -> f64 {
        self.normalized_score
    }

    pub fn ngram(&self, row: usize, col: usize) -> Ngram {
        self.words[row].ngram(self.cell(row, col).nodes())
    }

    /// Closest node on the left of the column. Empty cells look at the
    /// previous columns, then the prefix, then the word boundary.
    pub fn left_node(&self, row: usize, col: usize) -> Node {
        let word = &self.words[row];
        if let Some(first) = self.cell(row, col).first() {
            return word.left_of(first);
        }
        (0..col)
            .rev()
            .find_map(|c| self.cell(row, c).last())
            .or_else(|| self.prefixes[row].last())
            .map_or(Node::Anchor, Node::Phone)
    }

    pub fn right_node(&self, row: usize, col: usize) -> Node {
        let word = &self.words[row];
        if let Some(last) = self.cell(row, col).last() {
            return word.right_of(last);
        }
        (col + 1..self.columns.len())
            .find_map(|c| self.cell(row, c).first())
            .or_else(|| self.suffixes[row].first())
            .map_or(Node::Anchor, Node::Phone)
    }

    /// Segment on the left, content and segment on the right of a cell.
    pub fn environment(&self, row: usize, col: usize) -> (Arc<Segment>, Ngram, Arc<Segment>) {
        let word = &self.words[row];
        (
            word.node_segment(self.left_node(row, col)),
            self.ngram(row, col),
            word.node_segment(self.right_node(row, col)),
        )
    }

    /// First of `classes` matching the content of a cell in its environment.
    pub fn matching_sound_class<'c>(
        &self,
        row: usize,
        col: usize,
        classes: &'c [SoundClass],
    ) -> Option<&'c SoundClass> {
        let (left, target, right) = self.environment(row, col);
        classes.iter().find(|c| c.matches(&left, &target, &right))
    }

    /// The condition under which the cell of `row` at `col` is observed.
    pub fn sound_context(&self, row: usize, col: usize, classes: &[SoundClass]) -> SoundContext {
        SoundContext::in_word(
            classes,
            &self.words[row],
            self.left_node(row, col),
            self.ngram(row, col),
            self.right_node(row, col),
        )
    }

    /// Text rendering, one line per word plus an optional line of notes.
    pub fn display(&self, notes: Option<&[String]>) -> String {
        let mut rows: Vec<Vec<String>> = (0..self.words.len())
            .map(|r| (0..self.columns.len()).map(|c| self.ngram(r, c).to_string()).collect())
            .collect();
        if let Some(n) = notes {
            rows.push(n.to_vec());
        }
        let widths: Vec<usize> = (0..self.columns.len())
            .map(|c| {
                rows.iter()
                    .filter_map(|r| r.get(c))
                    .map(|s| s.chars().count())
                    .max()
                    .unwrap_or(1)
            })
            .collect();
        let mut out = String::new();
        for (r, row) in rows.iter().enumerate() {
            let affix = |cell: &AlignmentCell| {
                if r < self.words.len() && !cell.is_null() {
                    self.words[r].ngram(cell.nodes()).to_string()
                } else {
                    String::new()
                }
            };
            let prefix = self.prefixes.get(r).map(affix).unwrap_or_default();
            let suffix = self.suffixes.get(r).map(affix).unwrap_or_default();
            let _ = write!(out, "{} |", prefix);
            for (c, w) in widths.iter().enumerate() {
                let s = row.get(c).map(|s| s.as_str()).unwrap_or("");
                let _ = write!(out, " {:<w$} |", s, w = w);
            }
            let _ = writeln!(out, " {}", suffix);
        }
        out
    }
}
