//! Dynamic-programming search for the best pairwise alignment under a
//! [`Scorer`].
use crate::align::scorer::Scorer;
use crate::shared::alignment::{Alignment, AlignmentCell};
use crate::shared::parameters::AlignmentMode;
use crate::shared::word::Word;
use anyhow::Result;
use ndarray::Array2;
use std::sync::Arc;

const NEG_INF: i32 = i32::MIN / 2;

pub struct PairwiseAlignmentAlgorithm<'a, S: Scorer> {
    scorer: &'a S,
    word1: Arc<Word>,
    word2: Arc<Word>,
    // aligned nodes of each word (phone indices)
    nodes1: Vec<usize>,
    nodes2: Vec<usize>,
    mode: AlignmentMode,
    expansion_compression: bool,
    sim: Array2<i32>,
    best_raw_score: i32,
}

// one step of the traceback
enum Op {
    Substitution,
    Insertion,
    Expansion,
    Deletion,
    Compression,
}

impl<'a, S: Scorer> PairwiseAlignmentAlgorithm<'a, S> {
    pub fn new(
        scorer: &'a S,
        word1: Arc<Word>,
        word2: Arc<Word>,
        mode: AlignmentMode,
        expansion_compression: bool,
    ) -> Self {
        let nodes1 = word1.stem_nodes();
        let nodes2 = word2.stem_nodes();
        let sim = Array2::zeros((nodes1.len() + 1, nodes2.len() + 1));
        PairwiseAlignmentAlgorithm {
            scorer,
            word1,
            word2,
            nodes1,
            nodes2,
            mode,
            expansion_compression,
            sim,
            best_raw_score: 0,
        }
    }

    // node i of word1, 1-based, None for 0
    fn get1(&self, i: usize) -> Option<usize> {
        i.checked_sub(1).map(|k| self.nodes1[k])
    }

    fn get2(&self, j: usize) -> Option<usize> {
        j.checked_sub(1).map(|k| self.nodes2[k])
    }

    fn op_score(&self, op: &Op, i: usize, j: usize) -> i32 {
        let s = self.scorer;
        match op {
            Op::Substitution => s.substitution_score(self.nodes1[i - 1], self.nodes2[j - 1]),
            Op::Insertion => s.insertion_score(self.get1(i), self.nodes2[j - 1]),
            Op::Deletion => s.deletion_score(self.nodes1[i - 1], self.get2(j)),
            Op::Expansion => {
                s.expansion_score(self.nodes1[i - 1], self.nodes2[j - 2], self.nodes2[j - 1])
            }
            Op::Compression => {
                s.compression_score(self.nodes1[i - 2], self.nodes1[i - 1], self.nodes2[j - 1])
            }
        }
    }

    pub fn compute(&mut self) {
        let (n, m) = (self.nodes1.len(), self.nodes2.len());
        if self.mode == AlignmentMode::Global {
            for i in 1..=n {
                self.sim[[i, 0]] = self.sim[[i - 1, 0]] + self.op_score(&Op::Deletion, i, 0);
            }
            for j in 1..=m {
                self.sim[[0, j]] = self.sim[[0, j - 1]] + self.op_score(&Op::Insertion, 0, j);
            }
        }
        let floor = matches!(self.mode, AlignmentMode::Local | AlignmentMode::HalfLocal);
        let mut max_score = NEG_INF;
        for i in 1..=n {
            for j in 1..=m {
                let mut best = (self.sim[[i - 1, j]] + self.op_score(&Op::Deletion, i, j))
                    .max(self.sim[[i, j - 1]] + self.op_score(&Op::Insertion, i, j))
                    .max(self.sim[[i - 1, j - 1]] + self.op_score(&Op::Substitution, i, j));
                if self.expansion_compression && j >= 2 {
                    best = best.max(self.sim[[i - 1, j - 2]] + self.op_score(&Op::Expansion, i, j));
                }
                if self.expansion_compression && i >= 2 {
                    best =
                        best.max(self.sim[[i - 2, j - 1]] + self.op_score(&Op::Compression, i, j));
                }
                if floor {
                    best = best.max(0);
                }
                self.sim[[i, j]] = best;
                if best > max_score
                    && (self.mode != AlignmentMode::SemiGlobal || i == n || j == m)
                {
                    max_score = best;
                }
            }
        }
        self.best_raw_score = match self.mode {
            AlignmentMode::Global | AlignmentMode::HalfLocal => self.sim[[n, m]],
            _ if max_score == NEG_INF => 0,
            _ => max_score,
        };
    }

    pub fn best_raw_score(&self) -> i32 {
        self.best_raw_score
    }

    /// Cell where the traceback of the best alignment starts.
    fn end_cell(&self) -> (usize, usize) {
        let (n, m) = (self.nodes1.len(), self.nodes2.len());
        let t = self.best_raw_score;
        match self.mode {
            AlignmentMode::Global | AlignmentMode::HalfLocal => (n, m),
            AlignmentMode::SemiGlobal => (1..=n)
                .map(|i| (i, m))
                .chain((1..=m).map(|j| (n, j)))
                .find(|&(i, j)| self.sim[[i, j]] >= t)
                .unwrap_or((n, m)),
            AlignmentMode::Local => (1..=n)
                .flat_map(|i| (1..=m).map(move |j| (i, j)))
                .find(|&(i, j)| self.sim[[i, j]] >= t)
                .unwrap_or((n, m)),
        }
    }

    /// Next traceback step from (i, j), `None` when the alignment starts here.
    fn step(&self, i: usize, j: usize, score: i32) -> Option<Op> {
        let t = self.best_raw_score;
        if (self.mode != AlignmentMode::Global && (i == 0 || j == 0)) || (i == 0 && j == 0) {
            return None;
        }
        let reaches = |prev: i32, op: &Op| prev + self.op_score(op, i, j) + score >= t;
        if i != 0 && j != 0 && reaches(self.sim[[i - 1, j - 1]], &Op::Substitution) {
            return Some(Op::Substitution);
        }
        if j != 0 && (i == 0 || reaches(self.sim[[i, j - 1]], &Op::Insertion)) {
            return Some(Op::Insertion);
        }
        if self.expansion_compression
            && i != 0
            && j >= 2
            && reaches(self.sim[[i - 1, j - 2]], &Op::Expansion)
        {
            return Some(Op::Expansion);
        }
        if i != 0 && (j == 0 || reaches(self.sim[[i - 1, j]], &Op::Deletion)) {
            return Some(Op::Deletion);
        }
        if self.expansion_compression
            && i >= 2
            && j != 0
            && reaches(self.sim[[i - 2, j - 1]], &Op::Compression)
        {
            return Some(Op::Compression);
        }
        None
    }

    /// Sum of the per-node maxima. Nodes outside [start, end) count half.
    fn max_score_sum(&self, nodes: &[usize], start: usize, end: usize, first: bool) -> i32 {
        nodes
            .iter()
            .enumerate()
            .map(|(k, &node)| {
                let s = if first {
                    self.scorer.max_score1(node)
                } else {
                    self.scorer.max_score2(node)
                };
                if k < start || k >= end {
                    s / 2
                } else {
                    s
                }
            })
            .sum()
    }

    /// Best alignment found by `compute`.
    pub fn alignment(&self) -> Result<Alignment> {
        let (end1, end2) = self.end_cell();
        let (mut i, mut j) = (end1, end2);
        let mut score = 0;
        let mut cols1 = Vec::new();
        let mut cols2 = Vec::new();
        while let Some(op) = self.step(i, j, score) {
            score += self.op_score(&op, i, j);
            let (c1, c2, di, dj) = match op {
                Op::Substitution => (vec![self.nodes1[i - 1]], vec![self.nodes2[j - 1]], 1, 1),
                Op::Insertion => (vec![], vec![self.nodes2[j - 1]], 0, 1),
                Op::Expansion => (
                    vec![self.nodes1[i - 1]],
                    vec![self.nodes2[j - 2], self.nodes2[j - 1]],
                    1,
                    2,
                ),
                Op::Deletion => (vec![self.nodes1[i - 1]], vec![], 1, 0),
                Op::Compression => (
                    vec![self.nodes1[i - 2], self.nodes1[i - 1]],
                    vec![self.nodes2[j - 1]],
                    2,
                    1,
                ),
            };
            cols1.push(AlignmentCell::new(c1));
            cols2.push(AlignmentCell::new(c2));
            i -= di;
            j -= dj;
        }
        let (start1, start2) = (i, j);
        let columns = cols1
            .into_iter()
            .zip(cols2)
            .rev()
            .map(|(a, b)| vec![a, b])
            .collect();

        let max1 = self.max_score_sum(&self.nodes1, start1, end1, true);
        let max2 = self.max_score_sum(&self.nodes2, start2, end2, false);
        let denominator = max1.max(max2);
        let normalized = if denominator <= 0 {
            0.
        } else {
            (score as f64 / denominator as f64).clamp(0., 1.)
        };
        Alignment::new(
            vec![self.word1.clone(), self.word2.clone()],
            vec![
                AlignmentCell::new(self.nodes1[..start1].to_vec()),
                AlignmentCell::new(self.nodes2[..start2].to_vec()),
            ],
            columns,
            vec![
                AlignmentCell::new(self.nodes1[end1..].to_vec()),
                AlignmentCell::new(self.nodes2[end2..].to_vec()),
            ],
            score,
            normalized,
        )
    }
}
