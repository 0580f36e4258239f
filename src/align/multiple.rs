//! Centre-star multiple alignment built from pairwise alignments.
use crate::align::pairwise::PairwiseAlignmentAlgorithm;
use crate::align::scorer::AlineScorer;
use crate::shared::alignment::{Alignment, AlignmentCell};
use crate::shared::parameters::{AlignmentMode, AlineSettings};
use crate::shared::variety_pair::VarietyPair;
use crate::shared::word::Word;
use anyhow::{anyhow, Result};
use itertools::iproduct;
use std::sync::Arc;

fn global_alignment(
    settings: &AlineSettings,
    pair: Option<&VarietyPair>,
    w1: &Arc<Word>,
    w2: &Arc<Word>,
) -> Result<Alignment> {
    let scorer = AlineScorer::new(settings, w1, w2, pair);
    let mut algo =
        PairwiseAlignmentAlgorithm::new(&scorer, w1.clone(), w2.clone(), AlignmentMode::Global, false);
    algo.compute();
    algo.alignment()
}

// what one pairwise alignment to the centre puts around each centre node
struct Placement {
    // cells inserted before centre node g (g == len: after the last one)
    before: Vec<Vec<AlignmentCell>>,
    // cell aligned with centre node g
    at: Vec<AlignmentCell>,
}

fn placement(alignment: &Alignment, centre_nodes: &[usize]) -> Result<Placement> {
    let len = centre_nodes.len();
    let mut before = vec![Vec::new(); len + 1];
    let mut at = vec![AlignmentCell::null(); len];
    let mut g = 0;
    for col in 0..alignment.column_count() {
        let c = alignment.cell(0, col);
        let other = alignment.cell(1, col).clone();
        match c.first() {
            None => before[g].push(other),
            Some(node) => {
                g = centre_nodes
                    .iter()
                    .position(|&n| n == node)
                    .ok_or_else(|| anyhow!("Centre node {} is not a stem node", node))?;
                at[g] = other;
                g += 1;
            }
        }
    }
    Ok(Placement { before, at })
}

/// Align every word to the one closest to all the others, then merge the
/// gaps. Row `k` of the result is `words[k]`.
pub fn align_multiple(
    settings: &AlineSettings,
    pair: Option<&VarietyPair>,
    words: &[Arc<Word>],
) -> Result<Alignment> {
    let n = words.len();
    if n < 2 {
        return Err(anyhow!("A multiple alignment needs at least two words"));
    }
    let mut scores = vec![0.; n];
    for (a, b) in iproduct!(0..n, 0..n) {
        if a < b {
            let s = global_alignment(settings, pair, &words[a], &words[b])?.normalized_score();
            scores[a] += s;
            scores[b] += s;
        }
    }
    let centre = (0..n)
        .max_by(|&a, &b| scores[a].total_cmp(&scores[b]).then(b.cmp(&a)))
        .unwrap_or(0);
    let centre_nodes = words[centre].stem_nodes();

    let mut placements = Vec::with_capacity(n);
    let mut raw = 0;
    let mut normalized = 0.;
    for (k, w) in words.iter().enumerate() {
        if k == centre {
            placements.push(None);
            continue;
        }
        let al = global_alignment(settings, pair, &words[centre], w)?;
        raw += al.raw_score();
        normalized += al.normalized_score();
        placements.push(Some(placement(&al, &centre_nodes)?));
    }

    let mut columns = Vec::new();
    for g in 0..=centre_nodes.len() {
        let width = placements
            .iter()
            .flatten()
            .map(|p| p.before[g].len())
            .max()
            .unwrap_or(0);
        for w in 0..width {
            columns.push(
                placements
                    .iter()
                    .map(|p| match p {
                        None => AlignmentCell::null(),
                        Some(p) => p.before[g].get(w).cloned().unwrap_or_default(),
                    })
                    .collect(),
            );
        }
        if g < centre_nodes.len() {
            columns.push(
                placements
                    .iter()
                    .map(|p| match p {
                        None => AlignmentCell::new(vec![centre_nodes[g]]),
                        Some(p) => p.at[g].clone(),
                    })
                    .collect(),
            );
        }
    }
    Alignment::new(
        words.to_vec(),
        vec![AlignmentCell::null(); n],
        columns,
        vec![AlignmentCell::null(); n],
        raw,
        normalized / (n - 1) as f64,
    )
}
