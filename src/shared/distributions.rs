//! Frequency counts and the smoothed probability distributions fitted on them.
use crate::shared::utils::FastHashMap;
use anyhow::{anyhow, Result};
use std::hash::Hash;

#[derive(Clone, Debug)]
pub struct FrequencyDistribution<T: Hash + Eq> {
    counts: FastHashMap<T, usize>,
    // sum of all the counts
    total: usize,
}

impl<T: Hash + Eq> Default for FrequencyDistribution<T> {
    fn default() -> Self {
        FrequencyDistribution {
            counts: FastHashMap::default(),
            total: 0,
        }
    }
}

impl<T: Hash + Eq> FrequencyDistribution<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, sample: T) {
        self.increment_by(sample, 1);
    }

    pub fn increment_by(&mut self, sample: T, count: usize) {
        *self.counts.entry(sample).or_insert(0) += count;
        self.total += count;
    }

    pub fn count(&self, sample: &T) -> usize {
        self.counts.get(sample).copied().unwrap_or(0)
    }

    /// Total number of observations.
    pub fn sample_outcome_count(&self) -> usize {
        self.total
    }

    /// Number of distinct samples observed.
    pub fn observed_count(&self) -> usize {
        self.counts.len()
    }

    pub fn observed_samples(&self) -> impl Iterator<Item = &T> {
        self.counts.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> {
        self.counts.iter().map(|(k, &v)| (k, v))
    }
}

#[derive(Clone, Debug)]
pub struct ConditionalFrequencyDistribution<C: Hash + Eq, T: Hash + Eq> {
    dists: FastHashMap<C, FrequencyDistribution<T>>,
}

impl<C: Hash + Eq, T: Hash + Eq> Default for ConditionalFrequencyDistribution<C, T> {
    fn default() -> Self {
        ConditionalFrequencyDistribution {
            dists: FastHashMap::default(),
        }
    }
}

impl<C: Hash + Eq, T: Hash + Eq> ConditionalFrequencyDistribution<C, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, condition: C, sample: T) {
        self.dists.entry(condition).or_default().increment(sample);
    }

    pub fn get(&self, condition: &C) -> Option<&FrequencyDistribution<T>> {
        self.dists.get(condition)
    }

    pub fn count(&self, condition: &C, sample: &T) -> usize {
        self.dists.get(condition).map_or(0, |fd| fd.count(sample))
    }

    pub fn conditions(&self) -> impl Iterator<Item = &C> {
        self.dists.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &FrequencyDistribution<T>)> {
        self.dists.iter()
    }

    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    /// Total number of observations over every condition.
    pub fn sample_outcome_count(&self) -> usize {
        self.dists.values().map(|fd| fd.sample_outcome_count()).sum()
    }
}

/// Witten–Bell estimate of a distribution over `bin_count` possible
/// outcomes. With `N` observations of `T` distinct samples, a seen sample
/// gets `c / (N + T)` and the mass `T / (N + T)` is shared between the
/// unseen outcomes.
/// ```
/// use cog_align::shared::distributions::{FrequencyDistribution, WittenBellProbabilityDistribution};
/// let mut fd = FrequencyDistribution::new();
/// fd.increment("a");
/// fd.increment("a");
/// fd.increment("b");
/// let wb = WittenBellProbabilityDistribution::new(&fd, 4).unwrap();
/// assert!((wb.probability(&"a") - 0.4).abs() < 1e-12);
/// assert!((wb.probability(&"c") - 0.2).abs() < 1e-12);
/// assert!((wb.observed_mass() + wb.reserved_mass() - 1.).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct WittenBellProbabilityDistribution<T: Hash + Eq> {
    probs: FastHashMap<T, f64>,
    // probability of each single unseen outcome
    unseen: f64,
    // total mass left for the unseen outcomes
    reserved: f64,
}

impl<T: Hash + Eq + Clone> WittenBellProbabilityDistribution<T> {
    pub fn new(fd: &FrequencyDistribution<T>, bin_count: usize) -> Result<Self> {
        let seen = fd.observed_count();
        if seen > bin_count {
            return Err(anyhow!(
                "{} distinct samples observed but only {} possible outcomes",
                seen,
                bin_count
            ));
        }
        let n = fd.sample_outcome_count() as f64;
        let t = seen as f64;
        if n == 0. {
            // nothing observed: uniform over every outcome
            return Ok(WittenBellProbabilityDistribution {
                probs: FastHashMap::default(),
                unseen: if bin_count > 0 {
                    1. / bin_count as f64
                } else {
                    0.
                },
                reserved: 1.,
            });
        }
        let unseen_bins = bin_count - seen;
        // when every outcome was observed there is nothing to reserve
        let (denominator, reserved, unseen) = if unseen_bins == 0 {
            (n, 0., 0.)
        } else {
            (n + t, t / (n + t), t / ((n + t) * unseen_bins as f64))
        };
        let probs = fd
            .iter()
            .map(|(k, c)| (k.clone(), c as f64 / denominator))
            .collect();
        Ok(WittenBellProbabilityDistribution {
            probs,
            unseen,
            reserved,
        })
    }
}

impl<T: Hash + Eq> WittenBellProbabilityDistribution<T> {
    pub fn probability(&self, sample: &T) -> f64 {
        self.probs.get(sample).copied().unwrap_or(self.unseen)
    }

    /// Probability of the sample if it was observed.
    pub fn observed_probability(&self, sample: &T) -> Option<f64> {
        self.probs.get(sample).copied()
    }

    pub fn observed_samples(&self) -> impl Iterator<Item = &T> {
        self.probs.keys()
    }

    pub fn observed_count(&self) -> usize {
        self.probs.len()
    }

    pub fn observed_mass(&self) -> f64 {
        self.probs.values().sum()
    }

    pub fn reserved_mass(&self) -> f64 {
        self.reserved
    }

    pub fn max_observed_probability(&self) -> Option<f64> {
        self.probs.values().copied().reduce(f64::max)
    }
}

#[derive(Clone, Debug)]
pub struct ConditionalProbabilityDistribution<C: Hash + Eq, T: Hash + Eq> {
    dists: FastHashMap<C, WittenBellProbabilityDistribution<T>>,
}

impl<C: Hash + Eq + Clone, T: Hash + Eq + Clone> ConditionalProbabilityDistribution<C, T> {
    /// Fit one Witten–Bell distribution per observed condition.
    pub fn witten_bell(
        cfd: &ConditionalFrequencyDistribution<C, T>,
        bin_count: usize,
    ) -> Result<Self> {
        let dists = cfd
            .iter()
            .map(|(c, fd)| Ok((c.clone(), WittenBellProbabilityDistribution::new(fd, bin_count)?)))
            .collect::<Result<FastHashMap<_, _>>>()?;
        Ok(ConditionalProbabilityDistribution { dists })
    }
}

impl<C: Hash + Eq, T: Hash + Eq> ConditionalProbabilityDistribution<C, T> {
    pub fn get(&self, condition: &C) -> Option<&WittenBellProbabilityDistribution<T>> {
        self.dists.get(condition)
    }

    /// `None` when the condition was never observed.
    pub fn probability(&self, condition: &C, sample: &T) -> Option<f64> {
        self.dists.get(condition).map(|d| d.probability(sample))
    }

    pub fn conditions(&self) -> impl Iterator<Item = &C> {
        self.dists.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &WittenBellProbabilityDistribution<T>)> {
        self.dists.iter()
    }

    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    /// Same conditions, same observed samples per condition, and every
    /// shared probability within `tolerance`.
    pub fn similar_to(&self, other: &Self, tolerance: f64) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.dists.iter().all(|(c, d)| {
            let Some(o) = other.dists.get(c) else {
                return false;
            };
            d.observed_count() == o.observed_count()
                && d.probs.iter().all(|(s, p)| {
                    o.observed_probability(s)
                        .is_some_and(|q| (p - q).abs() <= tolerance)
                })
        })
    }
}
