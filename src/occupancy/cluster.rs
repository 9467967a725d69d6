use std::collections::BTreeSet;

use super::point::{LayerId, OccupancyPoint};
use super::rule::CompatibilityRule;

/// Largest mean and spread seen across a set of clusters.
///
/// Folded up during a build so callers can frame plots without a second pass
/// over the samples. The two maxima are tracked independently and need not
/// come from the same point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    /// Largest sample mean.
    pub max_mean: f64,
    /// Largest sample spread.
    pub max_spread: f64,
}

impl Extent {
    /// Componentwise maximum of two extents.
    pub fn union(self, other: Self) -> Self {
        Self {
            max_mean: self.max_mean.max(other.max_mean),
            max_spread: self.max_spread.max(other.max_spread),
        }
    }
}

/// A group of statistically compatible occupancy points.
///
/// Clusters are built through the engine and are never empty. Centroid
/// queries are O(1): the running sums are maintained on every insertion
/// rather than recomputed from the member list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyCluster {
    points: Vec<OccupancyPoint>,
    max_mean: f64,
    max_spread: f64,
    sum_mean: f64,
    sum_spread: f64,
}

impl OccupancyCluster {
    /// Founds a cluster from a candidate pair, if the rule allows it.
    pub(crate) fn try_seed<R: CompatibilityRule>(
        rule: &R,
        first: &OccupancyPoint,
        second: &OccupancyPoint,
    ) -> Option<Self> {
        if !rule.accepts_pair(first, second) {
            return None;
        }
        let mut cluster = Self::singleton(first.clone());
        cluster.push(second.clone());
        Some(cluster)
    }

    /// Cluster holding a single point.
    pub(crate) fn singleton(point: OccupancyPoint) -> Self {
        Self {
            max_mean: point.mean(),
            max_spread: point.spread(),
            sum_mean: point.mean(),
            sum_spread: point.spread(),
            points: vec![point],
        }
    }

    fn push(&mut self, point: OccupancyPoint) {
        self.max_mean = self.max_mean.max(point.mean());
        self.max_spread = self.max_spread.max(point.spread());
        self.sum_mean += point.mean();
        self.sum_spread += point.spread();
        self.points.push(point);
    }

    /// Absorbs `candidate` if the rule accepts it against the current
    /// membership. Returns whether the cluster grew.
    pub(crate) fn try_add<R: CompatibilityRule>(
        &mut self,
        rule: &R,
        candidate: &OccupancyPoint,
    ) -> bool {
        if !rule.accepts(self, candidate) {
            return false;
        }
        self.push(candidate.clone());
        true
    }

    /// Number of member points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false` for clusters produced by a build.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Member points in absorption order: seed pair first, then each
    /// accepted candidate.
    pub fn points(&self) -> &[OccupancyPoint] {
        &self.points
    }

    /// Mean coordinate of the centroid.
    pub fn average_mean(&self) -> f64 {
        self.sum_mean / self.points.len() as f64
    }

    /// Spread coordinate of the centroid.
    pub fn average_spread(&self) -> f64 {
        self.sum_spread / self.points.len() as f64
    }

    /// Largest mean among the members.
    pub fn max_mean(&self) -> f64 {
        self.max_mean
    }

    /// Largest spread among the members.
    pub fn max_spread(&self) -> f64 {
        self.max_spread
    }

    /// Extrema of this cluster alone.
    pub fn extent(&self) -> Extent {
        Extent {
            max_mean: self.max_mean,
            max_spread: self.max_spread,
        }
    }

    /// Euclidean distance from the centroid to `point` in the
    /// `(mean, spread)` plane.
    pub fn distance_to(&self, point: &OccupancyPoint) -> f64 {
        let dm = self.average_mean() - point.mean();
        let ds = self.average_spread() - point.spread();
        (dm * dm + ds * ds).sqrt()
    }

    /// Union of the layer ids carried by the member points.
    pub fn layer_ids(&self) -> BTreeSet<LayerId> {
        self.points
            .iter()
            .flat_map(|point| point.layers().iter().copied())
            .collect()
    }
}
