use super::cluster::OccupancyCluster;
use super::point::OccupancyPoint;
use crate::error::{Error, Result};

/// Decides which points may found or join a cluster.
///
/// The engine treats the rule as a black box: once per round it asks whether
/// the globally closest pair may found a cluster, then once per growth step
/// whether the nearest remaining point may join the cluster as it currently
/// stands. Implementations must be pure (same inputs, same answer) or the
/// pass loses its determinism guarantee.
pub trait CompatibilityRule {
    /// Parameter sanity check, run once per `build_clusters` call.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// May `a` and `b` found a cluster together?
    fn accepts_pair(&self, a: &OccupancyPoint, b: &OccupancyPoint) -> bool;

    /// May `candidate` join `cluster`?
    fn accepts(&self, cluster: &OccupancyCluster, candidate: &OccupancyPoint) -> bool;
}

/// Default rule: the pooled spread sets the scale for both gaps.
///
/// A pair `(a, b)` may found a cluster when, with `pooled` the mean of the
/// two spreads,
///
/// ```text
/// |a.mean - b.mean|     <= mean_factor   * pooled
/// |a.spread - b.spread| <= spread_factor * pooled
/// ```
///
/// and a candidate may join a cluster when its gaps to the centroid satisfy
/// the same two bounds with `pooled` the cluster's average spread. In other
/// words, layers whose statistics agree to within a fraction of their own
/// spread end up together.
///
/// A zero factor is allowed and degenerates to an all-singleton clustering;
/// non-finite or negative factors fail
/// [`validate`](CompatibilityRule::validate). Non-finite statistics never
/// pass either bound, so broken layers fall out as singletons.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpreadTolerance {
    /// Scale on the pooled spread bounding the mean gap.
    pub mean_factor: f64,
    /// Scale on the pooled spread bounding the spread gap.
    pub spread_factor: f64,
}

impl SpreadTolerance {
    /// Rule with explicit factors.
    pub fn new(mean_factor: f64, spread_factor: f64) -> Self {
        Self {
            mean_factor,
            spread_factor,
        }
    }

    fn within(&self, mean_gap: f64, spread_gap: f64, pooled: f64) -> bool {
        mean_gap <= self.mean_factor * pooled && spread_gap <= self.spread_factor * pooled
    }
}

impl Default for SpreadTolerance {
    fn default() -> Self {
        Self {
            mean_factor: 1.0,
            spread_factor: 0.5,
        }
    }
}

impl CompatibilityRule for SpreadTolerance {
    fn validate(&self) -> Result<()> {
        check_non_negative("mean_factor", self.mean_factor)?;
        check_non_negative("spread_factor", self.spread_factor)
    }

    fn accepts_pair(&self, a: &OccupancyPoint, b: &OccupancyPoint) -> bool {
        let pooled = 0.5 * (a.spread() + b.spread());
        self.within(a.delta_mean(b), a.delta_spread(b), pooled)
    }

    fn accepts(&self, cluster: &OccupancyCluster, candidate: &OccupancyPoint) -> bool {
        let pooled = cluster.average_spread();
        let mean_gap = (cluster.average_mean() - candidate.mean()).abs();
        let spread_gap = (pooled - candidate.spread()).abs();
        self.within(mean_gap, spread_gap, pooled)
    }
}

/// Fixed absolute gaps, independent of any spread scaling.
///
/// Useful for pinning orchestration behavior in tests and for populations
/// whose spread is not a trustworthy scale.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbsoluteTolerance {
    /// Largest allowed mean gap.
    pub max_mean_gap: f64,
    /// Largest allowed spread gap.
    pub max_spread_gap: f64,
}

impl AbsoluteTolerance {
    /// Rule with explicit gaps.
    pub fn new(max_mean_gap: f64, max_spread_gap: f64) -> Self {
        Self {
            max_mean_gap,
            max_spread_gap,
        }
    }
}

impl CompatibilityRule for AbsoluteTolerance {
    fn validate(&self) -> Result<()> {
        check_non_negative("max_mean_gap", self.max_mean_gap)?;
        check_non_negative("max_spread_gap", self.max_spread_gap)
    }

    fn accepts_pair(&self, a: &OccupancyPoint, b: &OccupancyPoint) -> bool {
        a.delta_mean(b) <= self.max_mean_gap && a.delta_spread(b) <= self.max_spread_gap
    }

    fn accepts(&self, cluster: &OccupancyCluster, candidate: &OccupancyPoint) -> bool {
        (cluster.average_mean() - candidate.mean()).abs() <= self.max_mean_gap
            && (cluster.average_spread() - candidate.spread()).abs() <= self.max_spread_gap
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidParameter {
            name,
            message: "must be finite and non-negative",
        });
    }
    Ok(())
}
