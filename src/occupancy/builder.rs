use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::{debug, trace};

use super::cluster::{Extent, OccupancyCluster};
use super::point::{LayerId, OccupancyPoint};
use super::render::{AxisRanges, ClusterRenderer};
use super::rule::{CompatibilityRule, SpreadTolerance};
use crate::error::Result;

/// Orders clusters of equal population.
///
/// Population is always the primary sort key; the tie break only decides
/// between clusters of the same size, which matters most when it picks the
/// best cluster of the whole partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TieBreak {
    /// Prefer the cluster whose members spread the least.
    #[default]
    TightestSpread,
    /// Prefer the cluster with the lowest average mean.
    LowestMean,
}

impl TieBreak {
    fn compare(self, a: &OccupancyCluster, b: &OccupancyCluster) -> Ordering {
        match self {
            TieBreak::TightestSpread => a.average_spread().total_cmp(&b.average_spread()),
            TieBreak::LowestMean => a.average_mean().total_cmp(&b.average_mean()),
        }
    }
}

/// One entry of the pair index: a distance plus the working-set positions
/// it connects, with `first < second`.
#[derive(Clone, Copy, Debug)]
struct PairEntry {
    dist: f64,
    first: usize,
    second: usize,
}

impl PairEntry {
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.first.cmp(&other.first))
            .then_with(|| self.second.cmp(&other.second))
    }
}

impl PartialEq for PairEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key(other) == Ordering::Equal
    }
}

impl Eq for PairEntry {}

impl PartialOrd for PairEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PairEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key(other)
    }
}

/// All pairwise distances of the current working set, ordered closest
/// first. Rebuilt from scratch at the start of every round.
struct DistanceIndex {
    pairs: BTreeSet<PairEntry>,
}

impl DistanceIndex {
    fn build(points: &[OccupancyPoint]) -> Self {
        let mut pairs = BTreeSet::new();
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                pairs.insert(PairEntry {
                    dist: points[i].distance(&points[j]),
                    first: i,
                    second: j,
                });
            }
        }
        Self { pairs }
    }

    fn closest(&self) -> Option<PairEntry> {
        self.pairs.first().copied()
    }
}

/// Collects occupancy samples and partitions them into clusters.
///
/// The pass is greedy: each round seeds a cluster from the globally closest
/// remaining pair, grows it by repeatedly absorbing the point nearest to the
/// running centroid until the rule refuses one, then starts over on what is
/// left. The first rejected seed pair ends the pass and strands the rest of
/// the working set as singleton clusters.
///
/// Compatibility is delegated to a [`CompatibilityRule`], which defaults to
/// [`SpreadTolerance`]. Output order is fixed by population and the
/// configured [`TieBreak`], so two builds over the same samples always agree.
///
/// ```
/// use stray::{ClusterBuilder, LayerId};
///
/// let mut builder = ClusterBuilder::new();
/// builder.add_point(10.0, 1.0, LayerId(1));
/// builder.add_point(10.1, 1.05, LayerId(2));
/// builder.add_point(50.0, 5.0, LayerId(3));
///
/// let partition = builder.build_clusters()?;
/// assert!(partition.is_problematic(LayerId(3)));
/// # Ok::<(), stray::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ClusterBuilder<R = SpreadTolerance> {
    rule: R,
    tie_break: TieBreak,
    points: BTreeSet<OccupancyPoint>,
}

impl ClusterBuilder {
    /// Empty builder with the default rule and tie break.
    pub fn new() -> Self {
        Self {
            rule: SpreadTolerance::default(),
            tie_break: TieBreak::default(),
            points: BTreeSet::new(),
        }
    }
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CompatibilityRule> ClusterBuilder<R> {
    /// Swaps in a different compatibility rule, keeping the samples and the
    /// tie break already configured.
    pub fn with_rule<R2: CompatibilityRule>(self, rule: R2) -> ClusterBuilder<R2> {
        ClusterBuilder {
            rule,
            tie_break: self.tie_break,
            points: self.points,
        }
    }

    /// Sets how equally populated clusters are ordered.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Records one layer's occupancy statistics.
    ///
    /// A sample whose `(mean, spread)` matches one already recorded does not
    /// add a new point; the layer id joins the existing point instead, so
    /// exact duplicates are merged rather than double counted. Each layer is
    /// expected to report once per build; a layer reporting twice with
    /// different statistics simply contributes two points.
    pub fn add_point(&mut self, mean: f64, spread: f64, layer: LayerId) {
        let point = OccupancyPoint::new(mean, spread, layer);
        match self.points.take(&point) {
            Some(mut existing) => {
                existing.absorb_layers(point);
                self.points.insert(existing);
            }
            None => {
                self.points.insert(point);
            }
        }
    }

    /// Number of distinct sample points recorded so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Recorded points in ascending `(mean, spread)` order.
    pub fn points(&self) -> impl Iterator<Item = &OccupancyPoint> {
        self.points.iter()
    }

    /// Runs the clustering pass and consumes the builder.
    ///
    /// Fails only on unusable rule parameters; degenerate inputs (no
    /// samples, a single sample, nothing compatible) produce a well formed
    /// partition instead of an error.
    pub fn build_clusters(self) -> Result<Partition> {
        self.rule.validate()?;

        // Ascending sample order; index ties in the pair index therefore
        // resolve to the smallest points first, keeping rounds deterministic.
        let mut remaining: Vec<OccupancyPoint> = self.points.into_iter().collect();
        let mut clusters: Vec<OccupancyCluster> = Vec::new();
        let mut extent: Option<Extent> = None;

        while remaining.len() >= 2 {
            let index = DistanceIndex::build(&remaining);
            let seed = index
                .closest()
                .expect("pair index holds at least one entry for two or more samples");
            let (i, j) = (seed.first, seed.second);
            debug_assert!(
                i < j && j < remaining.len(),
                "pair index out of step with working set"
            );

            let Some(mut cluster) =
                OccupancyCluster::try_seed(&self.rule, &remaining[i], &remaining[j])
            else {
                debug!(
                    "closest pair at distance {:.4} rejected; {} samples stay unclustered",
                    seed.dist,
                    remaining.len()
                );
                break;
            };
            trace!("seeded cluster from pair at distance {:.4}", seed.dist);
            // Higher index first so the lower one stays valid.
            remaining.remove(j);
            remaining.remove(i);

            while let Some(ix) = nearest_to(&cluster, &remaining) {
                let dist = cluster.distance_to(&remaining[ix]);
                if cluster.try_add(&self.rule, &remaining[ix]) {
                    remaining.remove(ix);
                    trace!("absorbed sample at centroid distance {:.4}", dist);
                } else {
                    trace!("nearest sample at distance {:.4} rejected", dist);
                    break;
                }
            }

            debug!("cluster closed with {} members", cluster.len());
            extent = Some(match extent {
                Some(acc) => acc.union(cluster.extent()),
                None => cluster.extent(),
            });
            clusters.push(cluster);
        }

        for point in remaining {
            let cluster = OccupancyCluster::singleton(point);
            extent = Some(match extent {
                Some(acc) => acc.union(cluster.extent()),
                None => cluster.extent(),
            });
            clusters.push(cluster);
        }

        sort_clusters(&mut clusters, self.tie_break);

        let problematic: BTreeSet<LayerId> = clusters
            .iter()
            .skip(1)
            .flat_map(|cluster| cluster.layer_ids())
            .collect();
        debug!(
            "partition holds {} clusters and {} problematic layers",
            clusters.len(),
            problematic.len()
        );

        Ok(Partition {
            clusters,
            problematic,
            extent: extent.unwrap_or_default(),
        })
    }
}

/// Position of the remaining point nearest to the cluster centroid. Ties
/// keep the earliest position.
fn nearest_to(cluster: &OccupancyCluster, remaining: &[OccupancyPoint]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (ix, point) in remaining.iter().enumerate() {
        let dist = cluster.distance_to(point);
        let closer = match best {
            Some((_, best_dist)) => dist.total_cmp(&best_dist) == Ordering::Less,
            None => true,
        };
        if closer {
            best = Some((ix, dist));
        }
    }
    best.map(|(ix, _)| ix)
}

/// Most populated first; the tie break and then the smallest member settle
/// equal populations, making the order a total one.
fn sort_clusters(clusters: &mut [OccupancyCluster], tie_break: TieBreak) {
    clusters.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| tie_break.compare(a, b))
            .then_with(|| first_point(a).cmp(first_point(b)))
    });
}

fn first_point(cluster: &OccupancyCluster) -> &OccupancyPoint {
    cluster.points().first().expect("clusters are never empty")
}

/// Result of a clustering pass.
///
/// Clusters come ordered best first. Every layer outside the best cluster is
/// problematic; a partition with at most one cluster flags nothing.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    clusters: Vec<OccupancyCluster>,
    problematic: BTreeSet<LayerId>,
    extent: Extent,
}

impl Partition {
    /// Clusters ordered best first.
    pub fn clusters(&self) -> &[OccupancyCluster] {
        &self.clusters
    }

    /// The most populated cluster, or `None` for an empty partition.
    pub fn best_cluster(&self) -> Option<&OccupancyCluster> {
        self.clusters.first()
    }

    /// Whether `layer` landed outside the best cluster.
    pub fn is_problematic(&self, layer: LayerId) -> bool {
        self.problematic.contains(&layer)
    }

    /// All flagged layers, in ascending id order.
    pub fn problematic_layers(&self) -> &BTreeSet<LayerId> {
        &self.problematic
    }

    /// Extrema over all samples of the build.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Plot ranges sized to the extent plus headroom.
    pub fn axis_ranges(&self) -> AxisRanges {
        AxisRanges::from_extent(self.extent)
    }

    /// Hands every cluster to `renderer`, best first, together with the
    /// shared axis ranges.
    pub fn render_with<D: ClusterRenderer + ?Sized>(&self, renderer: &mut D) {
        let axes = self.axis_ranges();
        for (index, cluster) in self.clusters.iter().enumerate() {
            renderer.draw_cluster(index, cluster, &axes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::occupancy::rule::AbsoluteTolerance;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn duplicate_samples_merge_their_layers() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 1.0, LayerId(1));
        builder.add_point(10.0, 1.0, LayerId(2));
        builder.add_point(10.0, 1.0, LayerId(1)); // same triple again

        assert_eq!(builder.len(), 1);
        let point = builder.points().next().expect("one merged point");
        let layers: Vec<u32> = point.layers().iter().map(|id| id.0).collect();
        assert_eq!(layers, vec![1, 2]);
    }

    #[test]
    fn two_close_layers_and_one_stray() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 1.0, LayerId(1));
        builder.add_point(10.1, 1.05, LayerId(2));
        builder.add_point(50.0, 5.0, LayerId(3));

        let partition = builder.build_clusters().expect("valid parameters");

        assert_eq!(partition.clusters().len(), 2);
        let best = partition.best_cluster().expect("non-empty partition");
        assert_eq!(best.len(), 2);
        let best_layers: Vec<u32> = best.layer_ids().into_iter().map(|id| id.0).collect();
        assert_eq!(best_layers, vec![1, 2]);

        assert!(!partition.is_problematic(LayerId(1)));
        assert!(!partition.is_problematic(LayerId(2)));
        assert!(partition.is_problematic(LayerId(3)));

        let extent = partition.extent();
        assert_eq!(extent.max_mean, 50.0);
        assert_eq!(extent.max_spread, 5.0);
    }

    #[test]
    fn empty_builder_yields_empty_partition() {
        let partition = ClusterBuilder::new()
            .build_clusters()
            .expect("valid parameters");

        assert!(partition.clusters().is_empty());
        assert!(partition.best_cluster().is_none());
        assert!(partition.problematic_layers().is_empty());
        assert_eq!(partition.extent(), Extent::default());
    }

    #[test]
    fn single_sample_is_best_and_unflagged() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 1.0, LayerId(1));

        let partition = builder.build_clusters().expect("valid parameters");

        assert_eq!(partition.clusters().len(), 1);
        assert!(!partition.is_problematic(LayerId(1)));
        assert_eq!(partition.extent().max_mean, 10.0);
    }

    #[test]
    fn incompatible_samples_stay_singletons() {
        let mut builder = ClusterBuilder::new();
        for (ix, mean) in [10.0, 20.0, 30.0, 40.0].into_iter().enumerate() {
            builder.add_point(mean, 0.001, LayerId(ix as u32 + 1));
        }

        let partition = builder.build_clusters().expect("valid parameters");

        assert_eq!(partition.clusters().len(), 4);
        assert!(partition.clusters().iter().all(|c| c.len() == 1));
        // All populations tie; the smallest point wins the final tie break.
        let best = partition.best_cluster().expect("non-empty partition");
        assert!(close(best.average_mean(), 10.0));
        let flagged: Vec<u32> = partition
            .problematic_layers()
            .iter()
            .map(|id| id.0)
            .collect();
        assert_eq!(flagged, vec![2, 3, 4]);
    }

    #[test]
    fn first_seed_rejection_ends_the_pass() {
        // The globally closest pair has spreads far too tight for its mean
        // gap, so no cluster forms even though the two wide samples would
        // make a fine pair of their own.
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 0.01, LayerId(1));
        builder.add_point(10.1, 0.01, LayerId(2));
        builder.add_point(20.0, 10.0, LayerId(3));
        builder.add_point(20.5, 10.0, LayerId(4));

        let partition = builder.build_clusters().expect("valid parameters");

        assert_eq!(partition.clusters().len(), 4);
        assert!(partition.clusters().iter().all(|c| c.len() == 1));
    }

    #[test]
    fn rebuilding_the_same_samples_agrees() {
        let mut builder = ClusterBuilder::new();
        for (ix, (mean, spread)) in [(10.0, 1.0), (10.2, 1.1), (9.9, 0.9), (50.0, 5.0)]
            .into_iter()
            .enumerate()
        {
            builder.add_point(mean, spread, LayerId(ix as u32));
        }

        let first = builder.clone().build_clusters().expect("valid parameters");
        let second = builder.build_clusters().expect("valid parameters");
        assert_eq!(first, second);
    }

    #[test]
    fn tie_break_picks_the_best_among_equal_populations() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 2.0, LayerId(1));
        builder.add_point(10.1, 2.1, LayerId(2));
        builder.add_point(100.0, 1.0, LayerId(3));
        builder.add_point(100.1, 1.05, LayerId(4));

        let tight = builder
            .clone()
            .build_clusters()
            .expect("valid parameters");
        let best = tight.best_cluster().expect("non-empty partition");
        assert!(close(best.average_mean(), 100.05));
        assert!(tight.is_problematic(LayerId(1)));
        assert!(!tight.is_problematic(LayerId(3)));

        let low = builder
            .with_tie_break(TieBreak::LowestMean)
            .build_clusters()
            .expect("valid parameters");
        let best = low.best_cluster().expect("non-empty partition");
        assert!(close(best.average_mean(), 10.05));
        assert!(!low.is_problematic(LayerId(1)));
        assert!(low.is_problematic(LayerId(3)));
    }

    #[test]
    fn swapping_the_rule_changes_the_partition() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 1.0, LayerId(1));
        builder.add_point(12.0, 1.0, LayerId(2));
        builder.add_point(50.0, 1.0, LayerId(3));

        // Pooled-spread gating: a 2.0 mean gap over unit spreads is too far.
        let strict = builder.clone().build_clusters().expect("valid parameters");
        assert_eq!(strict.clusters().len(), 3);

        let loose = builder
            .with_rule(AbsoluteTolerance::new(5.0, 1.0))
            .build_clusters()
            .expect("valid parameters");
        assert_eq!(loose.clusters().len(), 2);
        assert_eq!(loose.best_cluster().expect("non-empty").len(), 2);
        assert!(loose.is_problematic(LayerId(3)));
    }

    #[test]
    fn unusable_rule_parameters_fail_the_build() {
        let mut builder = ClusterBuilder::new().with_rule(SpreadTolerance::new(-1.0, 0.5));
        builder.add_point(10.0, 1.0, LayerId(1));

        assert!(matches!(
            builder.build_clusters(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn non_finite_sample_is_flagged_not_fatal() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 1.0, LayerId(1));
        builder.add_point(10.1, 1.0, LayerId(2));
        builder.add_point(f64::NAN, 1.0, LayerId(3));

        let partition = builder.build_clusters().expect("valid parameters");

        assert_eq!(partition.clusters().len(), 2);
        assert!(partition.is_problematic(LayerId(3)));
        assert!(!partition.is_problematic(LayerId(1)));
    }

    #[test]
    fn growth_absorbs_nearest_compatible_candidates() {
        let mut builder = ClusterBuilder::new();
        builder.add_point(10.0, 1.0, LayerId(1));
        builder.add_point(10.1, 1.0, LayerId(2));
        builder.add_point(10.3, 1.1, LayerId(3));
        builder.add_point(9.8, 0.9, LayerId(4));
        builder.add_point(80.0, 8.0, LayerId(5));

        let partition = builder.build_clusters().expect("valid parameters");

        let best = partition.best_cluster().expect("non-empty partition");
        assert_eq!(best.len(), 4);
        assert_eq!(
            partition.problematic_layers().iter().next(),
            Some(&LayerId(5))
        );
    }
}
