use super::cluster::{Extent, OccupancyCluster};

/// Fractional headroom added above the extrema when framing a plot.
const HEADROOM: f64 = 0.03;

/// Upper plot bounds for the `(mean, spread)` plane.
///
/// Both axes start at zero; the upper bounds sit a few percent above the
/// largest sample so no marker lands on the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisRanges {
    /// Upper bound of the mean axis.
    pub mean_max: f64,
    /// Upper bound of the spread axis.
    pub spread_max: f64,
}

impl AxisRanges {
    /// Ranges covering `extent` plus headroom.
    pub fn from_extent(extent: Extent) -> Self {
        Self {
            mean_max: extent.max_mean * (1.0 + HEADROOM),
            spread_max: extent.max_spread * (1.0 + HEADROOM),
        }
    }
}

/// Receives clusters for display, decoupling the pass from any plotting
/// backend.
///
/// [`Partition::render_with`](super::Partition::render_with) calls
/// [`draw_cluster`](Self::draw_cluster) once per cluster, best first, with
/// the same axis ranges every time. `index` is the cluster's rank and
/// doubles as a stable palette slot: 0 is always the best cluster.
pub trait ClusterRenderer {
    fn draw_cluster(&mut self, index: usize, cluster: &OccupancyCluster, axes: &AxisRanges);
}
