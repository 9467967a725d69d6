//! Occupancy clustering for detector monitoring.
//!
//! `stray` groups per-layer occupancy statistics into clusters and flags the
//! layers that do not fit the bulk of the detector. The entry point is
//! [`ClusterBuilder`]: feed it one `(mean, spread)` sample per layer, run
//! [`build_clusters`](ClusterBuilder::build_clusters), and read the flagged
//! layers off the returned [`Partition`].
//!
//! The full pass, its tuning knobs, and the rendering hook live under
//! [`occupancy`].

#![forbid(unsafe_code)]

pub mod error;
pub mod occupancy;

pub use error::{Error, Result};
pub use occupancy::{
    AbsoluteTolerance, AxisRanges, ClusterBuilder, ClusterRenderer, CompatibilityRule, Extent,
    LayerId, OccupancyCluster, OccupancyPoint, Partition, SpreadTolerance, TieBreak,
};
