//! Greedy clustering of per-layer occupancy statistics.
//!
//! Each detector layer reports the mean and spread of its cell occupancy.
//! Healthy layers land close together in the `(mean, spread)` plane, while
//! dead, noisy, or miscabled layers drift away from the pack. The pass in
//! this module groups the reports into clusters and flags every layer that
//! falls outside the most populated one.
//!
//! The algorithm is a greedy agglomeration. Each round:
//!
//! 1. rebuild the index of all pairwise distances over the unclustered
//!    samples and pick the globally closest pair;
//! 2. if the [`CompatibilityRule`] rejects that pair, stop: everything
//!    still unclustered becomes a singleton cluster;
//! 3. otherwise seed a cluster from the pair, then repeatedly absorb the
//!    sample nearest to the running centroid until the rule refuses one;
//! 4. start over on the samples left.
//!
//! Clusters are then ordered by population (ties settled by the configured
//! [`TieBreak`]) and the layers outside the first cluster are reported as
//! problematic. The pass is fully deterministic: samples are held in
//! ascending `(mean, spread)` order and every comparison uses the IEEE
//! total order, so the same input always yields the same partition. Cost is
//! O(n^2 log n) per round from the index rebuild, which is comfortable at
//! the few hundred layers a detector reports.
//!
//! ```
//! use stray::{ClusterBuilder, LayerId};
//!
//! let mut builder = ClusterBuilder::new();
//! builder.add_point(10.0, 1.0, LayerId(1));
//! builder.add_point(10.1, 1.05, LayerId(2));
//! builder.add_point(50.0, 5.0, LayerId(3));
//!
//! let partition = builder.build_clusters()?;
//! assert_eq!(partition.clusters().len(), 2);
//! assert_eq!(partition.best_cluster().unwrap().len(), 2);
//! assert!(partition.is_problematic(LayerId(3)));
//! assert!(!partition.is_problematic(LayerId(1)));
//! # Ok::<(), stray::Error>(())
//! ```

mod builder;
mod cluster;
mod point;
mod render;
mod rule;

pub use builder::{ClusterBuilder, Partition, TieBreak};
pub use cluster::{Extent, OccupancyCluster};
pub use point::{LayerId, OccupancyPoint};
pub use render::{AxisRanges, ClusterRenderer};
pub use rule::{AbsoluteTolerance, CompatibilityRule, SpreadTolerance};
