//! Flagging hot and dead layers in a simulated detector readout.
//!
//! Run with `RUST_LOG=stray=debug` to watch the pass work.

use stray::{AxisRanges, ClusterBuilder, ClusterRenderer, LayerId, OccupancyCluster};

/// Prints each cluster the way a plotting backend would draw it.
struct TextRenderer;

impl ClusterRenderer for TextRenderer {
    fn draw_cluster(&mut self, index: usize, cluster: &OccupancyCluster, axes: &AxisRanges) {
        println!(
            "cluster {} [{} layers, centroid ({:6.1}, {:5.2}), axes up to ({:.1}, {:.2})]",
            index,
            cluster.len(),
            cluster.average_mean(),
            cluster.average_spread(),
            axes.mean_max,
            axes.spread_max,
        );
        for point in cluster.points() {
            let ids: Vec<String> = point.layers().iter().map(|id| id.to_string()).collect();
            println!(
                "  ({:6.1}, {:5.2}) layers [{}]",
                point.mean(),
                point.spread(),
                ids.join(", ")
            );
        }
    }
}

fn main() {
    env_logger::init();

    // Fourteen healthy layers around (200, 14), one dead and one hot.
    let readings: &[(u32, f64, f64)] = &[
        (1, 198.4, 13.9),
        (2, 201.2, 14.3),
        (3, 199.7, 13.6),
        (4, 202.8, 14.8),
        (5, 196.3, 13.2),
        (6, 203.5, 14.1),
        (7, 200.9, 13.8),
        (8, 197.6, 14.5),
        (9, 204.1, 14.9),
        (10, 195.8, 13.4),
        (11, 202.2, 14.6),
        (12, 199.1, 13.7),
        (13, 201.7, 14.2),
        (14, 198.9, 13.5),
        (15, 3.0, 0.5),
        (16, 900.0, 40.0),
    ];

    let mut builder = ClusterBuilder::new();
    for &(layer, mean, spread) in readings {
        builder.add_point(mean, spread, LayerId(layer));
    }

    let partition = builder.build_clusters().expect("default rule is valid");

    println!(
        "{} clusters, {} problematic layers\n",
        partition.clusters().len(),
        partition.problematic_layers().len()
    );
    partition.render_with(&mut TextRenderer);

    println!();
    for &(layer, mean, spread) in readings {
        let verdict = if partition.is_problematic(LayerId(layer)) {
            "PROBLEMATIC"
        } else {
            "ok"
        };
        println!("layer {:2} ({:6.1}, {:5.2}) => {}", layer, mean, spread, verdict);
    }
}
