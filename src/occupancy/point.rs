use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a detector layer.
///
/// The engine never interprets the value; callers pack whatever addressing
/// scheme they use (wheel/station/sector/layer, flat index, ...) into the
/// `u32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One occupancy statistic: a mean occupancy and its spread, plus the layers
/// that reported this exact pair.
///
/// Equality and ordering look at `(mean, spread)` only, lexicographically and
/// under the IEEE total order, so the point doubles as a value-deduplicating
/// ordered-set key. The layer set never participates in comparisons, which is
/// also why `Hash` is not implemented.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyPoint {
    mean: f64,
    spread: f64,
    layers: BTreeSet<LayerId>,
}

impl OccupancyPoint {
    /// Point for a single layer's statistics.
    pub fn new(mean: f64, spread: f64, layer: LayerId) -> Self {
        let mut layers = BTreeSet::new();
        layers.insert(layer);
        Self {
            mean,
            spread,
            layers,
        }
    }

    /// Mean occupancy.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Spread of the occupancy (RMS or similar; non-negative by contract).
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Layers that share this exact `(mean, spread)` pair.
    pub fn layers(&self) -> &BTreeSet<LayerId> {
        &self.layers
    }

    /// Absolute gap between the two means.
    pub fn delta_mean(&self, other: &Self) -> f64 {
        (self.mean - other.mean).abs()
    }

    /// Absolute gap between the two spreads.
    pub fn delta_spread(&self, other: &Self) -> f64 {
        (self.spread - other.spread).abs()
    }

    /// Euclidean distance in the `(mean, spread)` plane.
    ///
    /// Symmetric, and zero from a point to itself.
    pub fn distance(&self, other: &Self) -> f64 {
        let dm = self.delta_mean(other);
        let ds = self.delta_spread(other);
        (dm * dm + ds * ds).sqrt()
    }

    /// Merge another point's layers into this one.
    ///
    /// Only meaningful when both points carry the same `(mean, spread)`; the
    /// builder calls this when an ingested statistic collides with an
    /// existing sample.
    pub(crate) fn absorb_layers(&mut self, other: Self) {
        self.layers.extend(other.layers);
    }
}

impl PartialEq for OccupancyPoint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OccupancyPoint {}

impl PartialOrd for OccupancyPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OccupancyPoint {
    /// Lexicographic `(mean, spread)` under `f64::total_cmp`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.mean
            .total_cmp(&other.mean)
            .then_with(|| self.spread.total_cmp(&other.spread))
    }
}
