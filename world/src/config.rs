//! Construction-time configuration for the map store.

use serde::{Deserialize, Serialize};
use stoon_core::geometry::{TriangleLayout, DEFAULT_KEY_PRECISION, DEFAULT_TRIANGLE_SIZE};

/// Policy deciding how a new triangle must connect to the existing world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyRule {
    /// Exactly two of the three corners must already exist.
    #[default]
    ExactlyTwoCorners,
    /// At least one corner must already exist.
    AnyMatchingCorner,
}

/// Tunables of the quadtree backing position lookups.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Side length of the square covered by the root node, centered on the origin.
    pub extent: f64,
    /// Points a node holds before splitting into quadrants.
    pub node_capacity: usize,
    /// Side length at or below which nodes stop splitting.
    pub min_node_size: f64,
    /// Distance under which two positions count as the same point.
    pub duplicate_epsilon: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extent: 1000.0,
            node_capacity: 8,
            min_node_size: 0.1,
            duplicate_epsilon: 0.001,
        }
    }
}

/// Configuration passed into the map store at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Half the side length of a triangle in world units.
    pub triangle_size: f64,
    /// Fractional digits kept when quantizing corner positions into keys.
    pub key_precision: u32,
    /// Spatial index tunables.
    pub index: IndexConfig,
    /// Connectivity policy applied to placements.
    pub adjacency: AdjacencyRule,
    /// Emits a trace event for every point written to the store.
    pub trace_writes: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            triangle_size: DEFAULT_TRIANGLE_SIZE,
            key_precision: DEFAULT_KEY_PRECISION,
            index: IndexConfig::default(),
            adjacency: AdjacencyRule::default(),
            trace_writes: false,
        }
    }
}

impl MapConfig {
    /// Geometry derived from the configured triangle size.
    #[must_use]
    pub const fn layout(&self) -> TriangleLayout {
        TriangleLayout::new(self.triangle_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = MapConfig::default();
        assert_eq!(config.key_precision, 6);
        assert_eq!(config.index.node_capacity, 8);
        assert!((config.index.min_node_size - 0.1).abs() < f64::EPSILON);
        assert!((config.index.duplicate_epsilon - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.adjacency, AdjacencyRule::ExactlyTwoCorners);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: MapConfig = toml::from_str(
            r#"
            triangle_size = 2.0
            adjacency = "any_matching_corner"

            [index]
            node_capacity = 4
            "#,
        )
        .expect("config parses");
        assert!((config.triangle_size - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.adjacency, AdjacencyRule::AnyMatchingCorner);
        assert_eq!(config.index.node_capacity, 4);
        assert!((config.index.extent - 1000.0).abs() < f64::EPSILON);
        assert_eq!(config.key_precision, 6);
    }
}
