use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use stoon_system_generator::Config as GeneratorConfig;
use stoon_world::config::MapConfig;

/// Settings file layout: a `[map]` table and a `[generator]` table, both optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Map store tunables.
    pub(crate) map: MapConfig,
    /// Terrain generator tunables.
    pub(crate) generator: GeneratorConfig,
}

impl CliConfig {
    /// Loads settings from `path`, or the defaults when no path was given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse config {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if !(config.map.triangle_size.is_finite() && config.map.triangle_size > 0.0) {
            anyhow::bail!("map.triangle_size must be a positive number");
        }
        if !(config.map.index.extent.is_finite() && config.map.index.extent > 0.0) {
            anyhow::bail!("map.index.extent must be a positive number");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use stoon_world::config::AdjacencyRule;

    use super::*;

    #[test]
    fn missing_path_uses_defaults() {
        assert_eq!(CliConfig::load(None).expect("defaults"), CliConfig::default());
    }

    #[test]
    fn tables_override_their_sections() {
        let config = CliConfig::parse(
            r#"
            [map]
            adjacency = "any_matching_corner"
            trace_writes = true

            [generator]
            seed = 99
            weights = [5, 1, 1, 1, 2]
            "#,
        )
        .expect("parses");
        assert_eq!(config.map.adjacency, AdjacencyRule::AnyMatchingCorner);
        assert!(config.map.trace_writes);
        assert_eq!(config.generator.seed, 99);
        assert_eq!(config.generator.weights, [5, 1, 1, 1, 2]);
    }

    #[test]
    fn rejects_unknown_tables_and_bad_sizes() {
        assert!(CliConfig::parse("[render]\nscale = 2").is_err());
        assert!(CliConfig::parse("[map]\ntriangle_size = 0.0").is_err());
    }
}
