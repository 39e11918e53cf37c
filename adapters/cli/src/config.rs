use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sokogen_generator::GeneratorConfig;

/// Generation settings read from a TOML file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Seed used when none is given on the command line.
    pub(crate) seed: Option<u64>,
    /// Smallest number of goal/box pairs.
    pub(crate) min_entities: Option<usize>,
    /// Largest number of goal/box pairs.
    pub(crate) max_entities: Option<usize>,
    /// Edge length of a synthesis division.
    pub(crate) division_size: Option<u32>,
    /// Smallest number of divisions per axis.
    pub(crate) min_divisions: Option<u32>,
    /// Largest number of divisions per axis.
    pub(crate) max_divisions: Option<u32>,
    /// Minimum goal to box Manhattan distance.
    pub(crate) min_manhattan: Option<u32>,
    /// Number of farthest box candidates to pick from.
    pub(crate) farthest_pick: Option<usize>,
    /// Solver configuration history budget in MiB.
    pub(crate) history_budget_mib: Option<usize>,
    /// Time budget in seconds.
    pub(crate) time_budget_secs: Option<u64>,
}

impl FileConfig {
    /// Reads and parses the file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    /// Parses `contents` and checks the ranges it resolves to once the
    /// missing keys fall back to the generator defaults.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("invalid toml contents")?;
        let resolved = config.clone().into_generator_config();
        if resolved.min_entities > resolved.max_entities {
            bail!(
                "min_entities {} exceeds max_entities {}",
                resolved.min_entities,
                resolved.max_entities
            );
        }
        let synthesis = &resolved.synthesis;
        if synthesis.min_divisions > synthesis.max_divisions {
            bail!(
                "min_divisions {} exceeds max_divisions {}",
                synthesis.min_divisions,
                synthesis.max_divisions
            );
        }
        Ok(config)
    }

    /// Applies the present keys on top of the generator defaults.
    pub(crate) fn into_generator_config(self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        if let Some(value) = self.min_entities {
            config.min_entities = value;
        }
        if let Some(value) = self.max_entities {
            config.max_entities = value;
        }
        if let Some(value) = self.division_size {
            config.synthesis.division_size = value;
        }
        if let Some(value) = self.min_divisions {
            config.synthesis.min_divisions = value;
        }
        if let Some(value) = self.max_divisions {
            config.synthesis.max_divisions = value;
        }
        if let Some(value) = self.min_manhattan {
            config.placement.min_manhattan = value;
        }
        if let Some(value) = self.farthest_pick {
            config.placement.farthest_pick = value;
        }
        if let Some(value) = self.history_budget_mib {
            config.solver.history_budget = value.saturating_mul(1 << 20);
        }
        if let Some(value) = self.time_budget_secs {
            config.time_budget = Duration::from_secs(value);
        }
        config
    }
}
