use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::DEFAULT_HIGH_WATER_MARK;

/// Settings for scheduling observer invocations.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DispatchConfig {
    /// Number of unfinished observer invocations above which a warning is
    /// logged. Must be at least 1. Scheduling never blocks.
    #[serde(default = "default_high_water_mark")]
    pub high_water_mark: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

fn default_high_water_mark() -> usize {
    DEFAULT_HIGH_WATER_MARK
}
