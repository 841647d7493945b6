use crate::error::{FinanceError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;
pub const DEFAULT_DAY_BUCKET_HOUR: u32 = 12;

/// Tunables for an [`crate::InsightsEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[serde(default = "default_lookahead_days")]
    #[schemars(
        description = "How many days ahead (inclusive) a recurring obligation counts as upcoming. Range 0-366."
    )]
    pub lookahead_days: i64,

    #[serde(default = "default_day_bucket_hour")]
    #[schemars(
        description = "Hourly slot that receives all of a day's transactions at day granularity, since records carry no time of day. Range 0-23."
    )]
    pub day_bucket_hour: u32,
}

fn default_lookahead_days() -> i64 {
    DEFAULT_LOOKAHEAD_DAYS
}

fn default_day_bucket_hour() -> u32 {
    DEFAULT_DAY_BUCKET_HOUR
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            day_bucket_hour: DEFAULT_DAY_BUCKET_HOUR,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=366).contains(&self.lookahead_days) {
            return Err(FinanceError::InvalidLookahead(self.lookahead_days));
        }
        if self.day_bucket_hour > 23 {
            return Err(FinanceError::InvalidDaySlot(self.day_bucket_hour));
        }
        Ok(())
    }
}
