use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixSource {
    OneShot,
    Watch,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverFix {
    pub coordinate: Coordinate,
    pub captured_at: DateTime<Utc>,
    pub source: FixSource,
}

impl DriverFix {
    pub fn now(coordinate: Coordinate, source: FixSource) -> Self {
        Self {
            coordinate,
            captured_at: Utc::now(),
            source,
        }
    }
}
