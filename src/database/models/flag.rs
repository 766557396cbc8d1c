//! Boolean flag stored per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a flag collection (`queue`, `welcome_sent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagEntry {
    /// User id as a decimal string.
    pub key: String,
    pub value: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl FlagEntry {
    pub fn new(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value,
            updated_at: Utc::now(),
        }
    }
}
