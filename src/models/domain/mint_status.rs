use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin switch controlling whether eligible students may claim certificates.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MintStatus {
    pub allowed: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for MintStatus {
    fn default() -> Self {
        Self {
            allowed: false,
            updated_at: None,
        }
    }
}

impl MintStatus {
    pub fn toggled(&self) -> Self {
        Self {
            allowed: !self.allowed,
            updated_at: Some(Utc::now()),
        }
    }
}
