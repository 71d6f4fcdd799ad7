// ── Pond aggregate ──

use serde::{Deserialize, Serialize};

use super::motor::Motor;

/// A pond and the motors assigned to it. One nesting level above the
/// flat motor listing; both views reconcile to the same outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pond {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub motors: Vec<Motor>,
}

impl Pond {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            motors: Vec::new(),
        }
    }

    pub fn with_motors(id: u32, name: impl Into<String>, motors: Vec<Motor>) -> Self {
        Self {
            id,
            name: name.into(),
            motors,
        }
    }
}
