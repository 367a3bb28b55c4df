//! ContentUnit - one generated piece of content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{SEED_UNIT_ID, generate_unit_id};

/// A single unit of generated content.
///
/// Created exactly once per successful cycle and never mutated afterwards;
/// fields are private and only exposed through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl ContentUnit {
    /// Create a unit with a fresh ID stamped at `created_at`.
    pub fn new(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: generate_unit_id(),
            content: content.into(),
            created_at,
        }
    }

    /// Create the seed unit a transcript starts from.
    pub fn seed(content: impl Into<String>) -> Self {
        Self {
            id: SEED_UNIT_ID.to_string(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this is the seed unit.
    pub fn is_seed(&self) -> bool {
        self.id == SEED_UNIT_ID
    }
}
