//! Prompt Renderer - frame the compressed context for the generator
//!
//! The generator never sees the raw context alone: it is wrapped between a
//! standing system instruction and a directive asking for the next unit.

use serde::{Deserialize, Serialize};

/// Default standing instruction.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
[ROLE]: You are the narrator of an endless serialized story that is broadcast live.

[GUIDELINES]:
1. Continue directly from the feed below. Never restart or summarize it.
2. Write in the present tense.
3. Each installment is a few short paragraphs and ends on an open thread.

[OUTPUT FORMAT]:
- Timestamp: [HH:MM:SS]
- Location: [GRID_REF]
- Narrative: the next installment";

/// Default closing directive.
pub const DEFAULT_DIRECTIVE: &str = "CONTINUE THE FEED WITH THE NEXT INSTALLMENT.";

/// Default seed the transcript starts from.
pub const DEFAULT_SEED: &str = "[SYSTEM_BOOT]: FEED INITIATED.\nSTATUS: LIVE";

/// Frames a context string into a full generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Standing instruction placed before the feed
    pub system: String,
    /// Instruction placed after the feed
    pub directive: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            directive: DEFAULT_DIRECTIVE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, directive: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            directive: directive.into(),
        }
    }

    /// Render the full prompt around `context`.
    pub fn render(&self, context: &str) -> String {
        format!(
            "{}\n\n[LIVE_FEED_DATA_STREAM]:\n\"{}\"\n\n[DIRECTIVE]: {}",
            self.system.trim_end(),
            context,
            self.directive.trim()
        )
    }
}
