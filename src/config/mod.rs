//! Configuration system for feedr.
//!
//! Two concerns:
//! 1. Global config (~/.config/feedr/feedr.yml or .feedr.yml): generation,
//!    cadence, prompt and persisted sink credentials
//! 2. Broadcast resolution: CLI flags, then environment, then the stored
//!    credentials; the first source with an enabled sink wins

use eyre::Result;
use std::path::PathBuf;

pub use self::global::{
    BroadcastSection, DiscordCredentials, GlobalConfig, LlmConfig, LoopSettings, PromptConfig, TelegramCredentials,
};
pub use self::resolution::{ConfigResolver, ResolvedConfig};
pub use self::sources::{
    ArgsSource, ConfigSource, ENV_DISCORD_WEBHOOK, ENV_TG_CHAT, ENV_TG_TOKEN, EnvSource, StoredSource,
};

mod global;
mod resolution;
mod sources;

/// Load configuration from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .feedr.yml in current directory (project config)
/// 3. ~/.config/feedr/feedr.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<GlobalConfig> {
    let config = GlobalConfig::load(explicit_path)?;
    config.validate()?;
    Ok(config)
}
