//! Broadcast configuration sources.
//!
//! Each source may or may not supply sink credentials. Runtime sources (CLI
//! flags, environment) are consulted before the persisted config file.

use crate::broadcast::BroadcastConfig;
use crate::error::Result;
use crate::sinks::SinkDescriptor;

/// Environment variable for the Telegram bot token
pub const ENV_TG_TOKEN: &str = "FEEDR_TG_TOKEN";

/// Environment variable for the Telegram chat id
pub const ENV_TG_CHAT: &str = "FEEDR_TG_CHAT";

/// Environment variable for the Discord webhook URL
pub const ENV_DISCORD_WEBHOOK: &str = "FEEDR_DISCORD_WEBHOOK";

/// Something that can supply a broadcast configuration.
pub trait ConfigSource: Send + Sync {
    /// Source name, reported when it wins resolution
    fn name(&self) -> &str;

    /// The configuration this source supplies, if any
    fn load(&self) -> Result<Option<BroadcastConfig>>;
}

/// Build a config from optional credential parts; `None` when nothing was given.
fn from_parts(tg_token: Option<&str>, tg_chat: Option<&str>, discord: Option<&str>) -> Option<BroadcastConfig> {
    if tg_token.is_none() && tg_chat.is_none() && discord.is_none() {
        return None;
    }

    let mut config = BroadcastConfig::default();
    if tg_token.is_some() || tg_chat.is_some() {
        config = config.with(SinkDescriptor::telegram(
            tg_token.unwrap_or_default(),
            tg_chat.unwrap_or_default(),
        ));
    }
    if let Some(url) = discord {
        config = config.with(SinkDescriptor::discord(url));
    }
    Some(config)
}

/// Credentials passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    pub tg_token: Option<String>,
    pub tg_chat: Option<String>,
    pub discord: Option<String>,
}

impl ArgsSource {
    pub fn new(tg_token: Option<String>, tg_chat: Option<String>, discord: Option<String>) -> Self {
        Self {
            tg_token,
            tg_chat,
            discord,
        }
    }
}

impl ConfigSource for ArgsSource {
    fn name(&self) -> &str {
        "args"
    }

    fn load(&self) -> Result<Option<BroadcastConfig>> {
        Ok(from_parts(
            self.tg_token.as_deref(),
            self.tg_chat.as_deref(),
            self.discord.as_deref(),
        ))
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Credentials from FEEDR_* environment variables.
pub struct EnvSource {
    lookup: Lookup,
}

impl EnvSource {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Read through a custom lookup
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn load(&self) -> Result<Option<BroadcastConfig>> {
        let token = (self.lookup)(ENV_TG_TOKEN);
        let chat = (self.lookup)(ENV_TG_CHAT);
        let discord = (self.lookup)(ENV_DISCORD_WEBHOOK);
        Ok(from_parts(token.as_deref(), chat.as_deref(), discord.as_deref()))
    }
}

impl std::fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSource").finish_non_exhaustive()
    }
}

/// Credentials persisted in the config file.
#[derive(Debug, Clone, Default)]
pub struct StoredSource {
    config: BroadcastConfig,
}

impl StoredSource {
    pub fn new(config: BroadcastConfig) -> Self {
        Self { config }
    }
}

impl ConfigSource for StoredSource {
    fn name(&self) -> &str {
        "stored"
    }

    fn load(&self) -> Result<Option<BroadcastConfig>> {
        if self.config.sinks.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.config.clone()))
    }
}
