//! Configuration resolution.
//!
//! Walks the sources in order and takes the first one that supplies at
//! least one enabled sink. The winner is used as a whole; fields are never
//! merged across sources.

use crate::broadcast::BroadcastConfig;
use crate::error::{FeedrError, Result};

use super::GlobalConfig;
use super::sources::{ArgsSource, ConfigSource, EnvSource, StoredSource};

/// The configuration the loop will run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Name of the source that supplied it
    pub source: String,
    pub broadcast: BroadcastConfig,
}

/// Ordered list of configuration sources.
pub struct ConfigResolver {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigResolver {
    /// Create a resolver that consults `sources` in order.
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// The standard order: CLI flags, then environment, then config file.
    pub fn standard(args: ArgsSource, global: &GlobalConfig) -> Self {
        Self::new(vec![
            Box::new(args),
            Box::new(EnvSource::from_env()),
            Box::new(StoredSource::new(global.stored_broadcast())),
        ])
    }

    /// Names of the sources in resolution order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve the broadcast configuration.
    ///
    /// Returns `ConfigurationMissing` when no source has a usable sink.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        for source in &self.sources {
            match source.load()? {
                Some(config) if config.has_usable_credential() => {
                    log::info!("Using broadcast configuration from {}", source.name());
                    return Ok(ResolvedConfig {
                        source: source.name().to_string(),
                        broadcast: config,
                    });
                }
                Some(_) => log::debug!("Source {} has no enabled sink, skipping", source.name()),
                None => log::debug!("Source {} supplied nothing", source.name()),
            }
        }

        Err(FeedrError::ConfigurationMissing(format!(
            "no enabled sink in any of: {}",
            self.source_names().join(", ")
        )))
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("sources", &self.source_names())
            .finish()
    }
}
