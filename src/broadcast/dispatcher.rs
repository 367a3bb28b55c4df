//! Broadcast Dispatcher
//!
//! Sends one piece of content to every enabled sink concurrently and waits
//! for all of them to settle. A failing sink is recorded and logged; it
//! never short-circuits the others and never fails the cycle.

use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::sinks::{Sink, SinkDescriptor, SinkError, SinkSettings};

/// Result of delivering to a single sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDelivery {
    pub sink: String,
    pub result: Result<(), SinkError>,
}

impl SinkDelivery {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Settled results of one broadcast, one entry per enabled sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub deliveries: Vec<SinkDelivery>,
}

impl BroadcastReport {
    /// Number of sinks that accepted the content
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_delivered()).count()
    }

    /// Deliveries that failed
    pub fn failed(&self) -> Vec<&SinkDelivery> {
        self.deliveries.iter().filter(|d| !d.is_delivered()).collect()
    }

    /// True when every sink accepted the content
    pub fn is_complete(&self) -> bool {
        self.deliveries.iter().all(SinkDelivery::is_delivered)
    }

    /// True when there were no enabled sinks
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Delivery for a named sink
    pub fn get(&self, sink: &str) -> Option<&SinkDelivery> {
        self.deliveries.iter().find(|d| d.sink == sink)
    }
}

/// The set of sink descriptors the loop broadcasts to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default)]
    pub sinks: Vec<SinkDescriptor>,
}

impl BroadcastConfig {
    pub fn new(sinks: Vec<SinkDescriptor>) -> Self {
        Self { sinks }
    }

    /// Add a descriptor
    pub fn with(mut self, sink: SinkDescriptor) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Descriptors whose credentials are all present
    pub fn enabled(&self) -> impl Iterator<Item = &SinkDescriptor> {
        self.sinks.iter().filter(|s| s.is_enabled())
    }

    /// At least one sink can be used
    pub fn has_usable_credential(&self) -> bool {
        self.enabled().next().is_some()
    }
}

/// Fans content out to a fixed set of sinks.
pub struct BroadcastDispatcher {
    sinks: Vec<Arc<dyn Sink>>,
}

impl BroadcastDispatcher {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Build adapters for the enabled descriptors in `config`.
    pub fn from_config(config: &BroadcastConfig, settings: &SinkSettings) -> Self {
        let client = Client::new();
        let sinks = config.enabled().map(|d| d.build(&client, settings)).collect();
        Self::new(sinks)
    }

    /// Names of the sinks this dispatcher will send to
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Send `text` to every enabled sink and wait for all of them.
    pub async fn broadcast(&self, text: &str) -> BroadcastReport {
        let sends = self.sinks.iter().filter(|s| s.is_enabled()).map(|sink| async move {
            let result = sink.send(text).await;
            match &result {
                Ok(()) => log::debug!("Delivered to {}", sink.name()),
                Err(e) => log::warn!("Broadcast to {} failed: {}", sink.name(), e),
            }
            SinkDelivery {
                sink: sink.name().to_string(),
                result,
            }
        });

        BroadcastReport {
            deliveries: join_all(sends).await,
        }
    }
}

impl std::fmt::Debug for BroadcastDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastDispatcher")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
