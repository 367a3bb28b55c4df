//! Broadcast - best-effort fan-out of one unit to every enabled sink

pub mod dispatcher;

pub use dispatcher::{BroadcastConfig, BroadcastDispatcher, BroadcastReport, SinkDelivery};
