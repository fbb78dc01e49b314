//! Shared foundation for the hapwire HTTP accessory bridge.
//!
//! This crate provides the pieces every other hapwire crate builds on:
//! - **Error**: unified error type and `Result` alias
//! - **BridgeEvent**: events emitted by accessory bindings
//! - **EventBus**: broadcast distribution of bridge events

pub mod error;
pub mod event;
pub mod eventbus;

pub use error::{Error, Result};
pub use event::{now_ts, BridgeEvent};
pub use eventbus::{EventBus, EventBusReceiver, DEFAULT_CHANNEL_CAPACITY};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
