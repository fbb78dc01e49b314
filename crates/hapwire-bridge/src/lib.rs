//! HTTP accessory bridge engine.
//!
//! This crate turns a declarative description of "how to read/write one
//! value over HTTP" into live accessory attributes:
//!
//! - **Mapper**: pluggable text transforms (static table, regex capture,
//!   XPath select, JSONPath select) chained per action
//! - **Action**: immutable unit of work — URL, method, body template,
//!   mapper chain, optional `"inconclusive"` fallback action
//! - **Dispatcher**: executes actions against the HTTP transport,
//!   applies mapper chains and fallback resolution, renders write
//!   templates through a restricted placeholder grammar
//! - **CharacteristicBinding**: wires a get/set action pair to one
//!   attribute, either synchronous-on-demand or on an independent poll
//!   loop, with a write-suppression latch against feedback loops
//! - **Accessory assembly**: builds services from configuration and the
//!   capability catalog

pub mod accessory;
pub mod action;
pub mod binding;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod mapper;
pub mod template;

// Re-exports for convenience
pub use accessory::{build_accessories, Accessory, Service};
pub use action::{Action, ActionConfig, DetailedActionConfig};
pub use binding::{BindingSpec, CharacteristicBinding};
pub use catalog::{
    BuiltinCatalog, CapabilityDefinition, Catalog, CharacteristicDescriptor, ValueFormat,
};
pub use config::{AccessoryConfig, BridgeConfig, CharacteristicConfig, ServiceConfig};
pub use dispatch::{Dispatcher, INCONCLUSIVE};
pub use http::{AuthConfig, HttpResponse, HttpTransport, ReqwestTransport};
pub use mapper::{Mapper, MapperConfig};
pub use template::{render, RenderContext};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
