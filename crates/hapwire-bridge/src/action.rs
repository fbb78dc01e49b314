//! Declarative actions: one unit of read/write work over HTTP.
//!
//! An action is built once from configuration and never mutated. It names
//! at most one HTTP call (URL, method, body template), an ordered mapper
//! chain, and an optional fallback action resolved when the mapped result
//! is the `"inconclusive"` sentinel.

use crate::mapper::{self, Mapper, MapperConfig};
use serde::Deserialize;

fn default_http_method() -> String {
    "GET".to_string()
}

/// Configuration form of an action: either a bare URL string or a
/// structured object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    /// Shorthand: `"http://host/path"` means GET that URL, no body,
    /// no mappers.
    Url(String),
    /// Full form with method, body template, mappers and fallback.
    Detailed(DetailedActionConfig),
}

/// Structured action configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedActionConfig {
    /// Target URL; absent means the action is a constant.
    #[serde(default)]
    pub url: Option<String>,
    /// HTTP method, default GET.
    #[serde(default = "default_http_method")]
    pub http_method: String,
    /// Body template, default empty.
    #[serde(default)]
    pub body: String,
    /// Ordered mapper chain.
    #[serde(default)]
    pub mappers: Vec<MapperConfig>,
    /// Fallback action for the `"inconclusive"` sentinel.
    #[serde(default)]
    pub inconclusive: Option<Box<ActionConfig>>,
}

/// A compiled action, immutable once constructed.
///
/// The fallback chain is an owned tree: self-referential chains are
/// unrepresentable, so resolution depth always equals the configured
/// chain length.
#[derive(Debug, Clone)]
pub struct Action {
    /// Target URL; `None` makes this a terminal constant action whose
    /// result is its literal `body`.
    pub url: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Body template.
    pub body: String,
    /// Compiled mapper chain, applied in declared order.
    pub mappers: Vec<Mapper>,
    /// Fallback resolved when the mapped result is `"inconclusive"`.
    pub inconclusive: Option<Box<Action>>,
}

impl Action {
    /// Build an action from its configuration form.
    ///
    /// Mapper entries that cannot be compiled are dropped (see
    /// [`MapperConfig`]); the fallback is built recursively.
    pub fn from_config(config: &ActionConfig) -> Self {
        match config {
            ActionConfig::Url(url) => Self {
                url: Some(url.clone()),
                method: default_http_method(),
                body: String::new(),
                mappers: Vec::new(),
                inconclusive: None,
            },
            ActionConfig::Detailed(detailed) => Self {
                url: detailed.url.clone(),
                method: detailed.http_method.clone(),
                body: detailed.body.clone(),
                mappers: Mapper::chain_from_configs(&detailed.mappers),
                inconclusive: detailed
                    .inconclusive
                    .as_ref()
                    .map(|fallback| Box::new(Self::from_config(fallback))),
            },
        }
    }

    /// Whether this action performs no network call.
    pub fn is_constant(&self) -> bool {
        self.url.is_none()
    }

    /// Apply the mapper chain to a value.
    pub fn apply_mappers(&self, input: &str) -> String {
        mapper::apply_chain(&self.mappers, input)
    }
}
