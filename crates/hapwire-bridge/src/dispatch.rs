//! Action dispatch: resolve reads and writes into HTTP exchanges.
//!
//! The dispatcher owns the transport handle and the accessory's
//! credentials. Failures stay local to one resolution: transport errors
//! are logged and surfaced as `Error::Network`, never escalated past the
//! caller of the resolution.

use crate::action::Action;
use crate::http::{AuthConfig, HttpResponse, HttpTransport};
use crate::template::{self, RenderContext};
use futures::future::BoxFuture;
use hapwire_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sentinel result selecting the fallback action.
pub const INCONCLUSIVE: &str = "inconclusive";

/// Executes actions against the HTTP collaborator.
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    auth: Option<AuthConfig>,
}

impl Dispatcher {
    /// Create a dispatcher for one accessory.
    pub fn new(transport: Arc<dyn HttpTransport>, auth: Option<AuthConfig>) -> Self {
        Self { transport, auth }
    }

    /// One HTTP exchange with the accessory's auth policy applied.
    ///
    /// Preemptive credentials go out with the first request. In
    /// challenge mode the first request carries none and a single retry
    /// with credentials answers a 401.
    async fn exchange(&self, method: &str, url: &str, body: &str) -> Result<HttpResponse> {
        match &self.auth {
            Some(auth) if !auth.send_immediately => {
                let first = self.transport.request(method, url, body, None).await?;
                if first.status != 401 {
                    return Ok(first);
                }
                debug!("Retrying {} with credentials after 401 challenge", url);
                self.transport.request(method, url, body, Some(auth)).await
            }
            other => self.transport.request(method, url, body, other.as_ref()).await,
        }
    }

    /// Resolve a read.
    ///
    /// - `None` action yields `Ok(None)`: no get capability, the caller
    ///   keeps its previous value. No HTTP call is made.
    /// - A constant action (no URL) yields its mapped literal body.
    /// - Otherwise one HTTP exchange per action in the fallback chain,
    ///   mapper chain applied in declared order. A mapped result equal to
    ///   the `"inconclusive"` sentinel resolves the fallback action
    ///   instead; the sentinel itself is never returned when a fallback
    ///   exists, and the primary is never retried.
    pub async fn resolve_read(&self, action: Option<&Action>) -> Result<Option<String>> {
        match action {
            None => Ok(None),
            Some(action) => self.resolve_read_action(action).await.map(Some),
        }
    }

    fn resolve_read_action<'a>(&'a self, action: &'a Action) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let raw = match &action.url {
                None => action.body.clone(),
                Some(url) => {
                    let response = self
                        .exchange(&action.method, url, &action.body)
                        .await
                        .map_err(|e| {
                            warn!("Read from {} failed: {}", url, e);
                            e
                        })?;
                    if !response.is_success() {
                        warn!("Read from {} returned HTTP {}", url, response.status);
                        return Err(Error::network(format!(
                            "HTTP {} from {}",
                            response.status, url
                        )));
                    }
                    response.body
                }
            };

            let state = action.apply_mappers(&raw);

            if state == INCONCLUSIVE {
                if let Some(fallback) = &action.inconclusive {
                    debug!("Result inconclusive, resolving fallback action");
                    return self.resolve_read_action(fallback).await;
                }
            }

            Ok(state)
        })
    }

    /// Resolve a write.
    ///
    /// A missing action or URL is a no-op success. The value runs through
    /// the mapper chain, URL and body templates are rendered against the
    /// restricted placeholder context, and one HTTP exchange is issued.
    /// Template errors fail the write before any network call.
    pub async fn resolve_write(&self, action: Option<&Action>, value: &str) -> Result<()> {
        let Some(action) = action else {
            return Ok(());
        };
        let Some(url_template) = &action.url else {
            return Ok(());
        };

        let mapped = action.apply_mappers(value);
        let context = RenderContext::for_write(&mapped, value);
        let url = template::render(url_template, &context)?;
        let body = template::render(&action.body, &context)?;

        let response = self
            .exchange(&action.method, &url, &body)
            .await
            .map_err(|e| {
                warn!("Write to {} failed: {}", url, e);
                e
            })?;

        if !response.is_success() {
            warn!("Write to {} returned HTTP {}", url, response.status);
            return Err(Error::network(format!(
                "HTTP {} from {}",
                response.status, url
            )));
        }

        debug!("Write to {} succeeded with value '{}'", url, mapped);
        Ok(())
    }
}
