//! Characteristic bindings: one get/set action pair wired to one
//! externally-owned attribute.
//!
//! A binding operates in one of two modes, fixed at construction:
//!
//! - **Synchronous** (`refresh_interval == 0`): a read performs the
//!   resolution inline and returns the result.
//! - **Polling** (`refresh_interval > 0`): an independent interval task
//!   resolves the get action each tick and pushes value-changed events;
//!   reads return the cached value, awaiting the first tick on cold start
//!   instead of issuing a synthesized immediate call.
//!
//! Two latches guard the binding. The write-suppression latch is held for
//! the whole of a read-driven resolution so an observed external value is
//! never echoed back through the set path. The in-flight latch keeps the
//! invariant of at most one get-driven HTTP exchange per attribute: ticks
//! arriving during an outstanding exchange are dropped, not queued.
//!
//! Clones of a binding share all state, including the poll handle; the
//! cancel-before-restart discipline therefore holds across clones.

use crate::action::Action;
use crate::catalog::ValueFormat;
use crate::dispatch::Dispatcher;
use hapwire_core::{BridgeEvent, Error, EventBus, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Construction parameters for a binding.
pub struct BindingSpec {
    /// Owning accessory name.
    pub accessory: String,
    /// Owning service name.
    pub service: String,
    /// Characteristic name (e.g. `"On"`).
    pub name: String,
    /// Declared value format, used for diagnostics.
    pub format: ValueFormat,
    /// Read action.
    pub get_action: Option<Action>,
    /// Write action.
    pub set_action: Option<Action>,
    /// Poll interval; zero selects synchronous mode.
    pub refresh_interval: Duration,
    /// Verbose value logging for this accessory.
    pub debug: bool,
}

/// A characteristic bound to its get/set actions.
#[derive(Clone)]
pub struct CharacteristicBinding {
    accessory: String,
    service: String,
    name: String,
    format: ValueFormat,
    get_action: Option<Action>,
    set_action: Option<Action>,
    refresh_interval: Duration,
    debug: bool,
    dispatcher: Arc<Dispatcher>,
    bus: EventBus,
    /// Current attribute value; `None` until first applied.
    value_tx: Arc<watch::Sender<Option<String>>>,
    /// Held while a read-driven resolution is applying observed state.
    write_suppressed: Arc<AtomicBool>,
    /// Held while a get-driven HTTP exchange is outstanding.
    in_flight: Arc<AtomicBool>,
    /// Live poll task; at most one per binding, shared across clones.
    poll_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CharacteristicBinding {
    /// Create a binding. The poller is not armed until [`arm_poller`] is
    /// called.
    ///
    /// [`arm_poller`]: Self::arm_poller
    pub fn new(spec: BindingSpec, dispatcher: Arc<Dispatcher>, bus: EventBus) -> Self {
        let (value_tx, _) = watch::channel(None);
        Self {
            accessory: spec.accessory,
            service: spec.service,
            name: spec.name,
            format: spec.format,
            get_action: spec.get_action,
            set_action: spec.set_action,
            refresh_interval: spec.refresh_interval,
            debug: spec.debug,
            dispatcher,
            bus,
            value_tx: Arc::new(value_tx),
            write_suppressed: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicBool::new(false)),
            poll_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Characteristic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this binding polls.
    pub fn is_polling(&self) -> bool {
        !self.refresh_interval.is_zero()
    }

    /// Current cached value, if any has been applied yet.
    pub fn current_value(&self) -> Option<String> {
        self.value_tx.borrow().as_ref().cloned()
    }

    /// Read the characteristic.
    ///
    /// Synchronous mode resolves the get action inline under both latches
    /// and applies the result. Polling mode returns the cached value; on
    /// cold start it awaits the poll loop's next tick, so getter latency
    /// is up to one full interval.
    ///
    /// `Ok(None)` means "no data": the caller keeps its previous value.
    pub async fn read(&self) -> Result<Option<String>> {
        if !self.is_polling() {
            return self.read_now().await;
        }

        let mut rx = self.value_tx.subscribe();
        let current: Option<String> = rx.borrow_and_update().as_ref().cloned();
        if current.is_some() {
            return Ok(current);
        }
        rx.changed()
            .await
            .map_err(|_| Error::internal("binding dropped while awaiting first poll"))?;
        let value: Option<String> = rx.borrow().as_ref().cloned();
        Ok(value)
    }

    /// Inline read resolution for synchronous mode.
    async fn read_now(&self) -> Result<Option<String>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            // Another exchange is outstanding for this attribute; hand the
            // caller the cached value instead of starting a second one.
            return Ok(self.current_value());
        }
        self.write_suppressed.store(true, Ordering::SeqCst);

        let result = self.dispatcher.resolve_read(self.get_action.as_ref()).await;
        let outcome = match result {
            Ok(Some(state)) => {
                self.apply_observed(&state, false);
                Ok(Some(state))
            }
            // No get capability: keep the previous value, not an error.
            Ok(None) => Ok(self.current_value()),
            Err(e) => Err(e),
        };

        self.write_suppressed.store(false, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    /// Write the characteristic.
    ///
    /// A write arriving while the suppression latch is held is an observed
    /// state echo, not a user command: it succeeds without any outbound
    /// HTTP call. On success the original (unmapped) value becomes the
    /// attribute state.
    pub async fn write(&self, value: &str) -> Result<()> {
        if self.write_suppressed.load(Ordering::SeqCst) {
            debug!(
                "Suppressed write of '{}' to {}/{}",
                value, self.service, self.name
            );
            return Ok(());
        }

        self.dispatcher
            .resolve_write(self.set_action.as_ref(), value)
            .await?;
        self.value_tx.send_replace(Some(value.to_string()));
        Ok(())
    }

    /// Arm (or re-arm) the poller.
    ///
    /// Any previously running poll task for this binding is cancelled
    /// before the new one starts; there is never more than one. A no-op
    /// in synchronous mode.
    pub async fn arm_poller(&self) {
        if !self.is_polling() {
            return;
        }

        let mut handle = self.poll_handle.lock().await;
        if let Some(old) = handle.take() {
            old.abort();
        }

        let binding = self.clone();
        *handle = Some(tokio::spawn(async move {
            binding.poll_loop().await;
        }));
        drop(handle);

        self.bus.publish(BridgeEvent::PollerArmed {
            accessory: self.accessory.clone(),
            characteristic: self.name.clone(),
            interval_secs: self.refresh_interval.as_secs(),
            timestamp: hapwire_core::now_ts(),
        });
        info!(
            "Polling {}/{} every {}s",
            self.service,
            self.name,
            self.refresh_interval.as_secs()
        );
    }

    /// Cancel the poller, if one is running.
    pub async fn stop_poller(&self) {
        let mut handle = self.poll_handle.lock().await;
        if let Some(old) = handle.take() {
            old.abort();
        }
    }

    async fn poll_loop(&self) {
        let mut interval = tokio::time::interval(self.refresh_interval);
        // Ticks missed while an exchange is outstanding are dropped,
        // never queued.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The immediate first tick is consumed unused: the first fetch
        // happens one full interval after arming.
        interval.tick().await;

        loop {
            interval.tick().await;
            self.poll_once().await;
        }
    }

    /// One poll tick: resolve the get action and apply the result.
    async fn poll_once(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(
                "Skipping poll tick for {}/{}: exchange still outstanding",
                self.service, self.name
            );
            return;
        }
        self.write_suppressed.store(true, Ordering::SeqCst);

        match self.dispatcher.resolve_read(self.get_action.as_ref()).await {
            Ok(Some(state)) => self.apply_observed(&state, true),
            Ok(None) => {}
            Err(e) => {
                // The displayed value stays stale; the loop keeps running.
                warn!("Poll failed for {}/{}: {}", self.service, self.name, e);
            }
        }

        self.write_suppressed.store(false, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Apply an observed value to the attribute and, for poll-driven
    /// updates, emit a value-changed event.
    fn apply_observed(&self, value: &str, emit: bool) {
        if !self.format.accepts(value) {
            warn!(
                "Value '{}' for {}/{} does not match declared format {:?}",
                value, self.service, self.name, self.format
            );
        }
        if self.debug {
            info!("{}/{} = '{}'", self.service, self.name, value);
        } else {
            debug!("{}/{} = '{}'", self.service, self.name, value);
        }

        self.value_tx.send_replace(Some(value.to_string()));

        if emit {
            self.bus.publish(BridgeEvent::CharacteristicChanged {
                accessory: self.accessory.clone(),
                service: self.service.clone(),
                characteristic: self.name.clone(),
                value: value.to_string(),
                timestamp: hapwire_core::now_ts(),
            });
        }
    }
}
