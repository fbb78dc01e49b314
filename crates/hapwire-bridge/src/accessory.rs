//! Accessory assembly: configuration plus catalog into live bindings.
//!
//! For each configured service the capability type is resolved against
//! the catalog; unknown types yield no service. Mandatory characteristics
//! are always bound, optional ones only when listed in
//! `optionCharacteristic`. Configured characteristics the catalog does
//! not know are skipped.

use crate::action::Action;
use crate::binding::{BindingSpec, CharacteristicBinding};
use crate::catalog::{Catalog, CharacteristicDescriptor};
use crate::config::{AccessoryConfig, BridgeConfig, ServiceConfig};
use crate::dispatch::Dispatcher;
use crate::http::HttpTransport;
use hapwire_core::{BridgeEvent, EventBus, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// One assembled service with its live characteristic bindings.
pub struct Service {
    /// Service display name.
    pub name: String,
    /// Catalog capability type.
    pub service_type: String,
    /// Bound characteristics.
    pub characteristics: Vec<CharacteristicBinding>,
}

impl Service {
    /// Find a characteristic binding by name.
    pub fn characteristic(&self, name: &str) -> Option<&CharacteristicBinding> {
        self.characteristics.iter().find(|c| c.name() == name)
    }
}

/// One assembled accessory.
pub struct Accessory {
    /// Accessory display name.
    pub name: String,
    /// Assembled services.
    pub services: Vec<Service>,
    identify_action: Option<Action>,
    dispatcher: Arc<Dispatcher>,
    bus: EventBus,
}

impl Accessory {
    /// Assemble an accessory from configuration and the catalog.
    pub fn build(
        config: &AccessoryConfig,
        catalog: &dyn Catalog,
        transport: Arc<dyn HttpTransport>,
        bus: EventBus,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(transport, config.auth()));
        let mut services = Vec::new();

        for service_config in &config.services {
            match build_service(config, service_config, catalog, &dispatcher, &bus) {
                Some(service) => services.push(service),
                None => {
                    warn!(
                        "Accessory '{}': unknown service type '{}', skipping '{}'",
                        config.name, service_config.service_type, service_config.name
                    );
                }
            }
        }

        Self {
            name: config.name.clone(),
            services,
            identify_action: config.identify.as_ref().map(Action::from_config),
            dispatcher,
            bus,
        }
    }

    /// Arm pollers for every polling characteristic.
    pub async fn start(&self) {
        for service in &self.services {
            for binding in &service.characteristics {
                binding.arm_poller().await;
            }
        }
        info!(
            "Accessory '{}' started with {} services",
            self.name,
            self.services.len()
        );
    }

    /// Cancel every poller.
    pub async fn stop(&self) {
        for service in &self.services {
            for binding in &service.characteristics {
                binding.stop_poller().await;
            }
        }
        info!("Accessory '{}' stopped", self.name);
    }

    /// Resolve the identify action.
    ///
    /// The result is logged and emitted as an event only; it never feeds
    /// an attribute.
    pub async fn identify(&self) -> Result<Option<String>> {
        let outcome = self
            .dispatcher
            .resolve_read(self.identify_action.as_ref())
            .await;

        let (success, result) = match &outcome {
            Ok(result) => (true, result.clone()),
            Err(e) => {
                warn!("Identify failed for '{}': {}", self.name, e);
                (false, None)
            }
        };
        if success {
            info!(
                "Identify '{}': {}",
                self.name,
                result.as_deref().unwrap_or("<no identify action>")
            );
        }

        self.bus.publish(BridgeEvent::Identify {
            accessory: self.name.clone(),
            success,
            result,
            timestamp: hapwire_core::now_ts(),
        });
        outcome
    }

    /// Find a service by name.
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Assemble every accessory in a bridge configuration.
pub fn build_accessories(
    config: &BridgeConfig,
    catalog: &dyn Catalog,
    transport: Arc<dyn HttpTransport>,
    bus: &EventBus,
) -> Vec<Accessory> {
    config
        .accessories
        .iter()
        .map(|accessory| Accessory::build(accessory, catalog, Arc::clone(&transport), bus.clone()))
        .collect()
}

fn build_service(
    accessory: &AccessoryConfig,
    config: &ServiceConfig,
    catalog: &dyn Catalog,
    dispatcher: &Arc<Dispatcher>,
    bus: &EventBus,
) -> Option<Service> {
    let capability = catalog.capability(&config.service_type)?;

    let refresh_secs = config
        .force_refresh_delay
        .unwrap_or(accessory.force_refresh_delay);

    let mut characteristics = Vec::new();
    let enabled_optional = capability
        .optional
        .iter()
        .filter(|d| config.option_characteristics.iter().any(|n| n == &d.name));

    for descriptor in capability.mandatory.iter().chain(enabled_optional) {
        characteristics.push(build_binding(
            accessory,
            config,
            descriptor,
            refresh_secs,
            dispatcher,
            bus,
        ));
    }

    for configured in config.characteristics.keys() {
        if capability.descriptor(configured).is_none() {
            warn!(
                "Service '{}': characteristic '{}' is not part of capability '{}', ignoring",
                config.name, configured, config.service_type
            );
        }
    }

    Some(Service {
        name: config.name.clone(),
        service_type: config.service_type.clone(),
        characteristics,
    })
}

fn build_binding(
    accessory: &AccessoryConfig,
    service: &ServiceConfig,
    descriptor: &CharacteristicDescriptor,
    refresh_secs: u64,
    dispatcher: &Arc<Dispatcher>,
    bus: &EventBus,
) -> CharacteristicBinding {
    let actions = service.characteristics.get(&descriptor.name);
    let get_action = actions
        .and_then(|a| a.get.as_ref())
        .map(Action::from_config);
    let set_action = actions
        .and_then(|a| a.set.as_ref())
        .map(Action::from_config);

    // Polling without a get action has nothing to fetch.
    let refresh_interval = if get_action.is_some() {
        Duration::from_secs(refresh_secs)
    } else {
        Duration::ZERO
    };

    CharacteristicBinding::new(
        BindingSpec {
            accessory: accessory.name.clone(),
            service: service.name.clone(),
            name: descriptor.name.clone(),
            format: descriptor.format,
            get_action,
            set_action,
            refresh_interval,
            debug: accessory.debug,
        },
        Arc::clone(dispatcher),
        bus.clone(),
    )
}
