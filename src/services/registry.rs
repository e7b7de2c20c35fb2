//! # Service registry: two-phase startup.
//!
//! ```text
//! register(s1) ──► Broker::register_service(s1) ──► s1.initialize() ──► live
//! register(s2) ──► Broker::register_service(s2) ──► s2.initialize() ──► live
//!   ...
//! start() ──► plugins.seal() ──► publish(ApplicationStarted)
//! ```
//!
//! ## Rules
//! - Names are unique; a duplicate fails with `RuntimeError::DuplicateService`
//!   before the second service's `initialize` runs.
//! - Registration is sequential: a later service may publish events observed
//!   by an earlier one's handlers, never the reverse during startup.
//! - Services may still be registered after `start()`, but they are not
//!   guaranteed to see anything published before their registration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::RuntimeError;
use crate::events::{Broker, Event, EventKind};
use crate::plugins::Plugins;
use crate::services::Service;

/// Registry of named services.
pub struct ServiceRegistry {
    broker: Arc<Broker>,
    plugins: Arc<Plugins>,
    names: Mutex<Vec<String>>,
    started: AtomicBool,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new(broker: Arc<Broker>, plugins: Arc<Plugins>) -> Self {
        Self {
            broker,
            plugins,
            names: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Registers `service` and runs its initialization phase.
    ///
    /// A failed initialization releases the name again.
    pub async fn register(&self, service: Arc<dyn Service>) -> Result<(), RuntimeError> {
        let name = service.name().to_string();
        {
            let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
            if names.contains(&name) {
                return Err(RuntimeError::DuplicateService { name });
            }
            names.push(name.clone());
        }

        let res = self.broker.register_service(service).await;
        if res.is_err() {
            self.names
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|n| *n != name);
        }
        res
    }

    /// Ends the startup phase: seals plugin tables, publishes `ApplicationStarted`.
    ///
    /// Calling it again is a no-op.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("application already started");
            return;
        }
        self.plugins.seal();
        info!(services = ?self.services(), "application started");
        self.broker.publish(Event::new(EventKind::ApplicationStarted));
    }

    /// True once [`start`](Self::start) ran.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Registered service names, in registration order.
    pub fn services(&self) -> Vec<String> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
