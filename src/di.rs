//! Service container: the dependency injector consumed by the dispatcher.
//!
//! The container is a name-keyed locator with two registries:
//!
//! - **Shared services** — arbitrary values stored under a string name and
//!   fetched back with [`ServiceContainer::get_shared`]. The dispatcher uses
//!   this for the `"response"` service; hosts can park whatever collaborators
//!   their controllers need.
//! - **Handler factories** — controller constructors keyed by the concrete
//!   class name (`PostsController`), invoked by the dispatch loop to build a
//!   handler instance for the current request.
//!
//! The container is shared (`Arc`) and read-only once dispatch begins; the
//! dispatcher holds a reference but never mutates it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::handler::{Controller, ControllerHandler, Handler};

/// Constructor for a handler instance, keyed by concrete class name.
///
/// Factories receive the container itself so controllers can capture the
/// services they depend on at construction time.
pub type HandlerFactory = Box<dyn Fn(&Arc<ServiceContainer>) -> Box<dyn Handler> + Send + Sync>;

/// Lookup failure returned by [`ServiceContainer::get_shared`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No service is registered under the requested name.
    NotFound {
        /// The requested service name
        name: String,
    },
    /// A service exists under the name but is not of the requested type.
    WrongType {
        /// The requested service name
        name: String,
        /// The type the caller asked for
        expected: &'static str,
    },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound { name } => {
                write!(f, "service '{}' was not found in the container", name)
            }
            ServiceError::WrongType { name, expected } => {
                write!(
                    f,
                    "service '{}' is registered but is not of the requested type '{}'",
                    name, expected
                )
            }
        }
    }
}

impl std::error::Error for ServiceError {}

/// Name-keyed service locator and handler-factory registry.
#[derive(Default)]
pub struct ServiceContainer {
    /// Shared service instances, downcast on fetch
    services: HashMap<String, Box<dyn Any + Send + Sync>>,
    /// Controller constructors keyed by concrete class name
    handlers: HashMap<String, HandlerFactory>,
}

impl ServiceContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared service under `name`, replacing any previous entry.
    ///
    /// Store clonable handles (`Arc<dyn Trait>`, `Arc<T>`, small `Clone`
    /// values); [`get_shared`](Self::get_shared) hands back a clone of the
    /// stored value.
    pub fn set_shared<T>(&mut self, name: &str, service: T)
    where
        T: Any + Send + Sync,
    {
        self.services.insert(name.to_string(), Box::new(service));
    }

    /// Fetch a clone of the shared service registered under `name`.
    ///
    /// The requested type must match the registered type exactly — a service
    /// stored as `Arc<dyn ResponseService>` must be fetched as
    /// `Arc<dyn ResponseService>`, not as the concrete implementation.
    pub fn get_shared<T>(&self, name: &str) -> Result<T, ServiceError>
    where
        T: Any + Clone,
    {
        let entry = self.services.get(name).ok_or_else(|| ServiceError::NotFound {
            name: name.to_string(),
        })?;
        entry
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ServiceError::WrongType {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Whether a shared service is registered under `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Register a handler factory under a concrete class name.
    ///
    /// If a factory with the same class name already exists it is replaced;
    /// instances the dispatcher has already constructed from the old factory
    /// are unaffected.
    pub fn set_handler<F>(&mut self, class_name: &str, factory: F)
    where
        F: Fn(&Arc<ServiceContainer>) -> Box<dyn Handler> + Send + Sync + 'static,
    {
        if self.handlers.contains_key(class_name) {
            warn!(class_name = %class_name, "Replaced existing handler factory");
        }
        self.handlers.insert(class_name.to_string(), Box::new(factory));
    }

    /// Register a [`Controller`] type under a concrete class name.
    ///
    /// Convenience over [`set_handler`](Self::set_handler): wraps the
    /// controller in a [`ControllerHandler`] so the dispatch loop can drive
    /// it through the erased [`Handler`] interface.
    pub fn set_controller<C, F>(&mut self, class_name: &str, factory: F)
    where
        C: Controller,
        F: Fn(&Arc<ServiceContainer>) -> C + Send + Sync + 'static,
    {
        self.set_handler(class_name, move |di| {
            Box::new(ControllerHandler::new(factory(di)))
        });
    }

    /// Look up the factory registered for a concrete class name.
    #[must_use]
    pub fn handler_factory(&self, class_name: &str) -> Option<&HandlerFactory> {
        self.handlers.get(class_name)
    }

    /// Whether a handler factory is registered for the class name.
    #[must_use]
    pub fn has_handler(&self, class_name: &str) -> bool {
        self.handlers.contains_key(class_name)
    }

    /// Names of all registered handler classes, for diagnostics.
    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
