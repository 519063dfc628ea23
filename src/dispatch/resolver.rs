//! Dependency resolution.
//!
//! # Responsibilities
//! - Produce services for object-typed controller parameters
//! - Produce controller instances by class name
//! - Produce middleware instances by name and parameters
//!
//! # Design Decisions
//! - The dispatcher only depends on the [`DependencyResolver`] trait
//! - [`Container`] is a concurrent map of factories; a factory is cloned out
//!   of the map before it runs so factories may resolve other bindings

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;

use crate::dispatch::controller::Controller;
use crate::dispatch::error::ResolutionError;
use crate::dispatch::middleware::{Middleware, MiddlewareParameters};

/// A resolved service.
pub type Instance = Arc<dyn Any + Send + Sync>;

type ServiceFactory = Arc<dyn Fn(&Container) -> Result<Instance, ResolutionError> + Send + Sync>;
type ControllerFactory =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Controller>, ResolutionError> + Send + Sync>;
type MiddlewareFactory = Arc<
    dyn Fn(&Container, &MiddlewareParameters) -> Result<Arc<dyn Middleware>, ResolutionError>
        + Send
        + Sync,
>;

pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, type_name: &str) -> Result<Instance, ResolutionError>;

    fn resolve_controller(&self, class: &str) -> Result<Arc<dyn Controller>, ResolutionError>;

    fn resolve_middleware(
        &self,
        name: &str,
        parameters: &MiddlewareParameters,
    ) -> Result<Arc<dyn Middleware>, ResolutionError>;
}

/// Default resolver backed by named bindings.
#[derive(Default)]
pub struct Container {
    services: DashMap<String, ServiceFactory>,
    controllers: DashMap<String, ControllerFactory>,
    middleware: DashMap<String, MiddlewareFactory>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a shared instance.
    pub fn bind_instance<T: Any + Send + Sync>(&self, type_name: impl Into<String>, instance: T) {
        let instance: Instance = Arc::new(instance);
        self.services
            .insert(type_name.into(), Arc::new(move |_| Ok(instance.clone())));
    }

    /// Bind a factory run on every resolution.
    pub fn bind_factory<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> Result<Instance, ResolutionError> + Send + Sync + 'static,
    {
        self.services.insert(type_name.into(), Arc::new(factory));
    }

    pub fn bind_controller<F>(&self, class: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> Result<Arc<dyn Controller>, ResolutionError> + Send + Sync + 'static,
    {
        self.controllers.insert(class.into(), Arc::new(factory));
    }

    /// Bind one controller instance shared by every dispatch.
    pub fn bind_controller_instance(&self, class: impl Into<String>, controller: Arc<dyn Controller>) {
        self.bind_controller(class, move |_| Ok(controller.clone()));
    }

    pub fn bind_middleware<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Container, &MiddlewareParameters) -> Result<Arc<dyn Middleware>, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        self.middleware.insert(name.into(), Arc::new(factory));
    }

    /// Bind one middleware instance, ignoring parameters.
    pub fn bind_middleware_instance(&self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.bind_middleware(name, move |_, _| Ok(middleware.clone()));
    }

    pub fn has_controller(&self, class: &str) -> bool {
        self.controllers.contains_key(class)
    }

    pub fn has_middleware(&self, name: &str) -> bool {
        self.middleware.contains_key(name)
    }
}

impl DependencyResolver for Container {
    fn resolve(&self, type_name: &str) -> Result<Instance, ResolutionError> {
        let factory = self
            .services
            .get(type_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ResolutionError::Unbound(type_name.to_string()))?;
        factory(self)
    }

    fn resolve_controller(&self, class: &str) -> Result<Arc<dyn Controller>, ResolutionError> {
        let factory = self
            .controllers
            .get(class)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ResolutionError::Unbound(class.to_string()))?;
        factory(self)
    }

    fn resolve_middleware(
        &self,
        name: &str,
        parameters: &MiddlewareParameters,
    ) -> Result<Arc<dyn Middleware>, ResolutionError> {
        let factory = self
            .middleware
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ResolutionError::Unbound(name.to_string()))?;
        factory(self, parameters)
    }
}
