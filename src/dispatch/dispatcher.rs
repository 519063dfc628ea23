//! Running matched routes.
//!
//! # Responsibilities
//! - Resolve the route's middleware and run it as a pipeline
//! - Resolve the controller and its arguments, then invoke it
//! - Report which controller handled the request
//!
//! # Design Decisions
//! - Parameter plans are cached per (route, controller method)
//! - The controller is resolved inside the pipeline, so a short-circuiting
//!   middleware means no controller is built at all
//! - No retries; every failure goes straight back to the caller

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::dispatch::controller::{Controller, RouteContext};
use crate::dispatch::error::DispatchError;
use crate::dispatch::middleware::{MiddlewareParameters, Pipeline};
use crate::dispatch::plan::ParameterPlan;
use crate::dispatch::resolver::DependencyResolver;
use crate::http::{Request, Response};
use crate::routing::{CompiledRoute, ControllerRef, MiddlewareDescriptor, RouteId};

/// The controller that produced a response.
#[derive(Clone)]
pub enum MatchedController {
    Named {
        class: String,
        method: String,
        instance: Arc<dyn Controller>,
    },
    Closure,
}

impl MatchedController {
    pub fn class(&self) -> Option<&str> {
        match self {
            MatchedController::Named { class, .. } => Some(class),
            MatchedController::Closure => None,
        }
    }
}

impl fmt::Debug for MatchedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedController::Named { class, method, .. } => f
                .debug_struct("Named")
                .field("class", class)
                .field("method", method)
                .finish(),
            MatchedController::Closure => f.write_str("Closure"),
        }
    }
}

/// Outcome of a dispatch.
#[derive(Debug)]
pub struct Dispatched {
    pub response: Response,
    /// `None` when middleware answered before the controller ran.
    pub controller: Option<MatchedController>,
}

pub struct RouteDispatcher {
    resolver: Arc<dyn DependencyResolver>,
    plans: DashMap<(RouteId, String), Arc<ParameterPlan>>,
}

impl RouteDispatcher {
    pub fn new(resolver: Arc<dyn DependencyResolver>) -> Self {
        Self {
            resolver,
            plans: DashMap::new(),
        }
    }

    pub fn resolver(&self) -> &Arc<dyn DependencyResolver> {
        &self.resolver
    }

    /// Number of cached parameter plans.
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    pub fn dispatch(&self, route: &CompiledRoute, request: Request) -> Result<Dispatched, DispatchError> {
        let pipeline = self.pipeline(route.route().middleware())?;
        let matched: RefCell<Option<MatchedController>> = RefCell::new(None);

        let response = pipeline.send(request, |request| {
            let (response, controller) = self.call_controller(route, &request)?;
            *matched.borrow_mut() = Some(controller);
            Ok(response)
        })?;

        Ok(Dispatched {
            response,
            controller: matched.into_inner(),
        })
    }

    fn pipeline(&self, descriptors: &[MiddlewareDescriptor]) -> Result<Pipeline, DispatchError> {
        let mut pipeline = Pipeline::new();
        for descriptor in descriptors {
            let parameters = match descriptor {
                MiddlewareDescriptor::Named(_) => MiddlewareParameters::new(),
                MiddlewareDescriptor::Parameterized { parameters, .. } => {
                    MiddlewareParameters::from(parameters.clone())
                }
            };
            let middleware = self
                .resolver
                .resolve_middleware(descriptor.name(), &parameters)?;
            pipeline.pipe(descriptor.name(), middleware);
        }
        Ok(pipeline)
    }

    fn call_controller(
        &self,
        route: &CompiledRoute,
        request: &Request,
    ) -> Result<(Response, MatchedController), DispatchError> {
        match route.route().controller() {
            ControllerRef::Closure(handler) => {
                let context = RouteContext::new(request, route, self.resolver.as_ref());
                Ok((handler(&context)?, MatchedController::Closure))
            }
            ControllerRef::Named { class, method } => {
                let instance = self.resolver.resolve_controller(class)?;
                let plan = self.plan(route, class, method, instance.as_ref())?;
                let arguments = plan.arguments(route, self.resolver.as_ref())?;

                tracing::debug!(controller = %class, method = %method, arguments = arguments.len(), "Invoking controller");
                let response = instance.call(method, arguments, request)?;
                Ok((
                    response,
                    MatchedController::Named {
                        class: class.clone(),
                        method: method.clone(),
                        instance,
                    },
                ))
            }
        }
    }

    fn plan(
        &self,
        route: &CompiledRoute,
        class: &str,
        method: &str,
        controller: &dyn Controller,
    ) -> Result<Arc<ParameterPlan>, DispatchError> {
        let key = (route.route().id(), method.to_string());
        if let Some(plan) = self.plans.get(&key) {
            return Ok(plan.value().clone());
        }

        let parameters = controller
            .parameters(method)
            .ok_or_else(|| DispatchError::UnknownControllerMethod {
                class: class.to_string(),
                method: method.to_string(),
            })?;
        let plan = Arc::new(ParameterPlan::build(
            &format!("{}@{}", class, method),
            &parameters,
            route.route(),
        )?);
        self.plans.insert(key, plan.clone());
        Ok(plan)
    }
}

impl fmt::Debug for RouteDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDispatcher")
            .field("cached_plans", &self.plans.len())
            .finish()
    }
}
