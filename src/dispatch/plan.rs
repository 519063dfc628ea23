//! Parameter resolution strategies.
//!
//! A plan is computed once per route and controller method and then reused
//! for every request. Priority per parameter:
//! 1. object-typed -> resolved by type
//! 2. a path or host variable of the same name -> the bound value
//! 3. a route default of the same name -> that default
//! 4. the parameter's own declared default
//! 5. otherwise the plan cannot be built

use crate::dispatch::controller::{Argument, Arguments, Parameter, ParameterKind};
use crate::dispatch::error::DispatchError;
use crate::dispatch::resolver::DependencyResolver;
use crate::routing::{CompiledRoute, ParsedRoute};

/// Where one argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSource {
    Injected { name: String, type_name: String },
    PathVariable(String),
    RouteDefault(String),
    Declared { name: String, value: String },
}

impl ParameterSource {
    pub fn name(&self) -> &str {
        match self {
            ParameterSource::Injected { name, .. } => name,
            ParameterSource::PathVariable(name) => name,
            ParameterSource::RouteDefault(name) => name,
            ParameterSource::Declared { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPlan {
    sources: Vec<ParameterSource>,
}

impl ParameterPlan {
    /// Decide a source for every parameter. `controller` only labels errors.
    pub fn build(
        controller: &str,
        parameters: &[Parameter],
        route: &ParsedRoute,
    ) -> Result<Self, DispatchError> {
        let mut sources = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            let source = match &parameter.kind {
                ParameterKind::Object(type_name) => ParameterSource::Injected {
                    name: parameter.name.clone(),
                    type_name: type_name.clone(),
                },
                ParameterKind::Scalar if is_variable(route, &parameter.name) => {
                    ParameterSource::PathVariable(parameter.name.clone())
                }
                ParameterKind::Scalar if route.default_value(&parameter.name).is_some() => {
                    ParameterSource::RouteDefault(parameter.name.clone())
                }
                ParameterKind::Scalar => match &parameter.default {
                    Some(value) => ParameterSource::Declared {
                        name: parameter.name.clone(),
                        value: value.clone(),
                    },
                    None => {
                        return Err(DispatchError::MissingParameter {
                            controller: controller.to_string(),
                            parameter: parameter.name.clone(),
                        })
                    }
                },
            };
            sources.push(source);
        }

        Ok(Self { sources })
    }

    pub fn sources(&self) -> &[ParameterSource] {
        &self.sources
    }

    /// Produce arguments for one matched request.
    pub fn arguments(
        &self,
        route: &CompiledRoute,
        resolver: &dyn DependencyResolver,
    ) -> Result<Arguments, DispatchError> {
        let mut arguments = Arguments::new();
        for source in &self.sources {
            let argument = match source {
                ParameterSource::Injected { type_name, .. } => {
                    Argument::Service(resolver.resolve(type_name)?)
                }
                ParameterSource::PathVariable(name) => {
                    let value = route
                        .binding(name)
                        .or_else(|| route.route().default_value(name))
                        .unwrap_or_default();
                    Argument::Value(value.to_string())
                }
                ParameterSource::RouteDefault(name) => Argument::Value(
                    route.route().default_value(name).unwrap_or_default().to_string(),
                ),
                ParameterSource::Declared { value, .. } => Argument::Value(value.clone()),
            };
            arguments.push(source.name(), argument);
        }
        Ok(arguments)
    }
}

fn is_variable(route: &ParsedRoute, name: &str) -> bool {
    route.path_regex().capture_names().flatten().any(|n| n == name)
        || (route.has_host() && route.host_regex().capture_names().flatten().any(|n| n == name))
}
