//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Resolve an inbound method + path to a backend path
//! - Return the resolved route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical route counts)
//! - A route whose method list excludes the request is skipped, not fatal,
//!   so lower-priority catch-alls can still serve it

use axum::http::Method;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::routing::matcher::{PathPattern, PathTemplate, PatternError};

/// Errors raised while compiling the route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route '{route}': {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route '{route}': destination uses '{placeholder}' which the source does not capture")]
    UnboundPlaceholder { route: String, placeholder: String },

    #[error("route '{route}': invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("route '{0}' is declared more than once")]
    Duplicate(String),
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pattern: PathPattern,
    template: PathTemplate,
    methods: Vec<Method>,
    pub priority: u32,
}

impl Route {
    pub fn compile(config: &RouteConfig) -> Result<Self, RouteError> {
        let pattern = PathPattern::parse(&config.source).map_err(|source| RouteError::Pattern {
            route: config.name.clone(),
            source,
        })?;
        let template =
            PathTemplate::parse(&config.destination).map_err(|source| RouteError::Pattern {
                route: config.name.clone(),
                source,
            })?;

        if let Some(unbound) = template
            .placeholders()
            .find(|p| !pattern.parameters().any(|name| name == *p))
        {
            return Err(RouteError::UnboundPlaceholder {
                route: config.name.clone(),
                placeholder: unbound.to_string(),
            });
        }

        let methods = config
            .methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
                    RouteError::InvalidMethod {
                        route: config.name.clone(),
                        method: m.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            pattern,
            template,
            methods,
            priority: config.priority,
        })
    }

    fn accepts(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    pub fn source(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn destination(&self) -> &str {
        self.template.as_str()
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    pub name: &'a str,
    pub backend_path: String,
}

/// The compiled, priority-ordered route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile route configs. Ties in priority keep declaration order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut routes: Vec<Route> = Vec::with_capacity(configs.len());
        for config in configs {
            if routes.iter().any(|r| r.name == config.name) {
                return Err(RouteError::Duplicate(config.name.clone()));
            }
            routes.push(Route::compile(config)?);
        }
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(Self { routes })
    }

    /// Map an inbound method + path to a backend path.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute<'_>> {
        self.routes
            .iter()
            .filter(|route| route.accepts(method))
            .find_map(|route| {
                route.pattern.matches(path).map(|captures| ResolvedRoute {
                    name: &route.name,
                    backend_path: route.template.render(&captures),
                })
            })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
