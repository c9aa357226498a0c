use std::sync::Arc;
use tracing::{debug, info};

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::resource::error::RouteError;
use crate::resource::mapper::MapperRegistry;
use crate::resource::resolver::ParameterResolver;
use crate::resource::route::{with_success, Completes, Handler, Route};

/// Result of looking a request up in the route table.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// First route matching both method and path, with its placeholder values.
    Found {
        route: &'a Arc<Route>,
        path_values: Vec<String>,
    },
    NotFound,
    /// The path matched, but only under other methods.
    MethodNotAllowed { allowed: Vec<Method> },
}

/// Collects routes during startup.
#[derive(Debug)]
pub struct RouteTableBuilder {
    routes: Vec<Arc<Route>>,
    mappers: MapperRegistry,
}

impl Default for RouteTableBuilder {
    fn default() -> Self {
        Self::new(MapperRegistry::with_defaults())
    }
}

impl RouteTableBuilder {
    pub fn new(mappers: MapperRegistry) -> Self {
        Self {
            routes: Vec::new(),
            mappers,
        }
    }

    /// Compiles and appends a route. Registration order is match order.
    pub fn register_route(
        &mut self,
        method: Method,
        path: &str,
        resolvers: Vec<ParameterResolver>,
        handler: Option<Handler>,
    ) -> Result<Arc<Route>, RouteError> {
        let route = Arc::new(Route::new(method, path, resolvers, handler, &self.mappers)?);
        info!(
            method = %route.method(),
            path = route.path(),
            signature = route.action_signature(),
            "Registered route"
        );
        self.routes.push(Arc::clone(&route));
        Ok(route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn build(self) -> RouteTable {
        info!(routes_count = self.routes.len(), "Routing table loaded");
        RouteTable {
            routes: self.routes,
        }
    }
}

/// The immutable route table; share it behind an `Arc`.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Finds the route for `method` and `path` (query string excluded).
    pub fn resolve(&self, method: Method, path: &str) -> Resolution<'_> {
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(path_values) = route.pattern().matches(path) else {
                continue;
            };
            if route.method() == method {
                return Resolution::Found { route, path_values };
            }
            if !allowed.contains(&route.method()) {
                allowed.push(route.method());
            }
        }

        if allowed.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::MethodNotAllowed { allowed }
        }
    }

    /// Routes `request` to its handler.
    ///
    /// No match yields `404`, a path matched under other methods yields `405`
    /// with an `Allow` header. The only error is a matched route without a
    /// handler.
    pub fn dispatch(&self, request: Request) -> Result<Completes, RouteError> {
        match self.resolve(request.method, &request.path) {
            Resolution::Found { route, path_values } => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    route = route.path(),
                    "Dispatching request"
                );
                route.execute(Arc::new(request), &path_values)
            }
            Resolution::NotFound => {
                debug!(method = %request.method, path = %request.path, "No route matched");
                Ok(with_success(Response::not_found()))
            }
            Resolution::MethodNotAllowed { allowed } => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    allowed = ?allowed,
                    "Method not allowed"
                );
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(with_success(
                    ResponseBuilder::new(StatusCode::METHOD_NOT_ALLOWED)
                        .header("Allow", allow)
                        .build(),
                ))
            }
        }
    }
}
