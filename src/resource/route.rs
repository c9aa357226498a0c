use futures_util::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::resource::error::RouteError;
use crate::resource::mapper::{Mapper, MapperRegistry};
use crate::resource::resolver::{extract_args, Args, ParameterResolver, ResolverKind};

/// Eventual response of a handler. It may resolve on a later turn.
pub type Completes = BoxFuture<'static, Response>;

/// A route's handler function.
pub type Handler = Arc<dyn Fn(Args) -> Completes + Send + Sync>;

/// An already resolved completion.
pub fn with_success(response: Response) -> Completes {
    future::ready(response).boxed()
}

/// Wraps an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled path pattern such as `/res/{resId}`.
///
/// Matching is strict: literal segments compare case-sensitively, a
/// placeholder matches exactly one non-empty segment, and a trailing `/`
/// is significant (`/res/` does not match `/res`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn compile(path: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPathPattern {
            path: path.to_string(),
            reason,
        };

        let rest = path.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        if rest.is_empty() {
            return Ok(Self { segments: Vec::new() });
        }

        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if !segment.contains(['{', '}']) {
                segments.push(Segment::Literal(segment.to_string()));
                continue;
            }
            let inner = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|inner| !inner.contains(['{', '}']))
                .ok_or_else(|| invalid("a placeholder must span a whole segment"))?;
            let name = inner.trim();
            if name.is_empty() {
                return Err(invalid("empty placeholder"));
            }
            segments.push(Segment::Placeholder(name.to_string()));
        }

        Ok(Self { segments })
    }

    /// Placeholder names in path order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    /// Returns the placeholder values when `path` matches.
    pub fn matches(&self, path: &str) -> Option<Vec<String>> {
        let rest = path.strip_prefix('/')?;
        if rest.is_empty() {
            return self.segments.is_empty().then(Vec::new);
        }

        let mut values = Vec::new();
        let mut parts = rest.split('/');
        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Placeholder(_) if part.is_empty() => return None,
                Segment::Placeholder(_) => values.push(part.to_string()),
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Some(values)
    }
}

/// A registered (method, path) pair with its resolvers and handler.
///
/// Immutable once built.
pub struct Route {
    method: Method,
    path: String,
    pattern: PathPattern,
    resolvers: Vec<ParameterResolver>,
    mappers: Vec<Option<Arc<dyn Mapper>>>,
    action_signature: String,
    handler: Option<Handler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("action_signature", &self.action_signature)
            .field("resolvers", &self.resolvers)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Route {
    /// Validates and compiles a route.
    ///
    /// Fails when a Path resolver follows a non-Path one, when the path has
    /// an empty `{}` placeholder or is otherwise malformed, when there are
    /// more Path resolvers than placeholders, or when a Body resolver names
    /// a content kind missing from `mappers`.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        resolvers: Vec<ParameterResolver>,
        handler: Option<Handler>,
        mappers: &MapperRegistry,
    ) -> Result<Self, RouteError> {
        let path = path.into();
        check_order(method, &path, &resolvers)?;

        if path.replace(' ', "").contains("{}") {
            return Err(RouteError::EmptyPathParameter { method, path });
        }

        let pattern = PathPattern::compile(&path)?;

        let path_resolvers = resolvers
            .iter()
            .filter(|r| r.kind() == ResolverKind::Path)
            .count();
        let placeholders = pattern.placeholder_count();
        if path_resolvers > placeholders {
            return Err(RouteError::PathParameterMismatch {
                method,
                path,
                resolvers: path_resolvers,
                placeholders,
            });
        }

        let resolved = resolvers
            .iter()
            .map(|r| match r {
                ParameterResolver::Body { content_kind, .. } => mappers.resolve(content_kind).map(Some),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let action_signature = action_signature(&pattern, &resolvers);

        Ok(Self {
            method,
            path,
            pattern,
            resolvers,
            mappers: resolved,
            action_signature,
            handler,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The path pattern as registered.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn resolvers(&self) -> &[ParameterResolver] {
        &self.resolvers
    }

    /// E.g. `String resId, i64 page`. Diagnostic only.
    pub fn action_signature(&self) -> &str {
        &self.action_signature
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Extracts the handler arguments and invokes the handler.
    ///
    /// Argument errors become a `400 Bad Request` completion; a route without
    /// a handler is a [`RouteError::HandlerMissing`].
    pub fn execute(&self, request: Arc<Request>, path_values: &[String]) -> Result<Completes, RouteError> {
        let handler = self.handler.as_ref().ok_or_else(|| RouteError::HandlerMissing {
            method: self.method,
            path: self.path.clone(),
        })?;

        match extract_args(&self.resolvers, &self.mappers, &request, path_values) {
            Ok(args) => Ok(handler(args)),
            Err(err) => {
                tracing::debug!(
                    method = %self.method,
                    path = %self.path,
                    error = %err,
                    "Rejecting request with unreadable arguments"
                );
                Ok(with_success(
                    ResponseBuilder::new(StatusCode::BAD_REQUEST)
                        .header("Content-Type", "text/plain")
                        .body(err.to_string())
                        .build(),
                ))
            }
        }
    }
}

fn check_order(method: Method, path: &str, resolvers: &[ParameterResolver]) -> Result<(), RouteError> {
    let mut seen_non_path = false;
    for resolver in resolvers {
        if resolver.kind() != ResolverKind::Path {
            seen_non_path = true;
        } else if seen_non_path {
            return Err(RouteError::UnsortedPathParameters {
                method,
                path: path.to_string(),
            });
        }
    }
    Ok(())
}

fn action_signature(pattern: &PathPattern, resolvers: &[ParameterResolver]) -> String {
    resolvers
        .iter()
        .filter(|r| r.kind() == ResolverKind::Path)
        .zip(pattern.placeholders())
        .map(|(resolver, name)| format!("{} {}", resolver.type_name(), name))
        .collect::<Vec<_>>()
        .join(", ")
}
