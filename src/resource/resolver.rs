use serde_json::Value;
use std::sync::Arc;

use crate::http::request::{media_type, Request};
use crate::resource::error::{ArgumentError, MapperError};
use crate::resource::mapper::Mapper;

/// Where a handler argument comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    Path,
    Query,
    Header,
    Body,
    Context,
}

/// Scalar types a path, query or header value can be read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    I64,
    U64,
    Bool,
}

impl ParamType {
    /// Name used in action signatures.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamType::Str => "String",
            ParamType::I64 => "i64",
            ParamType::U64 => "u64",
            ParamType::Bool => "bool",
        }
    }

    pub fn parse(&self, raw: &str) -> Result<Arg, ArgumentError> {
        let invalid = || ArgumentError::InvalidValue {
            value: raw.to_string(),
            expected: self.type_name(),
        };
        Ok(match self {
            ParamType::Str => Arg::Text(raw.to_string()),
            ParamType::I64 => Arg::Int(raw.parse().map_err(|_| invalid())?),
            ParamType::U64 => Arg::UInt(raw.parse().map_err(|_| invalid())?),
            ParamType::Bool => Arg::Bool(raw.parse().map_err(|_| invalid())?),
        })
    }
}

/// Rule extracting one handler argument from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterResolver {
    /// The next `{name}` placeholder of the route path, in order.
    Path { param_type: ParamType },
    Query {
        name: String,
        param_type: ParamType,
        default: Option<String>,
    },
    /// A required header, matched case-insensitively.
    Header { name: String },
    /// The body, decoded by the mapper registered for `content_kind`.
    Body {
        content_kind: String,
        type_name: String,
    },
    /// The whole request.
    Context,
}

impl ParameterResolver {
    pub fn path(param_type: ParamType) -> Self {
        Self::Path { param_type }
    }

    pub fn query(name: impl Into<String>, param_type: ParamType) -> Self {
        Self::Query {
            name: name.into(),
            param_type,
            default: None,
        }
    }

    /// Query parameter falling back to `default` when absent.
    pub fn query_or(
        name: impl Into<String>,
        param_type: ParamType,
        default: impl Into<String>,
    ) -> Self {
        Self::Query {
            name: name.into(),
            param_type,
            default: Some(default.into()),
        }
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::Header { name: name.into() }
    }

    pub fn body(content_kind: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::Body {
            content_kind: content_kind.into(),
            type_name: type_name.into(),
        }
    }

    pub fn json_body(type_name: impl Into<String>) -> Self {
        Self::body("application/json", type_name)
    }

    pub fn kind(&self) -> ResolverKind {
        match self {
            Self::Path { .. } => ResolverKind::Path,
            Self::Query { .. } => ResolverKind::Query,
            Self::Header { .. } => ResolverKind::Header,
            Self::Body { .. } => ResolverKind::Body,
            Self::Context => ResolverKind::Context,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Path { param_type } | Self::Query { param_type, .. } => param_type.type_name(),
            Self::Header { .. } => "String",
            Self::Body { type_name, .. } => type_name,
            Self::Context => "Request",
        }
    }
}

/// A value extracted for a handler.
#[derive(Debug, Clone)]
pub enum Arg {
    Text(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Json(Value),
    Request(Arc<Request>),
}

/// Handler arguments, in resolver order.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    pub fn new(args: Vec<Arg>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.0.get(index)? {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        match self.0.get(index)? {
            Arg::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn uint(&self, index: usize) -> Option<u64> {
        match self.0.get(index)? {
            Arg::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        match self.0.get(index)? {
            Arg::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn json(&self, index: usize) -> Option<&Value> {
        match self.0.get(index)? {
            Arg::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn request(&self, index: usize) -> Option<&Arc<Request>> {
        match self.0.get(index)? {
            Arg::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_vec(self) -> Vec<Arg> {
        self.0
    }
}

/// Runs every resolver against `request`.
///
/// `path_values` are the placeholder values in path order; `mappers` holds
/// one entry per resolver, `Some` exactly for Body resolvers.
pub(crate) fn extract_args(
    resolvers: &[ParameterResolver],
    mappers: &[Option<Arc<dyn Mapper>>],
    request: &Arc<Request>,
    path_values: &[String],
) -> Result<Args, ArgumentError> {
    let mut args = Vec::with_capacity(resolvers.len());
    let mut next_path = 0;

    for (resolver, mapper) in resolvers.iter().zip(mappers) {
        let arg = match resolver {
            ParameterResolver::Path { param_type } => {
                let raw = path_values
                    .get(next_path)
                    .ok_or(ArgumentError::MissingPath(next_path))?;
                next_path += 1;
                param_type.parse(raw)?
            }
            ParameterResolver::Query {
                name,
                param_type,
                default,
            } => {
                let raw = request
                    .query_param(name)
                    .or(default.as_deref())
                    .ok_or_else(|| ArgumentError::MissingQuery(name.clone()))?;
                param_type.parse(raw)?
            }
            ParameterResolver::Header { name } => {
                let value = request
                    .header(name)
                    .ok_or_else(|| ArgumentError::MissingHeader(name.clone()))?;
                Arg::Text(value.to_string())
            }
            ParameterResolver::Body { content_kind, .. } => {
                // An absent Content-Type is read with the route's mapper.
                let expected = media_type(content_kind);
                if let Some(found) = request.content_type().filter(|found| *found != expected) {
                    return Err(ArgumentError::UnsupportedContentType { found, expected });
                }
                let value = match mapper {
                    Some(mapper) => mapper.from_bytes(&request.body),
                    None => Err(MapperError::Decode("no mapper resolved".to_string())),
                };
                Arg::Json(value.map_err(|source| ArgumentError::Body {
                    content_kind: content_kind.clone(),
                    source,
                })?)
            }
            ParameterResolver::Context => Arg::Request(Arc::clone(request)),
        };
        args.push(arg);
    }

    Ok(Args(args))
}
