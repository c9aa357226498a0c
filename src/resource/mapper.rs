//! Content mappers.
//!
//! A mapper turns body bytes into a [`serde_json::Value`] and back. Mappers
//! are looked up by content kind (a media type such as `application/json`)
//! in an explicit [`MapperRegistry`] filled before routes are registered; a
//! Body resolver naming an unregistered kind fails route construction.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::http::request::media_type;
use crate::resource::error::{MapperError, RouteError};

pub trait Mapper: Send + Sync {
    /// The media type this mapper handles.
    fn content_kind(&self) -> &str;

    fn from_bytes(&self, bytes: &[u8]) -> Result<Value, MapperError>;

    fn to_bytes(&self, value: &Value) -> Result<Vec<u8>, MapperError>;
}

pub type MapperFactory = fn() -> Arc<dyn Mapper>;

/// JSON bodies through `serde_json`.
#[derive(Debug, Default)]
pub struct JsonMapper;

impl Mapper for JsonMapper {
    fn content_kind(&self) -> &str {
        "application/json"
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Value, MapperError> {
        if bytes.is_empty() {
            return Err(MapperError::Empty);
        }
        serde_json::from_slice(bytes).map_err(|e| MapperError::Decode(e.to_string()))
    }

    fn to_bytes(&self, value: &Value) -> Result<Vec<u8>, MapperError> {
        serde_json::to_vec(value).map_err(|e| MapperError::Encode(e.to_string()))
    }
}

/// UTF-8 text bodies, carried as a JSON string.
#[derive(Debug, Default)]
pub struct TextMapper;

impl Mapper for TextMapper {
    fn content_kind(&self) -> &str {
        "text/plain"
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Value, MapperError> {
        std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| MapperError::Decode(e.to_string()))
    }

    fn to_bytes(&self, value: &Value) -> Result<Vec<u8>, MapperError> {
        Ok(match value {
            Value::String(s) => s.clone().into_bytes(),
            other => other.to_string().into_bytes(),
        })
    }
}

/// Content kind → mapper factory.
#[derive(Clone, Default)]
pub struct MapperRegistry {
    factories: HashMap<String, MapperFactory>,
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("MapperRegistry").field("kinds", &kinds).finish()
    }
}

impl MapperRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// JSON and plain text.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("application/json", || Arc::new(JsonMapper) as Arc<dyn Mapper>);
        registry.register("text/plain", || Arc::new(TextMapper) as Arc<dyn Mapper>);
        registry
    }

    /// Registers `factory` under `content_kind`, replacing any previous entry.
    pub fn register(&mut self, content_kind: &str, factory: MapperFactory) {
        self.factories.insert(media_type(content_kind), factory);
    }

    pub fn contains(&self, content_kind: &str) -> bool {
        self.factories.contains_key(&media_type(content_kind))
    }

    /// Instantiates the mapper for `content_kind`.
    pub fn resolve(&self, content_kind: &str) -> Result<Arc<dyn Mapper>, RouteError> {
        let kind = media_type(content_kind);
        self.factories
            .get(&kind)
            .map(|factory| factory())
            .ok_or(RouteError::UnknownMapper(kind))
    }
}
