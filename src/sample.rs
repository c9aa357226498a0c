//! A small in-memory resource exercising the routing layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::http::request::Method;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::resource::{handler, ParamType, ParameterResolver, RouteError, RouteTableBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct NewData {
    name: String,
    #[serde(default)]
    description: String,
}

/// Store behind the `/res` routes. Identifiers are assigned from 1 upwards.
#[derive(Debug, Default)]
pub struct DataResource {
    entries: RwLock<BTreeMap<u64, Data>>,
    next_id: AtomicU64,
}

impl DataResource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `POST /res`, `GET /res`, `GET /res/{resId}` and
    /// `DELETE /res/{resId}`.
    pub fn register(self: &Arc<Self>, builder: &mut RouteTableBuilder) -> Result<(), RouteError> {
        let store = Arc::clone(self);
        builder.register_route(
            Method::POST,
            "/res",
            vec![ParameterResolver::json_body("Data")],
            Some(handler(move |args| {
                let store = Arc::clone(&store);
                async move {
                    let Some(value) = args.json(0).cloned() else {
                        return bad_request("missing body");
                    };
                    match serde_json::from_value::<NewData>(value) {
                        Ok(new) => store.create(new.name, new.description).await,
                        Err(err) => bad_request(&err.to_string()),
                    }
                }
            })),
        )?;

        let store = Arc::clone(self);
        builder.register_route(
            Method::GET,
            "/res",
            vec![ParameterResolver::query_or("limit", ParamType::U64, "10")],
            Some(handler(move |args| {
                let store = Arc::clone(&store);
                async move {
                    let limit = args.uint(0).unwrap_or(10);
                    json(StatusCode::OK, &store.list(limit).await)
                }
            })),
        )?;

        let store = Arc::clone(self);
        builder.register_route(
            Method::GET,
            "/res/{resId}",
            vec![ParameterResolver::path(ParamType::Str)],
            Some(handler(move |args| {
                let store = Arc::clone(&store);
                async move {
                    match store.find(args.text(0).unwrap_or_default()).await {
                        Some(data) => json(StatusCode::OK, &data),
                        None => Response::not_found(),
                    }
                }
            })),
        )?;

        let store = Arc::clone(self);
        builder.register_route(
            Method::DELETE,
            "/res/{resId}",
            vec![ParameterResolver::path(ParamType::Str)],
            Some(handler(move |args| {
                let store = Arc::clone(&store);
                async move {
                    if store.remove_by_key(args.text(0).unwrap_or_default()).await {
                        Response::of(StatusCode::NO_CONTENT)
                    } else {
                        Response::not_found()
                    }
                }
            })),
        )?;

        Ok(())
    }

    async fn create(&self, name: String, description: String) -> Response {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let data = Data { id, name, description };
        self.entries.write().await.insert(id, data.clone());
        debug!(id, "Created resource");

        match serde_json::to_vec(&data) {
            Ok(body) => ResponseBuilder::new(StatusCode::CREATED)
                .header("Content-Type", "application/json")
                .header("Location", format!("/res/{id}"))
                .body(body)
                .build(),
            Err(_) => Response::internal_error(),
        }
    }

    /// Looks up an entry by its path key; keys that are not identifiers
    /// simply match nothing.
    pub async fn find(&self, key: &str) -> Option<Data> {
        self.get(key.parse().ok()?).await
    }

    pub async fn get(&self, id: u64) -> Option<Data> {
        self.entries.read().await.get(&id).cloned()
    }

    /// Up to `limit` entries in identifier order.
    pub async fn list(&self, limit: u64) -> Vec<Data> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        self.entries.read().await.values().take(limit).cloned().collect()
    }

    pub async fn remove_by_key(&self, key: &str) -> bool {
        match key.parse() {
            Ok(id) => self.remove(id).await,
            Err(_) => false,
        }
    }

    pub async fn remove(&self, id: u64) -> bool {
        self.entries.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => ResponseBuilder::new(status)
            .header("Content-Type", "application/json")
            .body(body)
            .build(),
        Err(_) => Response::internal_error(),
    }
}

fn bad_request(reason: &str) -> Response {
    ResponseBuilder::new(StatusCode::BAD_REQUEST)
        .header("Content-Type", "text/plain")
        .body(reason.to_string())
        .build()
}
