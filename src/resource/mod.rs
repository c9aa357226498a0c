//! Resource routing and dispatch.
//!
//! Routes are registered once at startup through [`RouteTableBuilder`] and
//! frozen into a [`RouteTable`]. Each route pairs a method and a path
//! pattern with ordered [`ParameterResolver`]s; at request time the table
//! picks the first matching route, extracts the handler arguments and
//! returns the handler's eventual response.
//!
//! # Example
//!
//! ```
//! use restline::http::{Method, Request, Response};
//! use restline::resource::{handler, ParamType, ParameterResolver, RouteTableBuilder};
//!
//! let mut builder = RouteTableBuilder::default();
//! builder.register_route(
//!     Method::GET,
//!     "/res/{resId}",
//!     vec![ParameterResolver::path(ParamType::Str)],
//!     Some(handler(|args| async move {
//!         Response::ok(args.text(0).unwrap_or_default().to_string())
//!     })),
//! )?;
//! let table = builder.build();
//!
//! let completes = table.dispatch(Request::new(Method::GET, "/res/42"))?;
//! # let _ = completes;
//! # Ok::<(), restline::resource::RouteError>(())
//! ```

pub mod error;
pub mod mapper;
pub mod resolver;
pub mod route;
pub mod table;

pub use error::{ArgumentError, MapperError, RouteError};
pub use mapper::{JsonMapper, Mapper, MapperFactory, MapperRegistry, TextMapper};
pub use resolver::{Arg, Args, ParamType, ParameterResolver, ResolverKind};
pub use route::{handler, with_success, Completes, Handler, PathPattern, Route};
pub use table::{Resolution, RouteTable, RouteTableBuilder};
