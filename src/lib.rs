//! A hash-based HTTP router with middleware and static file serving, built on hyper.
//!
//! ```
//! use junction::{Context, Flow, Response, RouterBuilder, StatusCode};
//!
//! async fn hello(ctx: Context) -> Response {
//! 	let name = ctx.param("name").unwrap_or("stranger").to_owned();
//! 	ctx.send(format!("hello {}", name))
//! }
//!
//! async fn create(mut ctx: Context) -> Response {
//! 	let body: serde_json::Value = match ctx.read_json().await {
//! 		Ok(body) => body,
//! 		Err(e) => return ctx.error(StatusCode::BAD_REQUEST, e.to_string()),
//! 	};
//! 	ctx.json(StatusCode::CREATED, &body)
//! }
//!
//! let router = RouterBuilder::default()
//! 	.middleware(|ctx| match ctx.headers().get("authorization") {
//! 		Some(_) => Flow::Continue,
//! 		None => {
//! 			ctx.status(StatusCode::UNAUTHORIZED);
//! 			Flow::Handled
//! 		}
//! 	})
//! 	.get("/hello/:name", hello)
//! 	.post("/things", create)
//! 	.add_static("./public", vec!["/app.js"])
//! 	.compression(true)
//! 	.build();
//! ```
//!
//! Segments starting with `:` match any single path segment and are bound by name. Literal
//! segments are preferred over parameters, and a request matches only a route with exactly as many
//! segments. Routes registered with [`RouterBuilder::all`] answer every method that has no more
//! specific route for the path.
//!
//! Requests first pass through the middleware chain, in registration order. A middleware that
//! returns [`Flow::Handled`] ends the request with whatever it wrote into the [`Context`]. Requests
//! no route claims are looked up in the static directories, and failing that answered by the
//! not-found handler.

mod http;
pub use http::*;

pub use hyper;
pub use hyper::{header, Body, Method, StatusCode, Version};

pub mod context;
pub mod error;
pub mod middleware;

/// Route patterns, handlers and bound parameters.
pub mod route;

/// Builder and dispatcher.
///
/// Use the RouterBuilder to create a Router, then hand it to hyper through [`HttpRouter`].
pub mod router;

pub mod static_files;

/// The per-method route trees.
pub mod table;

pub use context::{Context, ErrorPayload};
pub use error::PatternError;
pub use middleware::{Flow, Middleware, MiddlewareChain};
pub use route::*;
pub use router::*;
pub use static_files::StaticFiles;
pub use table::{MethodKey, RoutingTable};
