use crate::{
	context::Context,
	middleware::{Flow, MiddlewareChain},
	route::{Handler, Request},
	static_files::StaticFiles,
	table::{MethodKey, RoutingTable},
};
use anyhow::Error;
use hyper::{
	body::Body,
	header::{self, HeaderValue},
	Method, Response, StatusCode,
};
use std::{path::Path, time::Instant};

/// A function that can convert an error into a response.
pub type InternalErrorHandler = fn(e: Error) -> Response<Body>;
fn default_error_handler(e: Error) -> Response<Body> {
	let mut res = Response::new(Body::from(e.to_string()));
	*res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
	res
}

/// A function that handles unroutable requests and creates a response.
pub type NotFoundHandler = fn(ctx: Context) -> Response<Body>;
fn default_not_found_handler(mut ctx: Context) -> Response<Body> {
	ctx.status(StatusCode::NOT_FOUND)
		.set_header(
			header::CONTENT_TYPE,
			HeaderValue::from_static("text/plain; charset=utf-8"),
		)
		.write("404 page not found\n");
	ctx.into_response()
}

/// Collects routes, middleware and static directories before serving starts.
///
/// ```
/// use junction::{Context, Flow, Method, Response, RouterBuilder};
///
/// async fn hello(ctx: Context) -> Response {
/// 	let name = ctx.param("name").unwrap_or("stranger").to_owned();
/// 	ctx.send(format!("hello {}", name))
/// }
///
/// let router = RouterBuilder::default()
/// 	.middleware(|_ctx| Flow::Continue)
/// 	.get("/hello/:name", hello)
/// 	.register(Method::OPTIONS, "/hello/:name", hello)
/// 	.build();
/// ```
#[derive(Debug)]
pub struct RouterBuilder {
	table: RoutingTable,
	middleware: MiddlewareChain,
	statics: StaticFiles,
	debug: bool,
	internal_error_handler: Option<InternalErrorHandler>,
	not_found_handler: Option<NotFoundHandler>,
}

impl Default for RouterBuilder {
	fn default() -> Self {
		Self {
			table: RoutingTable::default(),
			middleware: MiddlewareChain::default(),
			statics: StaticFiles::default(),
			debug: false,
			internal_error_handler: None,
			not_found_handler: None,
		}
	}
}

impl RouterBuilder {
	/// Registers `handler` for `method` requests matching `pattern`.
	///
	/// Segments starting with `:` are named parameters. Registering the same shape twice keeps the
	/// later handler.
	///
	/// Literal segments are compared with the raw, still percent-encoded request path, so a request
	/// for `/caf%C3%A9` does not match a route registered as `/café`; only parameter values are
	/// decoded.
	///
	/// # Panics
	///
	/// Panics if `pattern` is empty or does not start with `/`.
	pub fn register(mut self, method: Method, pattern: &str, handler: impl Handler) -> Self {
		self.table.register(method, pattern, handler);
		self
	}

	/// Registers `handler` for every method. Method-specific routes take precedence.
	pub fn all(mut self, pattern: &str, handler: impl Handler) -> Self {
		self.table.register(MethodKey::Any, pattern, handler);
		self
	}

	pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
		self.register(Method::GET, pattern, handler)
	}

	pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
		self.register(Method::POST, pattern, handler)
	}

	pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
		self.register(Method::PUT, pattern, handler)
	}

	pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
		self.register(Method::PATCH, pattern, handler)
	}

	pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
		self.register(Method::DELETE, pattern, handler)
	}

	/// Appends a middleware. Middleware runs in registration order before routing.
	pub fn middleware<F>(mut self, middleware: F) -> Self
	where
		F: Fn(&mut Context) -> Flow + Send + Sync + 'static,
	{
		self.middleware.push(middleware);
		self
	}

	/// Adds a directory searched for files when no route matches. Directories are searched in the
	/// order they are added; missing directories are skipped.
	pub fn add_static<I, S>(mut self, dir: impl AsRef<Path>, push_assets: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.statics.add(dir, push_assets);
		self
	}

	/// Gzip static files in memory before sending them.
	pub fn compression(mut self, enabled: bool) -> Self {
		self.statics.set_compression(enabled);
		self
	}

	/// Files of this size or larger are streamed uncompressed.
	pub fn compression_limit(mut self, limit: u64) -> Self {
		self.statics.set_compression_limit(limit);
		self
	}

	/// Log every request at `info` instead of `trace`.
	pub fn debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;
		self
	}

	pub fn internal_error_handler(mut self, handler: InternalErrorHandler) -> Self {
		self.internal_error_handler = Some(handler);
		self
	}

	pub fn not_found_handler(mut self, handler: NotFoundHandler) -> Self {
		self.not_found_handler = Some(handler);
		self
	}

	pub fn build(self) -> Router {
		Router {
			table: self.table,
			middleware: self.middleware,
			statics: self.statics,
			debug: self.debug,
			internal_error: self.internal_error_handler.unwrap_or(default_error_handler),
			not_found: self.not_found_handler.unwrap_or(default_not_found_handler),
		}
	}
}

/// A frozen set of routes ready to serve requests. Share it behind an `Arc`.
#[derive(Debug)]
pub struct Router {
	table: RoutingTable,
	middleware: MiddlewareChain,
	statics: StaticFiles,
	debug: bool,
	internal_error: InternalErrorHandler,
	not_found: NotFoundHandler,
}

impl Router {
	pub fn table(&self) -> &RoutingTable {
		&self.table
	}

	/// Runs a request through middleware, routes, static files and finally the not-found handler.
	///
	/// Requires a tokio runtime: static files are read with `tokio::fs` and streamed from a
	/// spawned task. hyper's own server already runs on one.
	pub async fn handle(&self, req: Request) -> Response<Body> {
		let started = Instant::now();
		let method = req.method().clone();
		let path = req.uri().path().to_owned();

		let res = self.dispatch(Context::new(req)).await;

		let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
		let status = res.status().as_u16();
		if self.debug {
			tracing::info!(%method, %path, status, elapsed_ms, "request");
		} else {
			tracing::trace!(%method, %path, status, elapsed_ms, "request");
		}
		res
	}

	async fn dispatch(&self, mut ctx: Context) -> Response<Body> {
		if self.middleware.run(&mut ctx) {
			return ctx.into_response();
		}

		if let Some(route) = self.table.lookup(ctx.method(), ctx.path()) {
			let params = route.bind(ctx.path());
			ctx.set_params(params);
			return route.call(ctx).await.unwrap_or_else(self.internal_error);
		}

		match self.statics.try_serve(&mut ctx).await {
			Ok(true) => ctx.into_response(),
			Ok(false) => (self.not_found)(ctx),
			Err(e) => (self.internal_error)(e),
		}
	}
}
