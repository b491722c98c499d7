use crate::context::Context;
use std::fmt::{self, Debug, Formatter};

/// What a middleware decided to do with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	/// Hand the request on to the next middleware, then routing.
	Continue,
	/// The middleware has written a complete response; stop here.
	Handled,
}

/// A function run before routing. Registered with [`RouterBuilder::middleware`].
///
/// [`RouterBuilder::middleware`]: crate::RouterBuilder::middleware
pub trait Middleware: Send + Sync + 'static {
	fn handle(&self, ctx: &mut Context) -> Flow;
}

impl<F> Middleware for F
where
	F: Fn(&mut Context) -> Flow + Send + Sync + 'static,
{
	fn handle(&self, ctx: &mut Context) -> Flow {
		self(ctx)
	}
}

#[derive(Default)]
pub struct MiddlewareChain {
	stack: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
	pub fn push(&mut self, middleware: impl Middleware) {
		self.stack.push(Box::new(middleware));
	}

	pub fn len(&self) -> usize {
		self.stack.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stack.is_empty()
	}

	/// Runs the chain in registration order. Returns `true` when a middleware handled the request,
	/// in which case nothing after it runs.
	pub fn run(&self, ctx: &mut Context) -> bool {
		for (index, middleware) in self.stack.iter().enumerate() {
			if middleware.handle(ctx) == Flow::Handled {
				tracing::trace!(index, path = ctx.path(), "middleware handled request");
				return true;
			}
		}
		false
	}
}

impl Debug for MiddlewareChain {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MiddlewareChain")
			.field("len", &self.stack.len())
			.finish()
	}
}

#[cfg(test)]
mod test {
	use super::{Flow, MiddlewareChain};
	use crate::Context;
	use hyper::{header, Body, Request, StatusCode};
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	};

	fn context() -> Context {
		Context::new(Request::get("/json").body(Body::empty()).unwrap())
	}

	#[test]
	fn empty_chain_continues() {
		let chain = MiddlewareChain::default();
		assert!(chain.is_empty());
		assert!(!chain.run(&mut context()));
	}

	#[test]
	fn runs_in_registration_order() {
		let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
		let mut chain = MiddlewareChain::default();
		for id in 0..3 {
			let seen = Arc::clone(&seen);
			chain.push(move |_: &mut Context| {
				seen.lock().unwrap().push(id);
				Flow::Continue
			});
		}

		assert_eq!(chain.len(), 3);
		assert!(!chain.run(&mut context()));
		assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
	}

	#[test]
	fn stops_at_first_handled() {
		let later = Arc::new(AtomicUsize::new(0));
		let mut chain = MiddlewareChain::default();
		chain.push(|ctx: &mut Context| {
			ctx.status(StatusCode::UNAUTHORIZED);
			Flow::Handled
		});
		let counter = Arc::clone(&later);
		chain.push(move |_: &mut Context| {
			counter.fetch_add(1, Ordering::SeqCst);
			Flow::Continue
		});

		let mut ctx = context();
		assert!(chain.run(&mut ctx));
		assert_eq!(later.load(Ordering::SeqCst), 0);
		assert_eq!(ctx.into_response().status(), StatusCode::UNAUTHORIZED);
	}

	#[test]
	fn continuing_middleware_keeps_headers() {
		let mut chain = MiddlewareChain::default();
		chain.push(|ctx: &mut Context| {
			ctx.set_header(
				header::CONTENT_TYPE,
				header::HeaderValue::from_static("application/json"),
			);
			Flow::Continue
		});

		let mut ctx = context();
		assert!(!chain.run(&mut ctx));
		assert_eq!(ctx.response_headers()[header::CONTENT_TYPE], "application/json");
	}
}
