use crate::{route::Request, Router, RouterBuilder};
use hyper::{body::Body, service::Service};
use std::{
	convert::Infallible,
	future::{ready, Future, Ready},
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

/// Hands a [`RouteHandler`] to every connection hyper accepts.
///
/// ```no_run
/// use junction::{HttpRouter, RouterBuilder};
/// use junction::hyper::Server;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let router = RouterBuilder::default().add_static("./public", Vec::<String>::new());
/// let addr = ([127, 0, 0, 1], 3000).into();
/// Server::bind(&addr).serve(HttpRouter::from(router)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpRouter {
	router: Arc<Router>,
}

impl HttpRouter {
	pub fn new(router: Router) -> Self {
		Self {
			router: Arc::new(router),
		}
	}
}

impl From<Router> for HttpRouter {
	fn from(router: Router) -> Self {
		Self::new(router)
	}
}

impl From<RouterBuilder> for HttpRouter {
	fn from(builder: RouterBuilder) -> Self {
		Self::new(builder.build())
	}
}

impl<T> Service<T> for HttpRouter {
	type Response = RouteHandler;
	type Error = Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, _: T) -> Self::Future {
		ready(Ok(RouteHandler {
			router: Arc::clone(&self.router),
		}))
	}
}

/// Responsible for handling the actual HTTP requests from hyper.
#[derive(Debug, Clone)]
pub struct RouteHandler {
	router: Arc<Router>,
}

impl Service<Request> for RouteHandler {
	type Response = hyper::Response<Body>;
	type Error = Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: Request) -> Self::Future {
		let router = Arc::clone(&self.router);
		Box::pin(async move { Ok(router.handle(req).await) })
	}
}

#[cfg(test)]
mod test {
	use super::HttpRouter;
	use crate::{Context, Response, RouterBuilder};
	use hyper::{body, service::Service, Body, Request, StatusCode};

	async fn hit(ctx: Context) -> Response {
		ctx.send("all hit")
	}

	#[tokio::test]
	async fn serves_through_hyper_services() {
		let mut make = HttpRouter::from(RouterBuilder::default().all("/test/", hit));
		let mut handler = make.call(()).await.unwrap();

		let req = Request::get("/test/").body(Body::empty()).unwrap();
		let res = handler.call(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);

		let bytes = body::to_bytes(res.into_body()).await.unwrap();
		assert_eq!(&bytes[..], b"all hit");
	}
}
