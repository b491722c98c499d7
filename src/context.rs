use crate::route::{Params, Request, Response};
use anyhow::Context as _;
use hyper::{
	body::{self, Bytes},
	header::{self, HeaderMap, HeaderName, HeaderValue},
	Body, Method, StatusCode, Version,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::form_urlencoded;

/// A single entry of an [`ErrorPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
	pub message: String,
}

/// Body written by [`Context::error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub errors: Vec<ErrorMessage>,
}

impl ErrorPayload {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			errors: vec![ErrorMessage {
				message: message.into(),
			}],
		}
	}
}

/// Per-request state shared by middleware, handlers and the static file server.
///
/// Holds the incoming request, the path parameters bound once a route matches, and the response
/// being built. Middleware that continues leaves its headers on the response, so they survive into
/// whatever the handler eventually sends.
#[derive(Debug)]
pub struct Context {
	request: Request,
	params: Params,
	response: hyper::Response<Body>,
}

impl Context {
	pub fn new(request: Request) -> Self {
		Self {
			request,
			params: Params::default(),
			response: hyper::Response::new(Body::empty()),
		}
	}

	pub fn method(&self) -> &Method {
		self.request.method()
	}

	/// The request path, without the query string.
	pub fn path(&self) -> &str {
		self.request.uri().path()
	}

	pub fn version(&self) -> Version {
		self.request.version()
	}

	pub fn headers(&self) -> &HeaderMap {
		self.request.headers()
	}

	pub fn request(&self) -> &Request {
		&self.request
	}

	/// A path parameter of the matched route, or `None` if the route has no such parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name)
	}

	pub fn params(&self) -> &Params {
		&self.params
	}

	pub(crate) fn set_params(&mut self, params: Params) {
		self.params = params;
	}

	/// First value of a query string parameter, decoded.
	pub fn query(&self, name: &str) -> Option<String> {
		let query = self.request.uri().query()?;
		form_urlencoded::parse(query.as_bytes())
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.into_owned())
	}

	/// Reads the whole request body. Subsequent calls see an empty body.
	pub async fn body_bytes(&mut self) -> anyhow::Result<Bytes> {
		let body = std::mem::take(self.request.body_mut());
		Ok(body::to_bytes(body).await?)
	}

	pub async fn read_json<T: DeserializeOwned>(&mut self) -> anyhow::Result<T> {
		let bytes = self.body_bytes().await?;
		serde_json::from_slice(&bytes).context("request body is not valid JSON")
	}

	pub fn status(&mut self, status: StatusCode) -> &mut Self {
		*self.response.status_mut() = status;
		self
	}

	pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
		self.response.headers_mut().insert(name, value);
		self
	}

	pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
		self.response.headers_mut().append(name, value);
		self
	}

	pub fn response_headers(&self) -> &HeaderMap {
		self.response.headers()
	}

	/// Replaces the response body.
	pub fn write(&mut self, body: impl Into<Body>) -> &mut Self {
		*self.response.body_mut() = body.into();
		self
	}

	pub fn send(mut self, body: impl Into<Body>) -> Response {
		self.write(body);
		self.finish()
	}

	/// Serializes `payload` as the response body and sets the JSON content type.
	pub fn json<T: Serialize + ?Sized>(mut self, status: StatusCode, payload: &T) -> Response {
		let body = serde_json::to_vec(payload)?;
		self.status(status).set_header(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		self.send(body)
	}

	/// Responds with an [`ErrorPayload`] carrying `message`.
	pub fn error(self, status: StatusCode, message: impl Into<String>) -> Response {
		self.json(status, &ErrorPayload::new(message))
	}

	pub fn finish(self) -> Response {
		Ok(self.into_response())
	}

	pub fn into_response(self) -> hyper::Response<Body> {
		self.response
	}
}
