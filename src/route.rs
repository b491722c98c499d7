use crate::{context::Context, error::PatternError};
use hyper::Body;
use std::{
	borrow::Cow,
	fmt::{self, Debug, Formatter},
	future::Future,
	pin::Pin,
};

pub type Request = hyper::Request<Body>;
pub type Response = anyhow::Result<hyper::Response<Body>>;
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Leading character of a named parameter segment.
pub const PARAM_SIGIL: char = ':';

/// An async function that turns a request context into a response.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = Response>`, so plain `async fn`s can
/// be registered directly.
pub trait Handler: Send + Sync + 'static {
	fn call(&self, ctx: Context) -> BoxFuture;
}

impl<F, Fut> Handler for F
where
	F: Fn(Context) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Response> + Send + 'static,
{
	fn call(&self, ctx: Context) -> BoxFuture {
		Box::pin(self(ctx))
	}
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum PathSegment {
	/// Matches any single segment and binds it to the contained name.
	Dynamic(String),
	Static(String),
}

impl PathSegment {
	fn parse(segment: &str) -> Option<Self> {
		match segment.strip_prefix(PARAM_SIGIL) {
			Some("") => None,
			Some(name) => Some(PathSegment::Dynamic(name.to_owned())),
			None => Some(PathSegment::Static(segment.to_owned())),
		}
	}
}

/// Strips a single trailing slash, leaving the root path alone.
pub(crate) fn normalize(path: &str) -> &str {
	match path.strip_suffix('/') {
		Some(stripped) if !stripped.is_empty() => stripped,
		_ => path,
	}
}

/// Splits a normalized path into its segments. The root path has none.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
	let trimmed = path.strip_prefix('/').unwrap_or(path);
	(!trimmed.is_empty())
		.then(|| trimmed.split('/'))
		.into_iter()
		.flatten()
}

/// A validated route pattern such as `/users/:id/posts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
	source: String,
	segments: Vec<PathSegment>,
}

impl Pattern {
	pub fn parse(pattern: &str) -> Result<Self, PatternError> {
		if pattern.is_empty() {
			return Err(PatternError::Empty);
		}
		if !pattern.starts_with('/') {
			return Err(PatternError::MissingLeadingSlash(pattern.to_owned()));
		}

		let source = normalize(pattern);
		let segments = segments(source)
			.enumerate()
			.map(|(index, segment)| {
				PathSegment::parse(segment).ok_or_else(|| PatternError::UnnamedParameter {
					pattern: pattern.to_owned(),
					index,
				})
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			source: source.to_owned(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn segments(&self) -> &[PathSegment] {
		&self.segments
	}

	/// Parameter names paired with the index of the segment they occupy.
	pub fn param_names(&self) -> impl Iterator<Item = (usize, &str)> {
		self.segments
			.iter()
			.enumerate()
			.filter_map(|(index, segment)| match segment {
				PathSegment::Dynamic(name) => Some((index, name.as_str())),
				PathSegment::Static(_) => None,
			})
	}
}

/// Path parameters bound from a matched request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
	values: Vec<(String, String)>,
}

impl Params {
	pub fn get(&self, name: &str) -> Option<&str> {
		self.values
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.values.iter_mut().find(|(key, _)| *key == name) {
			Some(slot) => slot.1 = value,
			None => self.values.push((name, value)),
		}
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

/// A registered pattern together with the handler it dispatches to.
pub struct Route {
	pattern: Pattern,
	handler: Box<dyn Handler>,
}

impl Route {
	pub fn new(pattern: Pattern, handler: impl Handler) -> Self {
		Self {
			pattern,
			handler: Box::new(handler),
		}
	}

	pub fn pattern(&self) -> &Pattern {
		&self.pattern
	}

	/// Binds each parameter segment of the pattern to the segment at the same position in `path`.
	///
	/// Only meaningful for a path this route was looked up with, which guarantees equal segment
	/// counts. Values are percent-decoded when possible.
	pub fn bind(&self, path: &str) -> Params {
		let mut params = Params::default();
		for (segment, value) in self.pattern.segments.iter().zip(segments(normalize(path))) {
			if let PathSegment::Dynamic(name) = segment {
				let value = urlencoding::decode(value)
					.map(Cow::into_owned)
					.unwrap_or_else(|_| value.to_owned());
				params.insert(name.as_str(), value);
			}
		}
		params
	}

	pub fn call(&self, ctx: Context) -> BoxFuture {
		self.handler.call(ctx)
	}
}

impl Debug for Route {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern.as_str())
			.finish_non_exhaustive()
	}
}
