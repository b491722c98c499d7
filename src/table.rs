use crate::route::{normalize, segments, Handler, PathSegment, Pattern, Route};
use hyper::Method;
use std::collections::HashMap;

/// Which tree a route is registered in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodKey {
	/// Matches every method when no method-specific route does.
	Any,
	Only(Method),
}

impl From<Method> for MethodKey {
	fn from(method: Method) -> Self {
		MethodKey::Only(method)
	}
}

#[derive(Debug, Default)]
pub struct RouteNode {
	route: Option<Route>,
	statics: HashMap<String, RouteNode>,
	/// Shared by every parameter segment at this depth, whatever its name.
	dynamic: Option<Box<RouteNode>>,
}

impl RouteNode {
	pub fn route(&self) -> Option<&Route> {
		self.route.as_ref()
	}

	pub fn child(&self, segment: &str) -> Option<&RouteNode> {
		self.statics.get(segment)
	}

	pub fn param_child(&self) -> Option<&RouteNode> {
		self.dynamic.as_deref()
	}

	fn child_mut(&mut self, segment: &PathSegment) -> &mut RouteNode {
		match segment {
			PathSegment::Static(text) => self.statics.entry(text.clone()).or_default(),
			PathSegment::Dynamic(_) => &mut **self.dynamic.get_or_insert_with(Default::default),
		}
	}

	/// Follows `path` one segment at a time, preferring literal children over the parameter slot.
	/// There is no backtracking: a literal child that leads nowhere is not retried as a parameter.
	fn walk(&self, path: &str) -> Walk<'_> {
		let mut node = self;
		let mut depth = 0;
		for segment in segments(path) {
			node = match node.child(segment).or_else(|| node.param_child()) {
				Some(next) => next,
				None if depth == 0 => return Walk::RootMiss,
				None => return Walk::Partial,
			};
			depth += 1;
		}
		match node.route() {
			Some(route) => Walk::Matched(route),
			// an empty path that stops on a bare root matched nothing
			None if depth == 0 => Walk::RootMiss,
			None => Walk::Partial,
		}
	}
}

/// Outcome of walking a single tree.
enum Walk<'a> {
	Matched(&'a Route),
	/// At least one segment matched, but no route was reached.
	Partial,
	/// The first segment had neither a literal child nor a parameter slot.
	RootMiss,
}

impl<'a> Walk<'a> {
	fn route(self) -> Option<&'a Route> {
		match self {
			Walk::Matched(route) => Some(route),
			Walk::Partial | Walk::RootMiss => None,
		}
	}
}

/// One route tree per method, plus the tree for routes registered against every method.
#[derive(Debug, Default)]
pub struct RoutingTable {
	roots: HashMap<MethodKey, RouteNode>,
}

impl RoutingTable {
	/// Inserts `route`, replacing whatever route previously ended at the same node.
	pub fn insert(&mut self, method: MethodKey, route: Route) -> Option<Route> {
		let mut node = self.roots.entry(method).or_default();
		for segment in route.pattern().segments() {
			node = node.child_mut(segment);
		}
		node.route.replace(route)
	}

	/// Parses `pattern` and registers `handler` under it.
	///
	/// # Panics
	///
	/// Panics when the pattern is malformed. Route tables are built once before serving, so this is
	/// a programming error rather than a runtime condition.
	pub fn register(&mut self, method: impl Into<MethodKey>, pattern: &str, handler: impl Handler) {
		let method = method.into();
		let pattern = Pattern::parse(pattern).unwrap_or_else(|e| panic!("{}", e));

		tracing::debug!(?method, pattern = pattern.as_str(), "registering route");
		if let Some(previous) = self.insert(method, Route::new(pattern, handler)) {
			tracing::debug!(
				pattern = previous.pattern().as_str(),
				"route replaced by later registration"
			);
		}
	}

	/// Finds the route for `method` and `path`.
	///
	/// The method's own tree is walked first. The all-methods tree is tried only when the method has
	/// no tree or its walk failed at the very first segment; once the method tree has matched part
	/// of the path, a miss is final.
	pub fn lookup(&self, method: &Method, path: &str) -> Option<&Route> {
		let path = normalize(path);
		match self
			.roots
			.get(&MethodKey::Only(method.clone()))
			.map(|root| root.walk(path))
		{
			Some(Walk::Matched(route)) => Some(route),
			Some(Walk::Partial) => None,
			Some(Walk::RootMiss) | None => self.roots.get(&MethodKey::Any)?.walk(path).route(),
		}
	}

	pub fn root(&self, method: &MethodKey) -> Option<&RouteNode> {
		self.roots.get(method)
	}
}

#[cfg(test)]
mod test {
	use super::{MethodKey, RoutingTable};
	use crate::{Context, Response};
	use hyper::Method;

	async fn test_route(ctx: Context) -> Response {
		ctx.finish()
	}

	fn matched(table: &RoutingTable, method: Method, path: &str) -> Option<String> {
		table
			.lookup(&method, path)
			.map(|route| route.pattern().as_str().to_owned())
	}

	#[test]
	fn adds_routes() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/", test_route);
		table.register(Method::POST, "/:id", test_route);
		table.register(Method::PUT, "/:id/foo/bar", test_route);

		let get = table.root(&MethodKey::Only(Method::GET)).unwrap();
		assert!(get.route().is_some());

		let post = table.root(&MethodKey::Only(Method::POST)).unwrap();
		assert!(post.route().is_none());
		assert!(post.param_child().unwrap().route().is_some());

		let put = table.root(&MethodKey::Only(Method::PUT)).unwrap();
		let bar = put
			.param_child()
			.and_then(|node| node.child("foo"))
			.and_then(|node| node.child("bar"))
			.unwrap();
		assert_eq!(bar.route().unwrap().pattern().as_str(), "/:id/foo/bar");
	}

	#[test]
	fn keeps_sibling_children() {
		let mut table = RoutingTable::default();
		table.register(MethodKey::Any, "/test/stuff", test_route);
		table.register(MethodKey::Any, "/test/test", test_route);

		let test = table.root(&MethodKey::Any).unwrap().child("test").unwrap();
		assert!(test.child("stuff").is_some());
		assert!(test.child("test").is_some());
	}

	#[test]
	fn restricts_to_method() {
		let mut table = RoutingTable::default();
		table.register(Method::OPTIONS, "/test", test_route);

		assert!(table.lookup(&Method::OPTIONS, "/test").is_some());
		assert!(table.lookup(&Method::GET, "/test").is_none());
	}

	#[test]
	fn climbs_tree() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/test", test_route);
		table.register(Method::GET, "/stuff/:test/params/:more", test_route);

		assert!(matched(&table, Method::GET, "/test").is_some());
		assert!(matched(&table, Method::GET, "/stuff/param1/params/param2/").is_some());
		assert!(matched(&table, Method::GET, "/stuff/param1/par/param2").is_none());
	}

	#[test]
	fn matches_root() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/", test_route);

		assert_eq!(matched(&table, Method::GET, "/").as_deref(), Some("/"));
		assert!(matched(&table, Method::GET, "/x").is_none());
	}

	#[test]
	fn segment_count_must_match() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/a/b", test_route);

		assert!(matched(&table, Method::GET, "/a/b").is_some());
		assert!(matched(&table, Method::GET, "/a/b/c").is_none());
		assert!(matched(&table, Method::GET, "/a").is_none());
	}

	#[test]
	fn trailing_slash_is_ignored() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/users/", test_route);

		assert_eq!(matched(&table, Method::GET, "/users").as_deref(), Some("/users"));
		assert_eq!(matched(&table, Method::GET, "/users/").as_deref(), Some("/users"));
	}

	#[test]
	fn prefers_literal_without_backtracking() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/users/new", test_route);
		table.register(Method::GET, "/users/:id", test_route);
		table.register(Method::GET, "/users/:id/posts", test_route);

		assert_eq!(
			matched(&table, Method::GET, "/users/new").as_deref(),
			Some("/users/new")
		);
		assert_eq!(
			matched(&table, Method::GET, "/users/42").as_deref(),
			Some("/users/:id")
		);
		// the literal `new` child has no `posts` below it
		assert!(matched(&table, Method::GET, "/users/new/posts").is_none());
	}

	#[test]
	fn parameter_names_share_a_slot() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/hello/:name", test_route);
		table.register(Method::GET, "/hello/:other", test_route);

		assert_eq!(
			matched(&table, Method::GET, "/hello/world").as_deref(),
			Some("/hello/:other")
		);
	}

	#[test]
	fn last_registration_wins() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/x", test_route);
		let replaced = table.insert(
			MethodKey::Only(Method::GET),
			crate::Route::new(crate::Pattern::parse("/x/").unwrap(), test_route),
		);

		assert_eq!(replaced.unwrap().pattern().as_str(), "/x");
		let root = table.root(&MethodKey::Only(Method::GET)).unwrap();
		assert!(root.child("x").unwrap().route().is_some());
	}

	#[test]
	fn falls_back_to_any_method() {
		let mut table = RoutingTable::default();
		table.register(MethodKey::Any, "/shared/:id", test_route);
		table.register(Method::GET, "/only-get", test_route);

		for method in [Method::GET, Method::POST, Method::DELETE] {
			assert_eq!(
				matched(&table, method, "/shared/1").as_deref(),
				Some("/shared/:id")
			);
		}
		assert!(matched(&table, Method::POST, "/only-get").is_none());
	}

	#[test]
	fn method_route_beats_any_route() {
		let mut table = RoutingTable::default();
		table.register(MethodKey::Any, "/thing", test_route);
		table.register(Method::GET, "/:slug", test_route);

		assert_eq!(matched(&table, Method::GET, "/thing").as_deref(), Some("/:slug"));
		assert_eq!(matched(&table, Method::PUT, "/thing").as_deref(), Some("/thing"));
	}

	#[test]
	fn partial_match_does_not_fall_back() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/users/:id", test_route);
		table.register(MethodKey::Any, "/users/new/posts", test_route);

		assert!(matched(&table, Method::GET, "/users/new/posts").is_none());
		assert_eq!(
			matched(&table, Method::POST, "/users/new/posts").as_deref(),
			Some("/users/new/posts")
		);
	}

	#[test]
	fn interior_node_does_not_fall_back() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/a/b", test_route);
		table.register(MethodKey::Any, "/a", test_route);

		assert!(matched(&table, Method::GET, "/a").is_none());
		assert_eq!(matched(&table, Method::PUT, "/a").as_deref(), Some("/a"));
	}

	#[test]
	fn root_path_falls_back_when_method_root_is_bare() {
		let mut table = RoutingTable::default();
		table.register(Method::GET, "/x", test_route);
		table.register(MethodKey::Any, "/", test_route);

		assert_eq!(matched(&table, Method::GET, "/").as_deref(), Some("/"));
	}

	#[test]
	#[should_panic(expected = "must start with `/`")]
	fn panics_on_malformed_pattern() {
		RoutingTable::default().register(Method::GET, "users", test_route);
	}
}
