use junction::{
	header::{self, HeaderValue},
	hyper::Server,
	Context, Flow, HttpRouter, Response, RouterBuilder, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::{
	env,
	net::SocketAddr,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize, Serialize)]
struct Greeting {
	hello: String,
}

async fn hello(ctx: Context) -> Response {
	let name = ctx.param("name").unwrap_or("world").to_owned();
	match ctx.query("format").as_deref() {
		Some("json") => ctx.json(StatusCode::OK, &Greeting { hello: name }),
		_ => ctx.send(format!("hello {}\n", name)),
	}
}

async fn echo(mut ctx: Context) -> Response {
	match ctx.read_json::<Greeting>().await {
		Ok(greeting) => ctx.json(StatusCode::OK, &greeting),
		Err(e) => ctx.error(StatusCode::BAD_REQUEST, e.to_string()),
	}
}

async fn not_ready(ctx: Context) -> Response {
	ctx.error(StatusCode::NOT_IMPLEMENTED, "method not ready")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "junction=debug,server=debug".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let mut args = env::args().skip(1);
	let addr: SocketAddr = args
		.next()
		.unwrap_or_else(|| "127.0.0.1:3000".to_owned())
		.parse()?;
	let public = args.next().unwrap_or_else(|| "./public".to_owned());

	let served = Arc::new(AtomicU64::new(0));
	let counter = Arc::clone(&served);

	let router = RouterBuilder::default()
		.debug(true)
		.middleware(move |ctx| {
			let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
			if let Ok(value) = HeaderValue::from_str(&n.to_string()) {
				ctx.set_header(header::HeaderName::from_static("x-request-count"), value);
			}
			Flow::Continue
		})
		.middleware(|ctx| {
			if ctx.path().starts_with("/admin") && ctx.headers().get(header::AUTHORIZATION).is_none() {
				ctx.status(StatusCode::UNAUTHORIZED).write("unauthorized\n");
				return Flow::Handled;
			}
			Flow::Continue
		})
		.get("/hello/:name", hello)
		.get("/hello", hello)
		.post("/echo", echo)
		.all("/admin/:section", not_ready)
		.add_static(&public, vec!["/app.js", "/style.css"])
		.compression(true);

	let server = Server::bind(&addr).serve(HttpRouter::from(router));
	tracing::info!(%addr, %public, "listening");

	server.await?;
	Ok(())
}
