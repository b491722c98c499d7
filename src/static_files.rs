use crate::context::Context;
use anyhow::Context as _;
use flate2::{write::GzEncoder, Compression};
use hyper::{
	body::Bytes,
	header::{self, HeaderValue},
	Body, Version,
};
use std::{
	fs::Metadata,
	io::{self, Write},
	path::{Component, Path, PathBuf},
};
use tokio::{
	fs::{self, File},
	io::AsyncReadExt,
};

/// Files at or above this size are streamed even when compression is enabled.
pub const DEFAULT_COMPRESSION_LIMIT: u64 = 10_000_000;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct StaticRoot {
	dir: PathBuf,
	push_assets: Vec<String>,
	push_hints: Vec<HeaderValue>,
}

impl StaticRoot {
	/// The canonical directory files are served from.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn push_assets(&self) -> &[String] {
		&self.push_assets
	}
}

/// Serves files from an ordered list of directories. The first directory containing the requested
/// file wins.
#[derive(Debug, Clone)]
pub struct StaticFiles {
	roots: Vec<StaticRoot>,
	compression: bool,
	compression_limit: u64,
}

impl Default for StaticFiles {
	fn default() -> Self {
		Self {
			roots: Vec::new(),
			compression: false,
			compression_limit: DEFAULT_COMPRESSION_LIMIT,
		}
	}
}

impl StaticFiles {
	/// Adds a directory to search. Directories that cannot be resolved are skipped with a warning
	/// and `false` is returned.
	///
	/// `push_assets` are URL paths advertised as preload hints to HTTP/2 clients whenever a file
	/// from this directory is streamed.
	pub fn add<I, S>(&mut self, dir: impl AsRef<Path>, push_assets: I) -> bool
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let dir = dir.as_ref();
		let canonical = match std::fs::canonicalize(dir) {
			Ok(path) if path.is_dir() => path,
			_ => {
				tracing::warn!(dir = %dir.display(), "static directory not found, skipping");
				return false;
			}
		};

		let push_assets: Vec<String> = push_assets.into_iter().map(Into::into).collect();
		let push_hints = push_assets
			.iter()
			.filter_map(|asset| {
				HeaderValue::from_str(&format!("<{}>; rel=preload", asset))
					.map_err(|_| tracing::warn!(asset = %asset, "invalid push asset, ignoring"))
					.ok()
			})
			.collect();

		tracing::debug!(dir = %canonical.display(), "static directory added");
		self.roots.push(StaticRoot {
			dir: canonical,
			push_assets,
			push_hints,
		});
		true
	}

	pub fn set_compression(&mut self, enabled: bool) {
		self.compression = enabled;
	}

	pub fn set_compression_limit(&mut self, limit: u64) {
		self.compression_limit = limit;
	}

	pub fn roots(&self) -> &[StaticRoot] {
		&self.roots
	}

	/// Writes the file matching the request path into the response. Returns `false` when no root
	/// has a matching file.
	///
	/// File I/O and streaming run on tokio, so this must be awaited inside a tokio runtime.
	pub async fn try_serve(&self, ctx: &mut Context) -> anyhow::Result<bool> {
		let url_path = ctx.path().to_owned();

		for root in &self.roots {
			let (path, metadata) = match locate(root, &url_path).await {
				Some(found) => found,
				None => continue,
			};
			tracing::trace!(path = %path.display(), "serving static file");

			if let Some(mime) = content_type(&path) {
				ctx.set_header(header::CONTENT_TYPE, HeaderValue::from_static(mime));
			}

			if self.compression && metadata.len() < self.compression_limit {
				let data = fs::read(&path)
					.await
					.with_context(|| format!("unable to read {}", path.display()))?;
				let compressed = gzip(&data)?;
				ctx.set_header(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"))
					.set_header(header::CONTENT_LENGTH, HeaderValue::from(compressed.len()))
					.write(compressed);
			} else {
				let file = File::open(&path)
					.await
					.with_context(|| format!("unable to open {}", path.display()))?;
				if ctx.version() == Version::HTTP_2 {
					for hint in &root.push_hints {
						ctx.append_header(header::LINK, hint.clone());
					}
				}
				ctx.set_header(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()))
					.write(stream(file));
			}

			return Ok(true);
		}

		Ok(false)
	}
}

/// Maps a URL path onto `root` one component at a time. Anything other than plain names (parent
/// directories, absolute roots, drive prefixes) rejects the path.
fn map_path(root: &Path, url_path: &str) -> Option<PathBuf> {
	let decoded = urlencoding::decode(url_path).ok()?;
	let mut path = root.to_path_buf();
	for component in Path::new(decoded.trim_start_matches('/')).components() {
		match component {
			Component::Normal(name) => path.push(name),
			Component::CurDir => {}
			_ => return None,
		}
	}
	if decoded.ends_with('/') {
		path.push("index.html");
	}
	Some(path)
}

async fn locate(root: &StaticRoot, url_path: &str) -> Option<(PathBuf, Metadata)> {
	let candidate = map_path(&root.dir, url_path)?;
	let resolved = fs::canonicalize(&candidate).await.ok()?;
	if !resolved.starts_with(&root.dir) {
		tracing::warn!(
			path = %resolved.display(),
			root = %root.dir.display(),
			"static path escapes its root"
		);
		return None;
	}

	let metadata = fs::metadata(&resolved).await.ok()?;
	if metadata.is_file() {
		Some((resolved, metadata))
	} else {
		None
	}
}

pub fn content_type(path: &Path) -> Option<&'static str> {
	let ext = path.extension()?.to_str()?.to_ascii_lowercase();
	let mime = match ext.as_str() {
		"html" | "htm" => "text/html",
		"css" => "text/css",
		"js" | "mjs" => "application/javascript",
		"json" | "map" => "application/json",
		"txt" => "text/plain",
		"xml" => "application/xml",
		"svg" => "image/svg+xml",
		"png" => "image/png",
		"jpg" | "jpeg" => "image/jpeg",
		"gif" => "image/gif",
		"webp" => "image/webp",
		"ico" => "image/x-icon",
		"woff" => "font/woff",
		"woff2" => "font/woff2",
		"wasm" => "application/wasm",
		"pdf" => "application/pdf",
		_ => return None,
	};
	Some(mime)
}

fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(data)?;
	encoder.finish()
}

/// Feeds `file` into a response body from a background task, chunk by chunk.
///
/// Spawns onto the current tokio runtime and panics outside one.
fn stream(mut file: File) -> Body {
	let (mut sender, body) = Body::channel();
	tokio::spawn(async move {
		let mut buf = vec![0; CHUNK_SIZE];
		loop {
			match file.read(&mut buf).await {
				Ok(0) => break,
				Ok(n) => {
					// receiver gone, the client hung up
					if sender.send_data(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
						break;
					}
				}
				Err(e) => {
					tracing::warn!(error = %e, "static file read failed mid-stream");
					sender.abort();
					break;
				}
			}
		}
	});
	body
}
