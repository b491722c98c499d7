use thiserror::Error;

/// Reasons a route pattern is rejected at registration time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
	#[error("route pattern must not be empty")]
	Empty,

	#[error("route pattern `{0}` must start with `/`")]
	MissingLeadingSlash(String),

	#[error("route pattern `{pattern}` has an unnamed parameter at segment {index}")]
	UnnamedParameter { pattern: String, index: usize },
}
