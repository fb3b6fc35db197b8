//! Crate error type.

use thiserror::Error;

/// Failures outside the pure graph core.
#[derive(Debug, Error)]
pub enum Error {
	/// The report JSON could not be decoded.
	#[error("invalid report JSON: {0}")]
	Json(#[from] serde_json::Error),
	/// The browser refused something the canvas view needs.
	#[error("canvas setup: {0}")]
	Canvas(String),
}

/// Result alias over [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
