//! Typed errors for the loading, parsing, and export paths.

use thiserror::Error;

/// Errors surfaced by graph-atlas.
///
/// Infrastructure failures (network, DOM, serialization) are reported through
/// this type. Bad metric values are not: the mapper degrades them to minimum
/// sizes instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtlasError {
	/// The graph document or configuration could not be fetched.
	#[error("fetch failed for {url}: {message}")]
	Fetch { url: String, message: String },

	/// The GEXF document is malformed.
	#[error("invalid GEXF: {message}")]
	Gexf { message: String },

	/// The site configuration could not be decoded.
	#[error("invalid configuration: {message}")]
	Config { message: String },

	/// A required DOM element or browser API was unavailable.
	#[error("DOM error: {message}")]
	Dom { message: String },

	/// The PNG export could not be produced.
	#[error("export of {file_name} failed: {message}")]
	Export { file_name: String, message: String },
}

impl AtlasError {
	/// Build a GEXF error from any displayable cause.
	pub fn gexf(message: impl std::fmt::Display) -> Self {
		Self::Gexf {
			message: message.to_string(),
		}
	}

	/// Build a DOM error from any displayable cause.
	pub fn dom(message: impl std::fmt::Display) -> Self {
		Self::Dom {
			message: message.to_string(),
		}
	}

	/// Build a DOM error from a thrown JS value.
	pub fn js(context: &str, value: wasm_bindgen::JsValue) -> Self {
		let detail = value
			.as_string()
			.unwrap_or_else(|| format!("{:?}", value));
		Self::Dom {
			message: format!("{}: {}", context, detail),
		}
	}
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AtlasError>;
