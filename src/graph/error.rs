use thiserror::Error;

/// Error type returned by collaborator port implementations.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for the graph core.
pub type GraphResult<T> = Result<T, GraphError>;

/// Failures surfaced by the graph core. Collaborator failures propagate to
/// the caller as-is; the core never retries them.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The bookmark source failed.
	#[error("failed to load bookmarks")]
	Bookmarks(#[source] SourceError),
	/// The note source failed.
	#[error("failed to load notes")]
	Notes(#[source] SourceError),
	/// Configuration JSON did not parse.
	#[error("invalid configuration: {0}")]
	Config(#[from] serde_json::Error),
	/// Configuration parsed but a value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}
