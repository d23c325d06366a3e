//! Broker-level error types shared across pipelines, stores, and transports.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend responded with JSON the broker could not decode.
	#[error("Backend returned malformed JSON (HTTP {status}).")]
	Decode {
		/// Structured parsing failure including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the offending response.
		status: u16,
	},
	/// Refresh or revoke endpoint failed in a way that is not a credential rejection.
	#[error("Backend request failed with HTTP {status}: {preview}.")]
	Upstream {
		/// HTTP status code returned by the backend.
		status: u16,
		/// Truncated response body or error message.
		preview: String,
	},
	/// Credential was rejected and silent recovery failed or was exhausted.
	///
	/// Carries the original rejection rather than a synthesized logout error so callers
	/// can still inspect what the backend said.
	#[error("Credential was rejected (HTTP {status}): {reason}.")]
	Unauthenticated {
		/// HTTP status code of the rejected response.
		status: u16,
		/// Truncated body or GraphQL error message describing the rejection.
		reason: String,
	},
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Stored session has no refresh token to present.
	#[error("Stored session is missing a refresh token.")]
	MissingRefreshToken,
	/// Request path cannot be joined onto the descriptor's REST base URL.
	#[error("Request path `{path}` cannot be joined onto the REST base URL.")]
	InvalidRequestPath {
		/// The offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	RequestEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded its configured time limit.
	#[error("Request timed out before the backend responded.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
