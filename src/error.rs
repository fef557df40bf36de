//! Crate-level error types shared by the pipeline, credentials, and token flows.

// std
use std::num::ParseIntError;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem raised while wiring contexts, credentials, or pipelines.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint answered with a non-200 status.
	#[error("Token endpoint rejected the request with HTTP status {status}.")]
	Authentication {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Response body, when the endpoint supplied one.
		body: Option<String>,
	},
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The request context was cancelled before a response arrived.
	#[error("Request was cancelled.")]
	Cancelled,
	/// The request context deadline elapsed before a response arrived.
	#[error("Request deadline exceeded.")]
	DeadlineExceeded,
}
impl Error {
	/// Returns `true` for errors caused by context cancellation or deadline expiry.
	pub fn is_cancellation(&self) -> bool {
		matches!(self, Self::Cancelled | Self::DeadlineExceeded)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Authority URL cannot be parsed.
	#[error("Authority URL is invalid.")]
	InvalidAuthority {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint could not be resolved against the authority.
	#[error("Token endpoint could not be resolved from the authority.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Authentication context was built without a pipeline.
	#[error("Authentication context requires a pipeline.")]
	MissingPipeline,
	/// Refreshing credentials need a tokio runtime to arm their timer.
	#[error("A tokio runtime is required to schedule credential refreshes.")]
	MissingRuntime,
	/// A header value contains bytes that are not allowed on the wire.
	#[error("Header `{name}` contains an invalid value.")]
	InvalidHeaderValue {
		/// Header name being written.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response body is not the expected JSON document.
	#[error("Response body is malformed JSON.")]
	Json {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token response omitted `expires_on`.
	#[error("Token response is missing expires_on.")]
	MissingExpiresOn,
	/// Token response carried an `expires_on` that is not a decimal epoch.
	#[error("Token response expires_on `{value}` is not a Unix timestamp.")]
	InvalidExpiresOn {
		/// Raw value returned by the server.
		value: String,
		/// Integer parsing failure.
		#[source]
		source: ParseIntError,
	},
	/// Token response carried an `expires_on` outside the representable range.
	#[error("Token response expires_on `{value}` is out of range.")]
	ExpiresOnOutOfRange {
		/// Raw value returned by the server.
		value: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cancellation_errors_are_flagged() {
		assert!(Error::Cancelled.is_cancellation());
		assert!(Error::DeadlineExceeded.is_cancellation());
		assert!(!Error::Authentication { status: 401, body: None }.is_cancellation());
		assert!(!Error::from(ConfigError::MissingPipeline).is_cancellation());
	}

	#[test]
	fn transport_error_keeps_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
		let err = Error::from(TransportError::network(io));
		let source = StdError::source(&err).expect("Transport error should expose its source.");

		assert!(source.to_string().contains("connection reset"));
	}

	#[test]
	fn authentication_error_mentions_status() {
		let err = Error::Authentication { status: 401, body: Some("denied".into()) };

		assert_eq!(err.to_string(), "Token endpoint rejected the request with HTTP status 401.");
	}
}
