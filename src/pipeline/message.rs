//! Request and response values that flow through the pipeline.

// crates.io
use http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{CONTENT_TYPE, HeaderName},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Outbound HTTP request.
///
/// Requests are plain owned values so policies can mutate them before delegating and retry
/// policies can replay them by cloning.
#[derive(Clone, Debug)]
pub struct Request {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Vec<u8>,
}
impl Request {
	/// Creates a request with no headers and an empty body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Creates a `POST` carrying a form-encoded body.
	///
	/// Fields are written in the order the iterator yields them.
	pub fn form<'a, I>(url: Url, fields: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(fields).finish();
		let mut request = Self::new(Method::POST, url);

		request.headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
		request.body = body.into_bytes();

		request
	}

	/// Sets (replacing) a header from a string value.
	pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self> {
		let header = HeaderName::from_bytes(name.as_bytes())
			.map_err(|_| ConfigError::InvalidHeaderValue { name })?;
		let value = HeaderValue::from_str(value)
			.map_err(|_| ConfigError::InvalidHeaderValue { name })?;

		self.headers.insert(header, value);

		Ok(self)
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}
}

/// Inbound HTTP response with its body fully buffered.
#[derive(Clone, Debug)]
pub struct Response {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl Response {
	/// Creates a response with no headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source })
	}

	/// Body as lossy UTF-8, or `None` when empty.
	pub fn text(&self) -> Option<String> {
		if self.body.is_empty() {
			None
		} else {
			Some(String::from_utf8_lossy(&self.body).into_owned())
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn form_request_encodes_fields_in_order() {
		let url = Url::parse("https://example.com/token").expect("Fixture URL should parse.");
		let request =
			Request::form(url, [("grant_type", "client_credentials"), ("resource", "https://r/ x")]);

		assert_eq!(request.method, Method::POST);
		assert_eq!(
			request.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some(FORM_CONTENT_TYPE)
		);
		assert_eq!(
			String::from_utf8(request.body).expect("Form body should be UTF-8."),
			"grant_type=client_credentials&resource=https%3A%2F%2Fr%2F+x"
		);
	}

	#[test]
	fn with_header_rejects_control_bytes() {
		let url = Url::parse("https://example.com").expect("Fixture URL should parse.");
		let err = Request::new(Method::GET, url)
			.with_header("x-trace", "bad\nvalue")
			.expect_err("Newlines are not valid header bytes.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeaderValue { name: "x-trace" })));
	}

	#[test]
	fn json_errors_carry_the_failing_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Body {
			nested: Nested,
		}
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Nested {
			count: u32,
		}

		let response = Response::new(StatusCode::OK, r#"{"nested":{"count":"x"}}"#);
		let err = response.json::<Body>().expect_err("String is not a u32.");
		let DecodeError::Json { source } = err else { panic!("Expected a JSON decode error.") };

		assert_eq!(source.path().to_string(), "nested.count");
	}
}
