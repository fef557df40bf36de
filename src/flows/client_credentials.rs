//! OAuth 2.0 Client Credentials grant.
//!
//! [`ClientCredentials`] posts a form-encoded `client_credentials` grant to a resolved token
//! endpoint through the caller's [`Pipeline`] and decodes the JSON body into a [`Token`]. Any
//! status other than `200 OK` is reported as [`Error::Authentication`]; nothing is retried here,
//! so retries only happen when the pipeline itself carries a retry policy.

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::{AccessTokenResponse, Token, TokenSecret},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pipeline::{Context, Pipeline, Request},
};

const GRANT_TYPE: &str = "client_credentials";

/// One client-credentials exchange against a token endpoint.
#[derive(Clone, Debug)]
pub struct ClientCredentials {
	endpoint: Url,
	client_id: String,
	client_secret: TokenSecret,
	resource: String,
}
impl ClientCredentials {
	/// Describes an exchange for `resource` on behalf of `client_id`.
	pub fn new(
		endpoint: Url,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		resource: impl Into<String>,
	) -> Self {
		Self {
			endpoint,
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			resource: resource.into(),
		}
	}

	/// Token endpoint the grant is posted to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Client identifier sent with the grant.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Resource the token is requested for.
	pub fn resource(&self) -> &str {
		&self.resource
	}

	/// Builds the form-encoded token request; fields are emitted in key order.
	pub fn request(&self) -> Request {
		Request::form(
			self.endpoint.clone(),
			[
				("client_id", self.client_id.as_str()),
				("client_secret", self.client_secret.expose()),
				("grant_type", GRANT_TYPE),
				("resource", self.resource.as_str()),
			],
		)
	}

	/// Performs the exchange through `pipeline`.
	pub async fn acquire(&self, ctx: &Context, pipeline: &Pipeline) -> Result<Token> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "acquire");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = pipeline.send(ctx, self.request()).await?;

				if response.status != StatusCode::OK {
					return Err(Error::Authentication {
						status: response.status.as_u16(),
						body: response.text(),
					});
				}

				let payload = response.json::<AccessTokenResponse>()?;

				Ok(Token::try_from(payload)?)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::settled(result.is_ok()));

		result
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{Method, header::CONTENT_TYPE};
	// self
	use super::*;
	use crate::{
		error::DecodeError,
		pipeline::{Policy, PolicyFuture, Response},
	};

	struct Reply {
		status: StatusCode,
		body: &'static str,
	}
	impl Policy for Reply {
		fn send<'a>(&'a self, _ctx: &'a Context, _request: Request) -> PolicyFuture<'a> {
			Box::pin(async move { Ok(Response::new(self.status, self.body)) })
		}
	}

	fn grant() -> ClientCredentials {
		ClientCredentials::new(
			Url::parse("https://login.example.com/tenant/oauth2/token?api-version=1.0")
				.expect("Endpoint fixture should parse."),
			"app",
			"s3cr3t&",
			"https://management.example.com/",
		)
	}

	fn pipeline(status: StatusCode, body: &'static str) -> Pipeline {
		Pipeline::new(Vec::new(), Arc::new(Reply { status, body }))
	}

	#[test]
	fn request_is_a_sorted_form_post() {
		let request = grant().request();

		assert_eq!(request.method, Method::POST);
		assert_eq!(request.url.query(), Some("api-version=1.0"));
		assert_eq!(
			request.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some("application/x-www-form-urlencoded")
		);
		assert_eq!(
			String::from_utf8(request.body).expect("Form body should be UTF-8."),
			"client_id=app&client_secret=s3cr3t%26&grant_type=client_credentials&resource=https%3A%2F%2Fmanagement.example.com%2F"
		);
	}

	#[tokio::test]
	async fn non_ok_status_is_an_authentication_error() {
		let err = grant()
			.acquire(&Context::new(), &pipeline(StatusCode::CREATED, "{}"))
			.await
			.expect_err("Only 200 is accepted.");

		assert!(matches!(err, Error::Authentication { status: 201, .. }));
	}

	#[tokio::test]
	async fn malformed_json_is_a_decode_error() {
		let err = grant()
			.acquire(&Context::new(), &pipeline(StatusCode::OK, "{not json"))
			.await
			.expect_err("Malformed body must not produce a token.");

		assert!(matches!(err, Error::Decode(DecodeError::Json { .. })));
	}

	#[tokio::test]
	async fn missing_expiry_rejects_the_token() {
		let err = grant()
			.acquire(&Context::new(), &pipeline(StatusCode::OK, r#"{"access_token":"tok"}"#))
			.await
			.expect_err("Tokens without expires_on are rejected.");

		assert!(matches!(err, Error::Decode(DecodeError::MissingExpiresOn)));
	}

	#[test]
	fn debug_output_redacts_secret() {
		assert!(!format!("{:?}", grant()).contains("s3cr3t"));
	}
}
