//! Terminal transport policies.
//!
//! The pipeline ends in a [`Policy`] that performs the actual HTTP exchange. [`ReqwestSender`]
//! is the built-in implementation; any other transport plugs in by implementing [`Policy`] and
//! passing it to [`Pipeline::new`](crate::pipeline::Pipeline::new) as the sender.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
#[cfg(feature = "reqwest")]
use crate::{
	_prelude::*,
	error::TransportError,
	pipeline::{Context, Policy, PolicyFuture, Request, Response},
};

/// Thin wrapper around [`ReqwestClient`] that sends pipeline requests.
///
/// Redirects are not followed: token endpoints answer directly, and a redirect that changes
/// origin must not receive the `Authorization` header stamped upstream. Configure any custom
/// [`ReqwestClient`] passed to [`ReqwestSender::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestSender(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestSender {
	/// Builds a sender over a client that never follows redirects.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn execute(&self, request: Request) -> Result<Response> {
		let Request { method, url, headers, body } = request;
		let response = self
			.0
			.request(method, url)
			.headers(headers)
			.body(body)
			.send()
			.await
			.map_err(TransportError::from)?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

		Ok(Response { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl Policy for ReqwestSender {
	fn send<'a>(&'a self, ctx: &'a Context, request: Request) -> PolicyFuture<'a> {
		Box::pin(ctx.run(self.execute(request)))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestSender {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestSender {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestSender {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ReqwestSender").field(&self.0).finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use http::Method;
	// self
	use super::*;

	#[tokio::test]
	async fn unreachable_host_is_a_transport_error() {
		let sender = ReqwestSender::new().expect("Default reqwest client should build.");
		let url = Url::parse("http://127.0.0.1:9/").expect("URL should parse.");
		let err = sender
			.send(&Context::new(), Request::new(Method::GET, url))
			.await
			.expect_err("Discard port should refuse the connection.");

		assert!(matches!(err, Error::Transport(_)));
	}

	#[tokio::test]
	async fn cancelled_context_skips_the_network() {
		let sender = ReqwestSender::new().expect("Default reqwest client should build.");
		let url = Url::parse("http://127.0.0.1:9/").expect("URL should parse.");
		let ctx = Context::new();

		ctx.cancel();

		let err = sender
			.send(&ctx, Request::new(Method::GET, url))
			.await
			.expect_err("Cancelled context should fail before sending.");

		assert!(matches!(err, Error::Cancelled));
	}
}
