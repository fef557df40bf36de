//! Demonstrates acquiring a client-credentials token through an authentication context and
//! sending an authenticated request with the default policy chain.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::OffsetDateTime;
use url::Url;
// self
use oauth2_pipeline::{
	authority::AuthenticationContext,
	credential::Credential,
	http::Method,
	pipeline::{Context, Pipeline, Request},
	policy,
	reqwest::Client,
	transport::ReqwestSender,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expires_on = OffsetDateTime::now_utc().unix_timestamp() + 3_600;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"access_token\":\"demo-access\",\"expires_on\":\"{expires_on}\"}}"));
		})
		.await;
	let resource_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/subscriptions").header("authorization", "Bearer demo-access");
			then.status(200).body("[]");
		})
		.await;
	let sender = ReqwestSender::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let context = AuthenticationContext::builder(server.base_url())
		.pipeline(Pipeline::new(Vec::new(), Arc::new(sender.clone())))
		.tenant_id("contoso")
		.build()?;
	let ctx = Context::new();
	let token = context
		.acquire_token_from_client_credentials(&ctx, "demo-client", "super-secret", "demo-resource")
		.await?;

	println!("Token expires at {}.", token.expires_at());

	let pipeline =
		policy::default_pipeline_with_sender(Credential::token(token.value()), Arc::new(sender));
	let response = pipeline
		.send(&ctx, Request::new(Method::GET, Url::parse(&server.url("/subscriptions"))?))
		.await?;

	println!("Resource answered {} with {:?}.", response.status, response.text());

	token_mock.assert_async().await;
	resource_mock.assert_async().await;

	Ok(())
}
