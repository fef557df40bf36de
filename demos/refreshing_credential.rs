//! Demonstrates a credential that refreshes itself from a client-credentials endpoint.
//!
//! The mock endpoint issues a token that lives for ten seconds. A nine-second margin would leave
//! only one second between refreshes, so the refresher falls back to half the remaining
//! lifetime and schedules the next run about five seconds out.

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use oauth2_pipeline::{
	authority::AuthenticationContext,
	credential::RefreshingTokenCredential,
	http::Method,
	pipeline::{Context, Pipeline, Request},
	policy,
	transport::ReqwestSender,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expires_on = OffsetDateTime::now_utc().unix_timestamp() + 10;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"access_token\":\"rotating\",\"expires_on\":\"{expires_on}\"}}"));
		})
		.await;
	let resource_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/items");
			then.status(200);
		})
		.await;
	let sender = Arc::new(ReqwestSender::new()?);
	let context = AuthenticationContext::builder(server.base_url())
		.pipeline(Pipeline::new(Vec::new(), sender.clone()))
		.tenant_id("contoso")
		.build()?;
	let refresher = context
		.client_credentials_refresher("demo-client", "super-secret", "demo-resource")
		.with_margin(Duration::seconds(9));
	let credential = Arc::new(RefreshingTokenCredential::new("", refresher).await?);
	let pipeline = policy::default_pipeline_with_sender(credential.clone(), sender);
	let url = Url::parse(&server.url("/items"))?;

	for _ in 0..3 {
		let response = pipeline.send(&Context::new(), Request::new(Method::GET, url.clone())).await?;

		println!("Request answered {}; refreshing: {}.", response.status, credential.is_refreshing());

		tokio::time::sleep(StdDuration::from_millis(1_200)).await;
	}

	credential.stop_refresh();

	println!("Token endpoint calls: {}.", token_mock.calls_async().await);

	resource_mock.assert_calls_async(3).await;

	Ok(())
}
