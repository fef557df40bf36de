// crates.io
use httpmock::prelude::*;
// self
use oauth2_pipeline::{
	_preludet::*,
	authority::AuthenticationContext,
	error::DecodeError,
	pipeline::{Context, PolicyFactory},
};

const CLIENT_ID: &str = "client-credentials";
const CLIENT_SECRET: &str = "secret-credentials";
const RESOURCE: &str = "https://management.example.com/";

fn expires_on(offset: Duration) -> i64 {
	(OffsetDateTime::now_utc() + offset).unix_timestamp()
}

#[tokio::test]
async fn acquire_posts_form_and_decodes_token() {
	let server = MockServer::start_async().await;
	let context = build_test_context(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/tenant/oauth2/token")
				.query_param("api-version", "1.0")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET)
				.form_urlencoded_tuple("resource", RESOURCE);
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"tok\",\"expires_in\":\"3600\",\"expires_on\":\"{}\",\"token_type\":\"Bearer\"}}",
				expires_on(Duration::hours(1))
			));
		})
		.await;
	let token = context
		.acquire_token_from_client_credentials(&Context::new(), CLIENT_ID, CLIENT_SECRET, RESOURCE)
		.await
		.expect("Client credentials acquisition should succeed.");

	assert_eq!(token.value(), "tok");
	assert_eq!(token.token_type(), Some("Bearer"));
	assert!(!token.is_expired());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn acquire_maps_rejection_to_authentication_error() {
	let server = MockServer::start_async().await;
	let context = build_test_context(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tenant/oauth2/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = context
		.acquire_token_from_client_credentials(&Context::new(), CLIENT_ID, "wrong", RESOURCE)
		.await
		.expect_err("Rejected credentials should fail.");
	let Error::Authentication { status, body } = err else {
		panic!("Expected an authentication error, got {err:?}.");
	};

	assert_eq!(status, 401);
	assert_eq!(body.as_deref(), Some("{\"error\":\"invalid_client\"}"));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn acquire_rejects_malformed_body() {
	let server = MockServer::start_async().await;
	let context = build_test_context(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/tenant/oauth2/token");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":");
		})
		.await;

	let err = context
		.acquire_token_from_client_credentials(&Context::new(), CLIENT_ID, CLIENT_SECRET, RESOURCE)
		.await
		.expect_err("Truncated JSON should fail.");

	assert!(matches!(err, Error::Decode(DecodeError::Json { .. })));
}

#[tokio::test]
async fn acquire_rejects_unparsable_expiry() {
	let server = MockServer::start_async().await;
	let context = build_test_context(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/tenant/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"tok\",\"expires_on\":\"tomorrow\"}");
		})
		.await;

	let err = context
		.acquire_token_from_client_credentials(&Context::new(), CLIENT_ID, CLIENT_SECRET, RESOURCE)
		.await
		.expect_err("Unparsable expires_on should reject the token.");

	assert!(matches!(err, Error::Decode(DecodeError::InvalidExpiresOn { .. })));
}

#[tokio::test]
async fn retries_come_from_the_pipeline_not_the_grant() {
	let server = MockServer::start_async().await;
	let retry: Arc<dyn PolicyFactory> = Arc::new(fast_retry_options());
	let context = AuthenticationContext::builder(server.base_url())
		.pipeline(build_test_pipeline(vec![retry]))
		.tenant_id("tenant")
		.build()
		.expect("Mock authority should resolve.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tenant/oauth2/token");
			then.status(503);
		})
		.await;
	let err = context
		.acquire_token_from_client_credentials(&Context::new(), CLIENT_ID, CLIENT_SECRET, RESOURCE)
		.await
		.expect_err("Unavailable endpoint should fail after retries.");

	assert!(matches!(err, Error::Authentication { status: 503, body: None }));

	mock.assert_calls_async(4).await;
}

#[tokio::test]
async fn bare_pipeline_does_not_retry() {
	let server = MockServer::start_async().await;
	let context = build_test_context(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tenant/oauth2/token");
			then.status(503);
		})
		.await;
	let err = context
		.acquire_token_from_client_credentials(&Context::new(), CLIENT_ID, CLIENT_SECRET, RESOURCE)
		.await
		.expect_err("Unavailable endpoint should fail.");

	assert!(matches!(err, Error::Authentication { status: 503, .. }));

	mock.assert_calls_async(1).await;
}
