//! Authorization server addressing.
//!
//! An [`AuthenticationContext`] pairs an authority URL with the [`Pipeline`] used to reach it.
//! The token endpoint is resolved once, when the context is built, as
//! `<tenant>/oauth2/<endpoint>?api-version=<version>` relative to the authority.

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	error::ConfigError,
	flows::{ClientCredentials, ClientCredentialsRefresher},
	pipeline::{Context, Pipeline},
};

/// Public Azure AD authority.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";
/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "1.0";
/// Endpoint name used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "token";

/// Endpoint settings collected from [`AuthOption`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthoritySettings {
	/// Tenant path segment; empty targets the authority root.
	pub tenant_id: String,
	/// Endpoint name below `oauth2/`.
	pub endpoint: String,
	/// Value of the `api-version` query parameter.
	pub api_version: String,
}
impl AuthoritySettings {
	/// Applies `options` in order (later values win) and fills unset fields with defaults.
	pub fn from_options<I>(options: I) -> Self
	where
		I: IntoIterator<Item = AuthOption>,
	{
		let mut settings = Self::default();

		for option in options {
			option.apply(&mut settings);
		}

		if settings.api_version.is_empty() {
			settings.api_version = DEFAULT_API_VERSION.into();
		}
		if settings.endpoint.is_empty() {
			settings.endpoint = DEFAULT_ENDPOINT.into();
		}

		settings
	}

	/// Resolves the token endpoint against `authority`.
	pub fn resolve(&self, authority: &Url) -> Result<Url, ConfigError> {
		let reference =
			format!("{}/oauth2/{}?api-version={}", self.tenant_id, self.endpoint, self.api_version);

		authority.join(&reference).map_err(|source| ConfigError::InvalidEndpoint { source })
	}
}

/// Single configuration change applied to [`AuthoritySettings`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOption {
	/// Sets the `api-version` query parameter.
	ApiVersion(String),
	/// Sets the endpoint name below `oauth2/`.
	Endpoint(String),
	/// Sets the tenant path segment.
	TenantId(String),
}
impl AuthOption {
	/// Writes this option into `settings`.
	pub fn apply(self, settings: &mut AuthoritySettings) {
		match self {
			Self::ApiVersion(value) => settings.api_version = value,
			Self::Endpoint(value) => settings.endpoint = value,
			Self::TenantId(value) => settings.tenant_id = value,
		}
	}
}

/// Resolved token endpoint plus the pipeline used to call it.
#[derive(Clone, Debug)]
pub struct AuthenticationContext {
	authority: Url,
	settings: AuthoritySettings,
	token_endpoint: Url,
	pipeline: Pipeline,
}
impl AuthenticationContext {
	/// Parses `authority`, applies `options`, and resolves the token endpoint.
	pub fn new<I>(authority: &str, pipeline: Pipeline, options: I) -> Result<Self>
	where
		I: IntoIterator<Item = AuthOption>,
	{
		let authority =
			Url::parse(authority).map_err(|source| ConfigError::InvalidAuthority { source })?;
		let settings = AuthoritySettings::from_options(options);
		let token_endpoint = settings.resolve(&authority)?;

		Ok(Self { authority, settings, token_endpoint, pipeline })
	}

	/// Starts a builder for `authority`.
	pub fn builder(authority: impl Into<String>) -> AuthenticationContextBuilder {
		AuthenticationContextBuilder::new(authority)
	}

	/// Authority URL as parsed.
	pub fn authority(&self) -> &Url {
		&self.authority
	}

	/// Effective settings, defaults included.
	pub fn settings(&self) -> &AuthoritySettings {
		&self.settings
	}

	/// Resolved token endpoint.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Pipeline used for token requests.
	pub fn pipeline(&self) -> &Pipeline {
		&self.pipeline
	}

	/// Describes a client-credentials exchange against this context's endpoint.
	pub fn client_credentials(
		&self,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		resource: impl Into<String>,
	) -> ClientCredentials {
		ClientCredentials::new(self.token_endpoint.clone(), client_id, client_secret, resource)
	}

	/// Acquires a token for `resource` with the client-credentials grant.
	pub async fn acquire_token_from_client_credentials(
		&self,
		ctx: &Context,
		client_id: &str,
		client_secret: &str,
		resource: &str,
	) -> Result<Token> {
		self.client_credentials(client_id, client_secret, resource)
			.acquire(ctx, &self.pipeline)
			.await
	}

	/// Builds a refresher that keeps a credential supplied with client-credentials tokens.
	pub fn client_credentials_refresher(
		&self,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		resource: impl Into<String>,
	) -> ClientCredentialsRefresher {
		ClientCredentialsRefresher::new(
			self.client_credentials(client_id, client_secret, resource),
			self.pipeline.clone(),
		)
	}
}

/// Builder for [`AuthenticationContext`].
#[derive(Clone, Debug)]
pub struct AuthenticationContextBuilder {
	authority: String,
	pipeline: Option<Pipeline>,
	options: Vec<AuthOption>,
}
impl AuthenticationContextBuilder {
	/// Starts a builder for `authority`.
	pub fn new(authority: impl Into<String>) -> Self {
		Self { authority: authority.into(), pipeline: None, options: Vec::new() }
	}

	/// Sets the pipeline used for token requests. Required.
	pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
		self.pipeline = Some(pipeline);

		self
	}

	/// Appends a raw option.
	pub fn option(mut self, option: AuthOption) -> Self {
		self.options.push(option);

		self
	}

	/// Sets the tenant path segment.
	pub fn tenant_id(self, tenant_id: impl Into<String>) -> Self {
		self.option(AuthOption::TenantId(tenant_id.into()))
	}

	/// Sets the endpoint name below `oauth2/`.
	pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
		self.option(AuthOption::Endpoint(endpoint.into()))
	}

	/// Sets the `api-version` query parameter.
	pub fn api_version(self, api_version: impl Into<String>) -> Self {
		self.option(AuthOption::ApiVersion(api_version.into()))
	}

	/// Validates the configuration and resolves the token endpoint.
	pub fn build(self) -> Result<AuthenticationContext> {
		let pipeline = self.pipeline.ok_or(ConfigError::MissingPipeline)?;

		AuthenticationContext::new(&self.authority, pipeline, self.options)
	}
}
impl Default for AuthenticationContextBuilder {
	fn default() -> Self {
		Self::new(DEFAULT_AUTHORITY)
	}
}
