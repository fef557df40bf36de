//! `User-Agent` stamping.

// crates.io
use http::{HeaderValue, header::USER_AGENT};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	pipeline::{Context, Policy, PolicyFactory, PolicyFuture, Request},
};

/// Product token identifying this crate.
pub const USER_AGENT_PRODUCT: &str = concat!("oauth2-pipeline/", env!("CARGO_PKG_VERSION"));

/// Factory for [`UserAgentPolicy`], optionally prefixed with a caller product string.
#[derive(Clone, Debug)]
pub struct UserAgent {
	value: HeaderValue,
}
impl UserAgent {
	/// Uses `<prefix> oauth2-pipeline/<version>`; an empty prefix keeps the bare product token.
	pub fn with_prefix(prefix: &str) -> Result<Self> {
		let prefix = prefix.trim();

		if prefix.is_empty() {
			return Ok(Self::default());
		}

		let value = HeaderValue::try_from(format!("{prefix} {USER_AGENT_PRODUCT}"))
			.map_err(|_| ConfigError::InvalidHeaderValue { name: "user-agent" })?;

		Ok(Self { value })
	}

	/// Header value stamped on requests.
	pub fn value(&self) -> &HeaderValue {
		&self.value
	}
}
impl Default for UserAgent {
	fn default() -> Self {
		Self { value: HeaderValue::from_static(USER_AGENT_PRODUCT) }
	}
}
impl PolicyFactory for UserAgent {
	fn create(&self, next: Arc<dyn Policy>) -> Arc<dyn Policy> {
		Arc::new(UserAgentPolicy { value: self.value.clone(), next })
	}
}

/// Appends the configured product string to the request's `User-Agent`, setting it when absent.
pub struct UserAgentPolicy {
	value: HeaderValue,
	next: Arc<dyn Policy>,
}
impl UserAgentPolicy {
	fn stamp(&self, request: &mut Request) {
		let combined = request
			.headers
			.get(USER_AGENT)
			.and_then(|existing| existing.to_str().ok())
			.map(str::trim)
			.filter(|existing| !existing.is_empty())
			.and_then(|existing| {
				let ours = self.value.to_str().ok()?;

				if existing.contains(ours) {
					return None;
				}

				HeaderValue::try_from(format!("{existing} {ours}")).ok()
			});

		match combined {
			Some(value) => {
				request.headers.insert(USER_AGENT, value);
			},
			None if !request.headers.contains_key(USER_AGENT) => {
				request.headers.insert(USER_AGENT, self.value.clone());
			},
			None => {},
		}
	}
}
impl Policy for UserAgentPolicy {
	fn send<'a>(&'a self, ctx: &'a Context, mut request: Request) -> PolicyFuture<'a> {
		Box::pin(async move {
			self.stamp(&mut request);

			self.next.send(ctx, request).await
		})
	}
}
impl Debug for UserAgentPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserAgentPolicy").field("value", &self.value).finish()
	}
}
