//! Credentials that authenticate outbound requests.
//!
//! [`TokenCredential`] holds the current bearer token in a lock-free slot; readers never block
//! and always observe a complete value. [`RefreshingTokenCredential`] layers a background refresh
//! schedule on top. Both plug into a [`Pipeline`](crate::pipeline::Pipeline) through the
//! [`Credential`] enum, which is a [`PolicyFactory`].

pub mod refresh;

pub use refresh::{RefreshFuture, RefreshingTokenCredential, TokenRefresher};

// crates.io
use arc_swap::ArcSwap;
use http::HeaderValue;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	pipeline::{Policy, PolicyFactory},
	policy::AuthenticationPolicy,
};

/// Bearer token holder shared between writers (refreshers) and readers (policies).
///
/// Clones share the same slot. `set_token` replaces the whole value atomically; concurrent
/// readers see either the previous or the new token, never a mix (last writer wins).
#[derive(Clone)]
pub struct TokenCredential {
	slot: Arc<ArcSwap<TokenSecret>>,
}
impl TokenCredential {
	/// Creates a credential holding `token`.
	pub fn new(token: impl Into<String>) -> Self {
		Self { slot: Arc::new(ArcSwap::from_pointee(TokenSecret::new(token))) }
	}

	/// Returns the current token.
	pub fn token(&self) -> TokenSecret {
		TokenSecret::clone(&self.slot.load())
	}

	/// Replaces the current token; visible to every subsequent read.
	pub fn set_token(&self, token: impl Into<String>) {
		self.slot.store(Arc::new(TokenSecret::new(token)));
	}

	/// Returns `true` when both handles share one slot.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.slot, &other.slot)
	}
}
impl Debug for TokenCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCredential").field("token", &"<redacted>").finish()
	}
}

/// Credential kinds that can be inserted into a pipeline.
#[derive(Clone, Debug)]
pub enum Credential {
	/// Static token set by the caller.
	Token(TokenCredential),
	/// Token kept fresh by a background refresh schedule.
	Refreshing(Arc<RefreshingTokenCredential>),
	/// Slot holding a complete `Authorization` value that already carries its scheme.
	Header(TokenCredential),
}
impl Credential {
	/// Wraps a static bearer token.
	pub fn token(token: impl Into<String>) -> Self {
		Self::Token(TokenCredential::new(token))
	}

	/// Wraps a complete header value such as `Basic dXNlcjpwYXNz`; sent verbatim.
	pub fn header(value: impl Into<String>) -> Self {
		Self::Header(TokenCredential::new(value))
	}

	/// Returns the token slot backing this credential.
	pub fn token_credential(&self) -> &TokenCredential {
		match self {
			Self::Token(credential) | Self::Header(credential) => credential,
			Self::Refreshing(credential) => credential.credential(),
		}
	}

	/// Builds the full `Authorization` header value for the current token.
	pub fn authorization(&self) -> Result<HeaderValue> {
		let token = self.token_credential().token();
		let raw = match self {
			Self::Header(_) => token.expose().to_owned(),
			Self::Token(_) | Self::Refreshing(_) => format!("Bearer {}", token.expose()),
		};
		let mut value = HeaderValue::try_from(raw)
			.map_err(|_| ConfigError::InvalidHeaderValue { name: "authorization" })?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl From<TokenCredential> for Credential {
	fn from(credential: TokenCredential) -> Self {
		Self::Token(credential)
	}
}
impl From<RefreshingTokenCredential> for Credential {
	fn from(credential: RefreshingTokenCredential) -> Self {
		Self::Refreshing(Arc::new(credential))
	}
}
impl From<Arc<RefreshingTokenCredential>> for Credential {
	fn from(credential: Arc<RefreshingTokenCredential>) -> Self {
		Self::Refreshing(credential)
	}
}
impl PolicyFactory for Credential {
	fn create(&self, next: Arc<dyn Policy>) -> Arc<dyn Policy> {
		Arc::new(AuthenticationPolicy::new(self.clone(), next))
	}
}
