//! Bearer token injection.

// crates.io
use http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	credential::Credential,
	pipeline::{Context, Policy, PolicyFuture, Request},
};

/// Sets `Authorization: Bearer <token>` from the current credential value and forwards.
///
/// The token is read once per send and never cached, so a refresh becomes visible to the very
/// next request. Any existing `Authorization` header is replaced.
pub struct AuthenticationPolicy {
	credential: Credential,
	next: Arc<dyn Policy>,
}
impl AuthenticationPolicy {
	/// Wraps `next` with bearer authentication from `credential`.
	pub fn new(credential: impl Into<Credential>, next: Arc<dyn Policy>) -> Self {
		Self { credential: credential.into(), next }
	}
}
impl Policy for AuthenticationPolicy {
	fn send<'a>(&'a self, ctx: &'a Context, mut request: Request) -> PolicyFuture<'a> {
		Box::pin(async move {
			request.headers.insert(AUTHORIZATION, self.credential.authorization()?);

			self.next.send(ctx, request).await
		})
	}
}
impl Debug for AuthenticationPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticationPolicy").field("credential", &self.credential).finish()
	}
}
