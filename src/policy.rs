//! Built-in pipeline policies.
//!
//! - [`AuthenticationPolicy`] stamps the bearer token from a [`Credential`].
//! - [`UserAgentPolicy`] identifies the crate (and an optional caller prefix) on every request.
//! - [`RetryPolicy`] replays requests that failed with a transport error or a retryable status.
//!
//! [`default_pipeline`] wires all three in front of the reqwest sender.

pub mod auth;
pub mod retry;
pub mod user_agent;

pub use auth::AuthenticationPolicy;
pub use retry::{RetryOptions, RetryPolicy};
pub use user_agent::{UserAgent, UserAgentPolicy};

// self
use crate::{
	_prelude::*,
	credential::Credential,
	pipeline::{Pipeline, Policy, PolicyFactory},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestSender;

/// Factories of the default chain, outermost first: user agent, retry, credential.
pub fn default_policies(credential: impl Into<Credential>) -> Vec<Arc<dyn PolicyFactory>> {
	vec![
		Arc::new(UserAgent::default()),
		Arc::new(RetryOptions::default()),
		Arc::new(credential.into()),
	]
}

/// Builds the default chain in front of a caller-supplied sender.
pub fn default_pipeline_with_sender(
	credential: impl Into<Credential>,
	sender: Arc<dyn Policy>,
) -> Pipeline {
	Pipeline::new(default_policies(credential), sender)
}

/// Builds the default chain in front of a fresh [`ReqwestSender`].
#[cfg(feature = "reqwest")]
pub fn default_pipeline(credential: impl Into<Credential>) -> Result<Pipeline> {
	Ok(default_pipeline_with_sender(credential, Arc::new(ReqwestSender::new()?)))
}
