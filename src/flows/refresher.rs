//! Scheduled client-credentials refresh for [`RefreshingTokenCredential`].
//!
//! [`ClientCredentialsRefresher`] implements [`TokenRefresher`]: each run acquires a token,
//! stores it in the credential, and asks to be invoked again `margin` before the new token
//! expires. Failed runs keep the previous token and retry after `retry_delay`.
//!
//! [`RefreshingTokenCredential`]: crate::credential::RefreshingTokenCredential

// self
use crate::{
	_prelude::*,
	auth::Token,
	credential::{RefreshFuture, TokenCredential, TokenRefresher},
	flows::ClientCredentials,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pipeline::{Context, Pipeline},
};

/// Default lead time before expiry at which the next refresh runs.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::minutes(5);
/// Default delay before retrying a failed refresh.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::seconds(30);
/// Default upper bound for one acquisition attempt.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(60);

const MIN_DELAY: Duration = Duration::seconds(1);

/// Refresher that keeps a credential supplied with client-credentials tokens.
#[derive(Clone, Debug)]
pub struct ClientCredentialsRefresher {
	grant: ClientCredentials,
	pipeline: Pipeline,
	margin: Duration,
	retry_delay: Duration,
	timeout: Duration,
}
impl ClientCredentialsRefresher {
	/// Refreshes through `pipeline` with the default margin, retry delay, and timeout.
	pub fn new(grant: ClientCredentials, pipeline: Pipeline) -> Self {
		Self {
			grant,
			pipeline,
			margin: DEFAULT_REFRESH_MARGIN,
			retry_delay: DEFAULT_RETRY_DELAY,
			timeout: DEFAULT_REFRESH_TIMEOUT,
		}
	}

	/// Overrides how long before expiry the next refresh runs.
	pub fn with_margin(mut self, margin: Duration) -> Self {
		self.margin = margin;

		self
	}

	/// Overrides the delay before retrying a failed refresh.
	pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
		self.retry_delay = retry_delay;

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Acquires one token, stores it in `credential`, and returns the delay until the next run.
	pub async fn refresh_once(&self, credential: &TokenCredential) -> Result<Duration> {
		let ctx = Context::new().with_timeout(self.timeout);
		let token = self.grant.acquire(&ctx, &self.pipeline).await?;

		credential.set_token(token.value());

		Ok(self.next_delay(&token, OffsetDateTime::now_utc()))
	}

	/// Delay until `margin` before expiry; short-lived tokens refresh at half their lifetime.
	fn next_delay(&self, token: &Token, now: OffsetDateTime) -> Duration {
		let remaining = token.expires_in_at(now);

		(remaining - self.margin).max(remaining / 2).max(MIN_DELAY)
	}
}
impl TokenRefresher for ClientCredentialsRefresher {
	fn refresh(&self, credential: TokenCredential) -> RefreshFuture {
		const KIND: FlowKind = FlowKind::Refresh;

		let this = self.clone();

		Box::pin(async move {
			let span = FlowSpan::new(KIND, "client_credentials_refresh");

			match span.instrument(this.refresh_once(&credential)).await {
				Ok(delay) => {
					obs::record_flow_outcome(KIND, FlowOutcome::Success);

					delay
				},
				Err(e) => {
					obs::record_flow_outcome(KIND, FlowOutcome::Failure);
					obs::warn_flow(KIND, "client_credentials_refresh", &e);

					this.retry_delay
				},
			}
		})
	}
}
