//! Bounded exponential-backoff retries.
//!
//! Requests are replayed when the next stage fails with a transport error or answers with one of
//! the configured statuses. A `Retry-After` header (delta seconds or an RFC 2822 date) overrides
//! the computed backoff, capped at [`RetryOptions::max_delay`]. Cancellation and deadline errors
//! are returned immediately and the backoff sleep itself honors the request [`Context`].

// crates.io
use http::{HeaderMap, StatusCode, header::RETRY_AFTER};
use rand::Rng;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome},
	pipeline::{Context, Policy, PolicyFactory, PolicyFuture, Request, Response},
};

const JITTER: std::ops::Range<f64> = 0.8..1.2;

/// Retry configuration; also the [`PolicyFactory`] for [`RetryPolicy`].
#[derive(Clone, Debug)]
pub struct RetryOptions {
	/// Total attempts including the first one; `0` and `1` both disable retries.
	pub max_attempts: u32,
	/// Backoff before the second attempt; doubled for each further attempt.
	pub initial_delay: Duration,
	/// Upper bound for any single backoff, including `Retry-After` hints.
	pub max_delay: Duration,
	/// Response statuses that trigger a retry.
	pub statuses: Vec<StatusCode>,
}
impl RetryOptions {
	/// Returns `true` when `status` should be retried.
	pub fn is_retryable(&self, status: StatusCode) -> bool {
		self.statuses.contains(&status)
	}

	/// Jittered backoff to wait after failed attempt number `attempt` (1-based).
	pub fn backoff(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1).min(30);
		let base = self.initial_delay.saturating_mul(1_i32 << exponent);
		let jittered = base * rand::rng().random_range(JITTER);

		self.clamp(jittered)
	}

	fn clamp(&self, delay: Duration) -> Duration {
		delay.clamp(Duration::ZERO, self.max_delay.max(Duration::ZERO))
	}
}
impl Default for RetryOptions {
	fn default() -> Self {
		Self {
			max_attempts: 4,
			initial_delay: Duration::seconds(1),
			max_delay: Duration::seconds(30),
			statuses: vec![
				StatusCode::REQUEST_TIMEOUT,
				StatusCode::TOO_MANY_REQUESTS,
				StatusCode::INTERNAL_SERVER_ERROR,
				StatusCode::BAD_GATEWAY,
				StatusCode::SERVICE_UNAVAILABLE,
				StatusCode::GATEWAY_TIMEOUT,
			],
		}
	}
}
impl PolicyFactory for RetryOptions {
	fn create(&self, next: Arc<dyn Policy>) -> Arc<dyn Policy> {
		Arc::new(RetryPolicy { options: self.clone(), next })
	}
}

/// Policy that replays the request according to its [`RetryOptions`].
pub struct RetryPolicy {
	options: RetryOptions,
	next: Arc<dyn Policy>,
}
impl RetryPolicy {
	/// Wraps `next` with retries.
	pub fn new(options: RetryOptions, next: Arc<dyn Policy>) -> Self {
		Self { options, next }
	}

	/// Options in effect.
	pub fn options(&self) -> &RetryOptions {
		&self.options
	}

	/// Returns the delay before the next attempt, or `None` when `result` is final.
	fn retry_delay(&self, result: &Result<Response>, attempt: u32) -> Option<Duration> {
		if attempt >= self.options.max_attempts {
			return None;
		}

		match result {
			Ok(response) if self.options.is_retryable(response.status) => Some(
				parse_retry_after(&response.headers)
					.map(|hint| self.options.clamp(hint))
					.unwrap_or_else(|| self.options.backoff(attempt)),
			),
			Err(Error::Transport(_)) => Some(self.options.backoff(attempt)),
			_ => None,
		}
	}
}
impl Policy for RetryPolicy {
	fn send<'a>(&'a self, ctx: &'a Context, request: Request) -> PolicyFuture<'a> {
		const KIND: FlowKind = FlowKind::Retry;

		Box::pin(async move {
			let mut attempt = 1;

			loop {
				let result = self.next.send(ctx, request.clone()).await;
				let Some(delay) = self.retry_delay(&result, attempt) else {
					if attempt > 1 {
						obs::record_flow_outcome(KIND, FlowOutcome::settled(is_success(&result)));
					}

					return result;
				};

				match &result {
					Ok(response) => obs::warn_flow(KIND, "retryable_status", &response.status),
					Err(e) => obs::warn_flow(KIND, "transport", e),
				}

				obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
				ctx.sleep(delay).await?;

				attempt += 1;
			}
		})
	}
}
impl Debug for RetryPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetryPolicy").field("options", &self.options).finish()
	}
}

fn is_success(result: &Result<Response>) -> bool {
	result.as_ref().is_ok_and(|response| response.status.is_success())
}

/// Reads a `Retry-After` hint as a relative duration.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicU32, Ordering},
	};
	// crates.io
	use http::{HeaderValue, Method};
	// self
	use super::*;
	use crate::error::TransportError;

	/// Sender replaying a scripted list of outcomes; the last one repeats forever.
	struct Scripted {
		calls: AtomicU32,
		script: Mutex<VecDeque<fn() -> Result<Response>>>,
	}
	impl Scripted {
		fn new(script: Vec<fn() -> Result<Response>>) -> Arc<Self> {
			Arc::new(Self { calls: AtomicU32::new(0), script: Mutex::new(script.into()) })
		}

		fn calls(&self) -> u32 {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl Policy for Scripted {
		fn send<'a>(&'a self, _ctx: &'a Context, _request: Request) -> PolicyFuture<'a> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let step = {
				let mut script = self.script.lock();

				if script.len() > 1 { script.pop_front() } else { script.front().copied() }
			};

			Box::pin(async move {
				match step {
					Some(step) => step(),
					None => Ok(Response::new(StatusCode::OK, Vec::new())),
				}
			})
		}
	}

	fn ok() -> Result<Response> {
		Ok(Response::new(StatusCode::OK, "done"))
	}

	fn unavailable() -> Result<Response> {
		Ok(Response::new(StatusCode::SERVICE_UNAVAILABLE, Vec::new()))
	}

	fn unauthorized() -> Result<Response> {
		Ok(Response::new(StatusCode::UNAUTHORIZED, Vec::new()))
	}

	fn reset() -> Result<Response> {
		Err(TransportError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset)).into())
	}

	fn request() -> Request {
		Request::new(Method::GET, Url::parse("https://example.com/").expect("URL should parse."))
	}

	fn policy(sender: &Arc<Scripted>) -> Arc<dyn Policy> {
		RetryOptions::default().create(sender.clone())
	}

	#[tokio::test(start_paused = true)]
	async fn retries_retryable_status_until_success() {
		let sender = Scripted::new(vec![unavailable, reset, ok]);
		let response = policy(&sender)
			.send(&Context::new(), request())
			.await
			.expect("Third attempt should succeed.");

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(sender.calls(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn non_retryable_status_is_returned_as_is() {
		let sender = Scripted::new(vec![unauthorized]);
		let response =
			policy(&sender).send(&Context::new(), request()).await.expect("401 is a response.");

		assert_eq!(response.status, StatusCode::UNAUTHORIZED);
		assert_eq!(sender.calls(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn gives_up_after_max_attempts() {
		let sender = Scripted::new(vec![unavailable]);
		let response = policy(&sender)
			.send(&Context::new(), request())
			.await
			.expect("Exhausted retries return the last response.");

		assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(sender.calls(), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn cancellation_during_backoff_stops_retrying() {
		let sender = Scripted::new(vec![unavailable]);
		let policy = policy(&sender);
		let ctx = Context::new().with_timeout(Duration::milliseconds(500));
		let err = policy
			.send(&ctx, request())
			.await
			.expect_err("Deadline should interrupt the first backoff.");

		assert!(matches!(err, Error::DeadlineExceeded));
		assert_eq!(sender.calls(), 1);
	}

	#[test]
	fn backoff_grows_and_is_capped() {
		let options = RetryOptions::default();

		for attempt in 1..=3 {
			let delay = options.backoff(attempt);
			let base = Duration::seconds(1_i64 << (attempt - 1));

			assert!(delay >= base * 0.8 && delay <= base * 1.2, "attempt {attempt}: {delay}");
		}

		assert_eq!(options.backoff(20), Duration::seconds(30));
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(7)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn retry_after_hint_is_capped_by_max_delay() {
		let sender = Scripted::new(vec![ok]);
		let retry = RetryPolicy::new(RetryOptions::default(), sender);
		let mut response = Response::new(StatusCode::TOO_MANY_REQUESTS, Vec::new());

		response.headers.insert(RETRY_AFTER, HeaderValue::from_static("3600"));

		assert_eq!(retry.retry_delay(&Ok(response), 1), Some(Duration::seconds(30)));
	}
}
