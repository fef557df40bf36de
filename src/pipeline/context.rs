//! Per-call cancellation and deadline carried through every policy.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::{self as tokio_time, Instant};
use tokio_util::sync::CancellationToken;
// self
use crate::_prelude::*;

/// Cancellation scope for one or more pipeline calls.
///
/// Cloning a context shares its cancellation token, so cancelling any clone aborts every call
/// running under it. [`Context::child`] derives a scope that is cancelled together with its
/// parent but can also be cancelled on its own.
#[derive(Clone, Debug, Default)]
pub struct Context {
	cancel: CancellationToken,
	deadline: Option<Instant>,
}
impl Context {
	/// Creates a context with no deadline that is cancelled only explicitly.
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps an existing cancellation token.
	pub fn with_cancellation(token: CancellationToken) -> Self {
		Self { cancel: token, deadline: None }
	}

	/// Sets a deadline `timeout` from now; the earlier of this and any existing deadline wins.
	///
	/// A timeout too large to represent as an instant adds no deadline.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		let Some(deadline) = Instant::now().checked_add(std_duration(timeout)) else {
			return self;
		};

		self.deadline = Some(match self.deadline {
			Some(current) if current < deadline => current,
			_ => deadline,
		});

		self
	}

	/// Derives a child scope that inherits this context's deadline.
	pub fn child(&self) -> Self {
		Self { cancel: self.cancel.child_token(), deadline: self.deadline }
	}

	/// Cancels every call running under this context (and its children).
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Returns `true` once the context has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Deadline of this context, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Fails fast when the context is already cancelled or past its deadline.
	pub fn check(&self) -> Result<()> {
		if self.is_cancelled() {
			return Err(Error::Cancelled);
		}
		if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
			return Err(Error::DeadlineExceeded);
		}

		Ok(())
	}

	/// Drives `fut` to completion unless the context is cancelled or its deadline passes first.
	///
	/// The future is dropped on cancellation, which aborts any I/O it owns.
	pub async fn run<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		self.check()?;

		let deadline = async {
			match self.deadline {
				Some(deadline) => tokio_time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
			_ = deadline => Err(Error::DeadlineExceeded),
			output = fut => output,
		}
	}

	/// Sleeps for `duration`, returning early with an error on cancellation.
	pub async fn sleep(&self, duration: Duration) -> Result<()> {
		self.run(async {
			tokio_time::sleep(std_duration(duration)).await;

			Ok(())
		})
		.await
	}
}

/// Converts a signed duration into a std duration, clamping negatives to zero.
pub(crate) fn std_duration(duration: Duration) -> StdDuration {
	if duration.is_positive() { duration.unsigned_abs() } else { StdDuration::ZERO }
}
