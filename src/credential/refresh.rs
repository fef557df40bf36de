//! Self-refreshing token credential backed by a tokio timer task.
//!
//! The refresher is invoked once while the credential is constructed, then again after each
//! positive delay it returns. A zero or negative delay ends the schedule and leaves the
//! credential static. The schedule is released by [`RefreshingTokenCredential::stop_refresh`]
//! or by dropping the credential; the timer task never owns the credential handle itself, so the
//! last owner going away always stops it.

// crates.io
use tokio::{runtime::Handle, task::AbortHandle};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	credential::TokenCredential,
	error::ConfigError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pipeline::context,
};

/// Boxed future returned by [`TokenRefresher::refresh`].
pub type RefreshFuture = Pin<Box<dyn Future<Output = Duration> + Send>>;

/// Produces fresh tokens for a [`RefreshingTokenCredential`].
///
/// Implementations store the new token through [`TokenCredential::set_token`] and return the
/// delay until the next invocation; a zero or negative delay stops the schedule.
pub trait TokenRefresher
where
	Self: 'static + Send + Sync,
{
	/// Refreshes `credential` and returns the delay before the next refresh.
	fn refresh(&self, credential: TokenCredential) -> RefreshFuture;
}
impl<F, Fut> TokenRefresher for F
where
	F: 'static + Send + Sync + Fn(TokenCredential) -> Fut,
	Fut: 'static + Send + Future<Output = Duration>,
{
	fn refresh(&self, credential: TokenCredential) -> RefreshFuture {
		Box::pin(self(credential))
	}
}

/// Token credential that keeps itself fresh on a background timer.
///
/// Construct it inside a tokio runtime. Call [`stop_refresh`](Self::stop_refresh) (or drop the
/// credential) once it is no longer needed; until then the timer task stays scheduled.
pub struct RefreshingTokenCredential {
	credential: TokenCredential,
	schedule: Arc<Schedule>,
}
impl RefreshingTokenCredential {
	/// Creates the credential and runs the first refresh before returning.
	pub async fn new(initial: impl Into<String>, refresher: impl TokenRefresher) -> Result<Self> {
		let runtime = Handle::try_current().map_err(|_| ConfigError::MissingRuntime)?;
		let this = Self {
			credential: TokenCredential::new(initial),
			schedule: Arc::new(Schedule {
				refresher: Arc::new(refresher),
				runtime,
				state: Mutex::new(ScheduleState::default()),
			}),
		};

		this.start().await;

		Ok(this)
	}

	/// Token slot refreshed by this credential.
	pub fn credential(&self) -> &TokenCredential {
		&self.credential
	}

	/// Returns the current token.
	pub fn token(&self) -> TokenSecret {
		self.credential.token()
	}

	/// Replaces the current token.
	pub fn set_token(&self, token: impl Into<String>) {
		self.credential.set_token(token);
	}

	/// Returns `true` while a future refresh is scheduled.
	pub fn is_refreshing(&self) -> bool {
		let state = self.schedule.state.lock();

		!state.stopped && state.timer.is_some()
	}

	/// Stops the schedule and cancels any pending timer.
	///
	/// Idempotent and safe to call concurrently with itself and with a firing timer. A refresh
	/// that already started may still finish, but it never rearms the timer.
	pub fn stop_refresh(&self) {
		self.schedule.stop();
	}

	/// Resets a stopped schedule, refreshes immediately, and rearms from the returned delay.
	pub async fn restart_refresh(&self) {
		self.start().await;
	}

	async fn start(&self) {
		let generation = self.schedule.begin();
		let delay = self.schedule.refresher.refresh(self.credential.clone()).await;

		obs::record_refresh_delay(delay);
		self.schedule.arm(&self.credential, generation, delay);
	}
}
impl Drop for RefreshingTokenCredential {
	fn drop(&mut self) {
		self.schedule.stop();
	}
}
impl Debug for RefreshingTokenCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshingTokenCredential")
			.field("credential", &self.credential)
			.field("refreshing", &self.is_refreshing())
			.finish()
	}
}

struct Schedule {
	refresher: Arc<dyn TokenRefresher>,
	runtime: Handle,
	state: Mutex<ScheduleState>,
}
impl Schedule {
	/// Cancels any pending timer and opens a new generation.
	fn begin(&self) -> u64 {
		let mut state = self.state.lock();

		if let Some(timer) = state.timer.take() {
			timer.abort();
		}

		state.stopped = false;
		state.generation = state.generation.wrapping_add(1);

		state.generation
	}

	/// Returns `false` once the schedule was stopped or restarted after `generation` opened.
	///
	/// The refresher is never invoked while the state lock is held.
	fn is_current(&self, generation: u64) -> bool {
		let state = self.state.lock();

		!state.stopped && state.generation == generation
	}

	/// Spawns the timer task for `generation` when `delay` is positive.
	fn arm(self: &Arc<Self>, credential: &TokenCredential, generation: u64, delay: Duration) {
		let mut state = self.state.lock();

		if state.stopped || state.generation != generation || !delay.is_positive() {
			return;
		}

		let task = self.runtime.spawn(run(
			Arc::clone(self),
			credential.clone(),
			generation,
			delay,
		));

		state.timer = Some(task.abort_handle());
	}

	/// Decides whether the running timer task keeps going after a refresh.
	fn rearm(&self, generation: u64, delay: Duration) -> bool {
		let mut state = self.state.lock();

		if state.stopped || state.generation != generation {
			return false;
		}
		if !delay.is_positive() {
			state.timer = None;

			return false;
		}

		true
	}

	fn stop(&self) {
		let mut state = self.state.lock();

		state.stopped = true;

		if let Some(timer) = state.timer.take() {
			timer.abort();
		}
	}
}

#[derive(Default)]
struct ScheduleState {
	stopped: bool,
	generation: u64,
	timer: Option<AbortHandle>,
}

async fn run(
	schedule: Arc<Schedule>,
	credential: TokenCredential,
	generation: u64,
	mut delay: Duration,
) {
	const KIND: FlowKind = FlowKind::Refresh;

	loop {
		tokio::time::sleep(context::std_duration(delay)).await;

		if !schedule.is_current(generation) {
			return;
		}

		let refresh = schedule.refresher.refresh(credential.clone());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		delay = FlowSpan::new(KIND, "scheduled_refresh").instrument(refresh).await;

		obs::record_refresh_delay(delay);

		if !schedule.rearm(generation, delay) {
			return;
		}
	}
}
