//! Composable request/response policy chain.
//!
//! A [`Pipeline`] is an ordered chain of [`Policy`] nodes built once from a list of
//! [`PolicyFactory`] values plus a terminal sender. Each policy receives the request, may mutate
//! it, delegates to the next node, and may inspect the response on the way back:
//!
//! ```text
//! send ─▶ factory[0] ─▶ factory[1] ─▶ … ─▶ sender
//!      ◀─            ◀─            ◀─ … ◀─
//! ```
//!
//! The chain is immutable once built and the pipeline is cheap to clone, so one pipeline can be
//! shared by many concurrent callers.

pub mod context;
pub mod message;

pub use context::Context;
pub use message::{Request, Response};

// self
use crate::_prelude::*;

/// Boxed future returned by [`Policy::send`].
pub type PolicyFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + 'a + Send>>;

/// One stage of the pipeline.
///
/// A policy must either delegate to the next stage or return an error; silently dropping a
/// request is a contract violation.
pub trait Policy
where
	Self: 'static + Send + Sync,
{
	/// Processes `request` and produces the response (or error) for it.
	fn send<'a>(&'a self, ctx: &'a Context, request: Request) -> PolicyFuture<'a>;
}

/// Builds a [`Policy`] wrapped around the next stage of the chain.
pub trait PolicyFactory
where
	Self: Send + Sync,
{
	/// Creates the policy that forwards to `next`.
	fn create(&self, next: Arc<dyn Policy>) -> Arc<dyn Policy>;
}
impl<F> PolicyFactory for F
where
	F: Send + Sync + Fn(Arc<dyn Policy>) -> Arc<dyn Policy>,
{
	fn create(&self, next: Arc<dyn Policy>) -> Arc<dyn Policy> {
		self(next)
	}
}

/// Immutable chain of policies ending in a transport sender.
#[derive(Clone)]
pub struct Pipeline {
	head: Arc<dyn Policy>,
	len: usize,
}
impl Pipeline {
	/// Builds the chain; the first factory becomes the outermost policy and `sender` the
	/// innermost.
	pub fn new<I>(factories: I, sender: Arc<dyn Policy>) -> Self
	where
		I: IntoIterator<Item = Arc<dyn PolicyFactory>>,
	{
		let factories = factories.into_iter().collect::<Vec<_>>();
		let len = factories.len();
		let head = factories.iter().rev().fold(sender, |next, factory| factory.create(next));

		Self { head, len }
	}

	/// Number of policies in front of the sender.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` when requests go straight to the sender.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Pushes `request` through the chain under `ctx`.
	///
	/// Cancellation or deadline expiry of `ctx` aborts the call wherever it is in the chain and
	/// surfaces as [`Error::Cancelled`] or [`Error::DeadlineExceeded`].
	pub async fn send(&self, ctx: &Context, request: Request) -> Result<Response> {
		ctx.run(self.head.send(ctx, request)).await
	}
}
impl Debug for Pipeline {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pipeline").field("policies", &self.len).finish()
	}
}
