//! Demonstrates plugging a hand-written policy and sender into a pipeline without any HTTP
//! transport.
//!
//! `RequestId` stamps a header on the way in and `Recorder` plays the role of the sender, so the
//! whole chain runs in memory.

// std
use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_pipeline::{
	credential::Credential,
	http::{HeaderValue, Method, StatusCode},
	pipeline::{Context, Pipeline, Policy, PolicyFactory, PolicyFuture, Request, Response},
};

struct RequestId {
	counter: Arc<AtomicU64>,
	next: Arc<dyn Policy>,
}
impl Policy for RequestId {
	fn send<'a>(&'a self, ctx: &'a Context, mut request: Request) -> PolicyFuture<'a> {
		Box::pin(async move {
			let id = self.counter.fetch_add(1, Ordering::SeqCst);

			request.headers.insert("x-request-id", HeaderValue::from(id));

			self.next.send(ctx, request).await
		})
	}
}

/// Sender that answers with the headers it received.
struct Recorder;
impl Policy for Recorder {
	fn send<'a>(&'a self, _ctx: &'a Context, request: Request) -> PolicyFuture<'a> {
		Box::pin(async move {
			let seen = request
				.headers
				.iter()
				.map(|(name, value)| format!("{name}: {}", value.to_str().unwrap_or("<opaque>")))
				.collect::<Vec<_>>()
				.join("\n");

			Ok(Response::new(StatusCode::OK, seen))
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let counter = Arc::new(AtomicU64::new(1));
	let request_id: Arc<dyn PolicyFactory> = Arc::new({
		let counter = counter.clone();

		move |next: Arc<dyn Policy>| -> Arc<dyn Policy> {
			Arc::new(RequestId { counter: counter.clone(), next })
		}
	});
	let credential: Arc<dyn PolicyFactory> = Arc::new(Credential::token("in-memory"));
	let pipeline = Pipeline::new([request_id, credential], Arc::new(Recorder));

	for _ in 0..2 {
		let request = Request::new(Method::GET, Url::parse("https://service.invalid/ping")?);
		let response = pipeline.send(&Context::new(), request).await?;

		println!("{}\n", response.text().unwrap_or_default());
	}

	Ok(())
}
