//! OAuth 2.0 client-credentials tokens, self-refreshing credentials, and a composable request
//! pipeline that stamps them onto every outbound call.
//!
//! Build a [`pipeline::Pipeline`] from policy factories ending in a sender, acquire tokens through
//! an [`authority::AuthenticationContext`], and insert a [`credential::Credential`] into the chain
//! so each request carries the current bearer token.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod credential;
pub mod error;
pub mod flows;
pub mod obs;
pub mod pipeline;
pub mod policy;
pub mod transport;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		authority::AuthenticationContext,
		credential::Credential,
		pipeline::{Pipeline, PolicyFactory},
		policy::{RetryOptions, UserAgent},
		transport::ReqwestSender,
	};

	/// Builds a reqwest sender that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	pub fn test_reqwest_sender() -> ReqwestSender {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestSender::with_client(client)
	}

	/// Retry options with millisecond backoff so retry tests stay fast.
	pub fn fast_retry_options() -> RetryOptions {
		RetryOptions {
			initial_delay: Duration::milliseconds(5),
			max_delay: Duration::milliseconds(20),
			..RetryOptions::default()
		}
	}

	/// Pipeline over the test sender with the given factories in front of it.
	pub fn build_test_pipeline(factories: Vec<Arc<dyn PolicyFactory>>) -> Pipeline {
		Pipeline::new(factories, Arc::new(test_reqwest_sender()))
	}

	/// Default-shaped chain (user agent, fast retry, credential) over the test sender.
	pub fn build_test_default_pipeline(credential: impl Into<Credential>) -> Pipeline {
		build_test_pipeline(vec![
			Arc::new(UserAgent::default()),
			Arc::new(fast_retry_options()),
			Arc::new(credential.into()),
		])
	}

	/// Authentication context rooted at `authority` that sends through a bare test pipeline.
	pub fn build_test_context(authority: &str) -> AuthenticationContext {
		AuthenticationContext::builder(authority)
			.pipeline(build_test_pipeline(Vec::new()))
			.tenant_id("tenant")
			.build()
			.expect("Test authority should resolve.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
