//! Optional observability helpers for token flows and pipeline policies.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_pipeline.flow` with the `flow` and
//!   `stage` (call site) fields, plus `warn` events for failed refreshes and retried requests.
//! - Enable `metrics` to increment the `oauth2_pipeline_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and to record the delay each refresh
//!   schedules in the `oauth2_pipeline_refresh_delay_seconds` histogram.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Declares a label enum whose variants map to fixed span and metric label values.
macro_rules! labels {
	(
		$(#[$meta:meta])*
		pub enum $name:ident { $($(#[$variant_meta:meta])* $variant:ident => $label:literal,)+ }
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$variant_meta])* $variant,)+
		}
		impl $name {
			/// Every variant, in declaration order.
			pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

			/// Returns the label recorded on spans and metrics.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

labels! {
	/// Token and pipeline flows that emit spans and counters.
	pub enum FlowKind {
		/// Client Credentials token acquisition.
		ClientCredentials => "client_credentials",
		/// Scheduled credential refresh.
		Refresh => "refresh",
		/// Request replayed by the retry policy.
		Retry => "retry",
	}
}

labels! {
	/// Outcome recorded for each flow step.
	pub enum FlowOutcome {
		/// Entry to a flow or a retried send.
		Attempt => "attempt",
		/// Successful completion.
		Success => "success",
		/// Failure propagated back to the caller.
		Failure => "failure",
	}
}
impl FlowOutcome {
	/// Maps a finished step to [`Success`](Self::Success) or [`Failure`](Self::Failure).
	pub const fn settled(succeeded: bool) -> Self {
		if succeeded { Self::Success } else { Self::Failure }
	}
}
