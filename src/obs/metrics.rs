// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_pipeline_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records the delay a refresher asked for before its next run, in seconds.
///
/// Non-positive delays end the schedule and are recorded as zero.
pub fn record_refresh_delay(delay: Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("oauth2_pipeline_refresh_delay_seconds")
			.record(delay.as_seconds_f64().max(0.0));
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = delay;
	}
}
