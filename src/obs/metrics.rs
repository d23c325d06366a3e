// self
use crate::obs::{PipelineKind, PipelineOutcome};

/// Records a pipeline outcome via the global metrics recorder (when enabled).
pub fn record_pipeline_outcome(kind: PipelineKind, outcome: PipelineOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_broker_pipeline_total",
			"pipeline" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_pipeline_outcome_noop_without_metrics() {
		record_pipeline_outcome(PipelineKind::Graphql, PipelineOutcome::Failure);
	}
}
