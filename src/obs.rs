//! Optional observability helpers and the session event surface.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_broker.pipeline` with the
//!   `pipeline` (transport) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `session_broker_pipeline_total` counter for every
//!   attempt/success/failure, labeled by `pipeline` + `outcome`.
//!
//! Independently of both features, [`SessionEventSink`] lets the embedding application
//! subscribe to session lifecycle transitions (refresh started/settled, logout) without
//! pulling in a telemetry stack.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::TokenPair};

/// Request pipelines observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
	/// REST request pipeline.
	Rest,
	/// GraphQL operation pipeline.
	Graphql,
	/// Token refresh pipeline.
	Refresh,
	/// Logout fallback pipeline.
	Logout,
}
impl PipelineKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PipelineKind::Rest => "rest",
			PipelineKind::Graphql => "graphql",
			PipelineKind::Refresh => "refresh",
			PipelineKind::Logout => "logout",
		}
	}
}
impl Display for PipelineKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each pipeline pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineOutcome {
	/// Entry to a broker pipeline.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl PipelineOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PipelineOutcome::Attempt => "attempt",
			PipelineOutcome::Success => "success",
			PipelineOutcome::Failure => "failure",
		}
	}
}
impl Display for PipelineOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Subscription surface for session lifecycle events.
///
/// Every hook has a no-op default, so implementors override only what they need. Hooks
/// run inline on the pipeline's task and should hand heavy work off elsewhere.
pub trait SessionEventSink
where
	Self: Send + Sync,
{
	/// A refresh network attempt is about to be dispatched.
	fn refresh_started(&self) {}

	/// A refresh attempt settled with a freshly minted pair.
	fn refresh_succeeded(&self, pair: &TokenPair) {
		let _ = pair;
	}

	/// A refresh invocation settled without a usable pair.
	///
	/// May fire without a preceding [`refresh_started`](Self::refresh_started) when no
	/// refresh token is stored and the attempt never reaches the network.
	fn refresh_failed(&self, error: &Error) {
		let _ = error;
	}

	/// The logout fallback or an explicit sign-out cleared the session.
	fn logout(&self) {}
}

/// Default sink that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;
impl SessionEventSink for NoopEventSink {}

/// Emits a warning for best-effort operations the broker tolerates failing.
pub(crate) fn note_best_effort_failure(stage: &'static str, error: &impl Display) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(stage, error = %error, "Best-effort operation failed; continuing.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}
