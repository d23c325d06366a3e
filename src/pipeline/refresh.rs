//! Token refresh with a single-flight coordinator shared by both pipelines.
//!
//! The broker exposes [`SessionBroker::refresh_session`] so any caller holding a
//! rejected credential can request a fresh pair without worrying about concurrent
//! rejections. An async gate admits one network attempt at a time; a generation-stamped
//! settle slot lets every caller that arrived while an attempt was in flight adopt that
//! attempt's outcome instead of dialing again. The moment an attempt settles the
//! generation advances, so the next expiry starts a fresh attempt rather than reusing a
//! stale result.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	error::ConfigError,
	http::HttpTransport,
	obs::{self, PipelineKind, PipelineOutcome, PipelineSpan},
	pipeline::{SessionBroker, common, wire},
	session::SessionPresence,
};

/// Single-flight refresh state shared by every broker clone.
///
/// `gate` admits one attempt at a time; `settled` memoizes the latest attempt's outcome
/// together with a generation stamp so gate waiters can tell "an attempt settled while
/// I waited" apart from "it is my turn to dial".
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
	gate: AsyncMutex<()>,
	settled: Mutex<SettledRefresh>,
}
impl RefreshCoordinator {
	fn generation(&self) -> u64 {
		self.settled.lock().generation
	}

	fn settled_since(&self, entry_generation: u64) -> Option<Option<TokenPair>> {
		let slot = self.settled.lock();

		(slot.generation != entry_generation).then(|| slot.outcome.clone())
	}

	fn settle(&self, outcome: Option<TokenPair>) {
		let mut slot = self.settled.lock();

		slot.generation = slot.generation.wrapping_add(1);
		slot.outcome = outcome;
	}
}

#[derive(Debug, Default)]
struct SettledRefresh {
	generation: u64,
	outcome: Option<TokenPair>,
}

impl<T> SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges the stored refresh token for a fresh pair, coalescing concurrent calls.
	///
	/// Any number of concurrent invocations produce at most one network call; every
	/// caller observes that attempt's outcome. The method never errors: `None` covers
	/// the missing-refresh-token precondition (resolved without touching the network)
	/// as well as transport, upstream, and decode failures, all of which mean the
	/// session cannot be recovered silently. On success the fresh pair is persisted and
	/// presence flips to authenticated before any caller resumes.
	pub async fn refresh_session(&self) -> Option<TokenPair> {
		const KIND: PipelineKind = PipelineKind::Refresh;

		let span = PipelineSpan::new(KIND, "refresh_session");

		obs::record_pipeline_outcome(KIND, PipelineOutcome::Attempt);

		let outcome = span
			.instrument(async move {
				let entry_generation = self.refresh_coordinator.generation();
				let _singleflight = self.refresh_coordinator.gate.lock().await;

				// An attempt settled while this caller waited at the gate; adopt its
				// outcome instead of dialing again.
				if let Some(shared) =
					self.refresh_coordinator.settled_since(entry_generation)
				{
					return shared;
				}

				let outcome = self.attempt_refresh().await;

				self.refresh_coordinator.settle(outcome.clone());

				outcome
			})
			.await;

		match &outcome {
			Some(_) => obs::record_pipeline_outcome(KIND, PipelineOutcome::Success),
			None => obs::record_pipeline_outcome(KIND, PipelineOutcome::Failure),
		}

		outcome
	}

	async fn attempt_refresh(&self) -> Option<TokenPair> {
		let Some(stored) = common::load_stored(self).await else {
			self.event_sink().refresh_failed(&Error::from(ConfigError::MissingRefreshToken));

			return None;
		};

		self.refresh_metrics.record_attempt();
		self.event_sink().refresh_started();

		match self.dial_refresh(&stored).await {
			Ok(minted) => {
				self.refresh_metrics.record_success();
				common::persist_pair(self, &minted).await;
				self.set_presence(SessionPresence::Authenticated);
				self.event_sink().refresh_succeeded(&minted);

				Some(minted)
			},
			Err(e) => {
				self.refresh_metrics.record_failure();
				self.event_sink().refresh_failed(&e);

				None
			},
		}
	}

	async fn dial_refresh(&self, stored: &TokenPair) -> Result<TokenPair> {
		let request = wire::refresh_request(
			&self.descriptor.refresh,
			stored.refresh.expose(),
			self.refresh_timeout(),
		)?;
		let response = self.transport.dispatch(request).await?;

		wire::decode_refresh_reply(&self.descriptor.refresh, &response)
	}
}
