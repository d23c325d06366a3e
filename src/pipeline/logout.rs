//! Logout pipeline: best-effort revoke, local wipe, and the recovery fallback.

// self
use crate::{
	_prelude::*,
	http::HttpTransport,
	obs::{self, PipelineKind, PipelineOutcome, PipelineSpan},
	pipeline::{SessionBroker, common, wire},
	session::SessionPresence,
};

impl<T> SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// Signs the session out.
	///
	/// Infallible by construction: the teardown ends with a wiped store and an
	/// [`SessionPresence::Unauthenticated`] presence no matter which individual step
	/// fails, so callers have nothing to handle.
	pub async fn sign_out(&self) {
		const KIND: PipelineKind = PipelineKind::Logout;

		let span = PipelineSpan::new(KIND, "sign_out");

		obs::record_pipeline_outcome(KIND, PipelineOutcome::Attempt);
		span.instrument(self.run_logout_fallback()).await;
		obs::record_pipeline_outcome(KIND, PipelineOutcome::Success);
	}

	/// Tears the session down unconditionally.
	///
	/// Order is fixed: best-effort revoke, best-effort store wipe, presence flip, then
	/// the `logout` event. A failing step is logged and never stops the following
	/// ones. Shared between [`Self::sign_out`] and the recovery paths that give up
	/// after a failed refresh.
	pub(crate) async fn run_logout_fallback(&self) {
		if let Err(e) = self.try_revoke().await {
			obs::note_best_effort_failure("revoke", &e);
		}

		common::wipe_store(self).await;
		self.set_presence(SessionPresence::Unauthenticated);
		self.event_sink().logout();
	}

	/// Revokes the stored refresh token upstream when a revoke route is configured.
	///
	/// Skipping counts as success, both when the descriptor has no revoke route and
	/// when nothing is stored to revoke. The request goes through the raw transport,
	/// not a recovering pipeline, so a rejected revoke can never recurse into another
	/// refresh cycle.
	async fn try_revoke(&self) -> Result<()> {
		let Some(route) = &self.descriptor.revoke else {
			return Ok(());
		};
		let Some(stored) = common::load_stored(self).await else {
			return Ok(());
		};
		let request =
			wire::revoke_request(route, stored.refresh.expose(), self.refresh_timeout())?;
		let response = self.transport.dispatch(request).await?;

		if !response.is_success() {
			return Err(Error::Upstream {
				status: response.status,
				preview: common::body_preview(&response.body),
			});
		}

		Ok(())
	}
}
