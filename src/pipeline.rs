//! Instrumented request pipelines powered by the session broker facade.

pub mod graphql;
pub mod refresh;
pub mod rest;

mod common;
mod logout;
mod wire;

pub use graphql::*;
pub use refresh::*;
pub use rest::*;

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	backend::BackendDescriptor,
	http::HttpTransport,
	obs::{NoopEventSink, SessionEventSink},
	pipeline::refresh::RefreshCoordinator,
	session::SessionPresence,
	store::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport.
pub type ReqwestBroker = SessionBroker<ReqwestTransport>;

/// Coordinates authenticated REST and GraphQL traffic against a single backend.
///
/// The broker owns the HTTP transport, session store, and backend descriptor so the
/// pipelines can focus on transport-specific logic (bearer attachment, 401 detection,
/// replay). Both pipelines share one refresh coordinator, so a burst of rejected
/// requests across REST and GraphQL still produces at most one refresh call.
pub struct SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound backend request.
	pub transport: Arc<T>,
	/// Session store that persists the token pair.
	pub store: Arc<dyn SessionStore>,
	/// Backend descriptor that defines REST, GraphQL, and auth routes.
	pub descriptor: BackendDescriptor,
	/// Shared metrics recorder for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	event_sink: Arc<dyn SessionEventSink>,
	presence: Arc<RwLock<SessionPresence>>,
	refresh_coordinator: Arc<RefreshCoordinator>,
	refresh_timeout: Duration,
}
impl<T> SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	/// Per-request time limit applied to refresh and revoke calls by default.
	pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn SessionStore>,
		descriptor: BackendDescriptor,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			descriptor,
			refresh_metrics: Default::default(),
			event_sink: Arc::new(NoopEventSink),
			presence: Default::default(),
			refresh_coordinator: Default::default(),
			refresh_timeout: Self::DEFAULT_REFRESH_TIMEOUT,
		}
	}

	/// Sets or replaces the sink notified of session lifecycle events.
	pub fn with_event_sink(mut self, sink: Arc<dyn SessionEventSink>) -> Self {
		self.event_sink = sink;

		self
	}

	/// Overrides the time limit applied to refresh and revoke calls.
	///
	/// Non-positive durations disable the limit entirely.
	pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Persists a freshly issued pair and marks the session authenticated.
	///
	/// This is the sign-in entry point: the embedding application performs its own
	/// login call and hands the minted pair over. Persistence is best-effort, so a
	/// failing store degrades to an in-memory session instead of failing the login.
	pub async fn establish_session(&self, pair: TokenPair) {
		common::persist_pair(self, &pair).await;
		self.set_presence(SessionPresence::Authenticated);
	}

	/// Rehydrates the session from the store, typically at process start.
	///
	/// Returns the stored pair when its refresh token is still outside the expiry
	/// leeway; an expired or absent pair yields `None` and leaves presence untouched.
	/// The access token's own expiry is irrelevant here, the next pipeline pass
	/// recovers it silently.
	pub async fn restore_session(&self) -> Option<TokenPair> {
		let stored = common::load_stored(self).await?;

		if stored.refresh_expired_at(OffsetDateTime::now_utc()) {
			return None;
		}

		self.set_presence(SessionPresence::Authenticated);

		Some(stored)
	}

	/// Current local presence state.
	pub fn presence(&self) -> SessionPresence {
		*self.presence.read()
	}

	pub(crate) fn set_presence(&self, presence: SessionPresence) {
		*self.presence.write() = presence;
	}

	pub(crate) fn event_sink(&self) -> &dyn SessionEventSink {
		&*self.event_sink
	}

	pub(crate) fn refresh_timeout(&self) -> Option<Duration> {
		self.refresh_timeout.is_positive().then_some(self.refresh_timeout)
	}
}
#[cfg(feature = "reqwest")]
impl SessionBroker<ReqwestTransport> {
	/// Creates a new broker for the provided store and descriptor.
	///
	/// The broker provisions its own reqwest-backed transport so callers do not need
	/// to pass HTTP handles explicitly. Use [`SessionBroker::with_transport`] to plug
	/// in a custom transport instead.
	pub fn new(store: Arc<dyn SessionStore>, descriptor: BackendDescriptor) -> Self {
		Self::with_transport(store, descriptor, ReqwestTransport::default())
	}
}
impl<T> Clone for SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			event_sink: self.event_sink.clone(),
			presence: self.presence.clone(),
			refresh_coordinator: self.refresh_coordinator.clone(),
			refresh_timeout: self.refresh_timeout,
		}
	}
}
impl<T> Debug for SessionBroker<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionBroker")
			.field("descriptor", &self.descriptor)
			.field("presence", &self.presence())
			.field("refresh_timeout", &self.refresh_timeout)
			.finish()
	}
}
