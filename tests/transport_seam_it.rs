#![cfg(feature = "reqwest")]

// std
use std::collections::VecDeque;
// self
use session_broker::{
	_preludet::*,
	auth::TokenPair,
	backend::{BackendDescriptor, RefreshRoute, RevokeRoute},
	error::Error,
	http::{HttpTransport, TransportFuture, WireMethod, WireRequest, WireResponse},
	obs::SessionEventSink,
	pipeline::{GraphqlRequest, RestRequest, SessionBroker},
	session::SessionPresence,
	store::{MemoryStore, SessionStore},
};

/// Transport double that records every outbound request and answers from a script.
#[derive(Default)]
struct ScriptedTransport {
	requests: Mutex<Vec<WireRequest>>,
	replies: Mutex<VecDeque<WireResponse>>,
}
impl ScriptedTransport {
	fn scripted(replies: impl IntoIterator<Item = WireResponse>) -> Arc<Self> {
		Arc::new(Self {
			requests: Mutex::new(Vec::new()),
			replies: Mutex::new(replies.into_iter().collect()),
		})
	}

	fn recorded(&self) -> Vec<WireRequest> {
		self.requests.lock().clone()
	}
}
impl HttpTransport for ScriptedTransport {
	fn dispatch(&self, request: WireRequest) -> TransportFuture<'_, WireResponse> {
		Box::pin(async move {
			self.requests.lock().push(request);

			Ok(self.replies.lock().pop_front().expect("Scripted transport ran out of replies."))
		})
	}
}

#[derive(Default)]
struct RecordingSink {
	events: Mutex<Vec<&'static str>>,
}
impl RecordingSink {
	fn recorded(&self) -> Vec<&'static str> {
		self.events.lock().clone()
	}
}
impl SessionEventSink for RecordingSink {
	fn refresh_started(&self) {
		self.events.lock().push("refresh_started");
	}

	fn refresh_succeeded(&self, _: &TokenPair) {
		self.events.lock().push("refresh_succeeded");
	}

	fn refresh_failed(&self, _: &Error) {
		self.events.lock().push("refresh_failed");
	}

	fn logout(&self) {
		self.events.lock().push("logout");
	}
}

fn build_descriptor(revoke: bool) -> BackendDescriptor {
	let mut builder = BackendDescriptor::builder()
		.rest_base(Url::parse("https://backend.test/api/").expect("URL fixture is valid."))
		.graphql_endpoint(
			Url::parse("https://backend.test/graphql").expect("URL fixture is valid."),
		)
		.refresh_route(RefreshRoute::Rest(
			Url::parse("https://backend.test/api/auth/refreshToken")
				.expect("URL fixture is valid."),
		));

	if revoke {
		builder = builder.revoke_route(RevokeRoute::Rest(
			Url::parse("https://backend.test/api/auth/logout").expect("URL fixture is valid."),
		));
	}

	builder.build().expect("Backend descriptor should build successfully.")
}

fn build_scripted_broker(
	descriptor: BackendDescriptor,
	replies: impl IntoIterator<Item = WireResponse>,
) -> (SessionBroker<ScriptedTransport>, Arc<ScriptedTransport>, Arc<MemoryStore>) {
	let transport = ScriptedTransport::scripted(replies);
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn SessionStore> = store_backend.clone();
	let broker = SessionBroker::with_transport(store, descriptor, transport.clone());

	(broker, transport, store_backend)
}

fn reply(status: u16, body: &str) -> WireResponse {
	WireResponse { status, body: body.as_bytes().to_vec() }
}

#[tokio::test]
async fn graphql_withholds_a_bearer_inside_the_expiry_leeway() {
	let (broker, transport, store) =
		build_scripted_broker(build_descriptor(false), [reply(200, "{\"data\":{\"bookings\":[]}}")]);
	let now = OffsetDateTime::now_utc();

	// Ten seconds of remaining life is inside the 30-second leeway, so the token is
	// already stale from the pipeline's point of view.
	store
		.save(test_token_pair(now + Duration::seconds(10), now + Duration::days(7)))
		.await
		.expect("Seeding the store should succeed.");

	broker
		.execute(GraphqlRequest::new("query Bookings { bookings { id } }"))
		.await
		.expect("Clean reply should pass through.");

	let recorded = transport.recorded();

	assert_eq!(recorded.len(), 1);
	assert_eq!(recorded[0].method, WireMethod::Post);
	assert_eq!(recorded[0].url.as_str(), "https://backend.test/graphql");
	assert_eq!(recorded[0].header("authorization"), None);
}

#[tokio::test]
async fn rest_attaches_the_stale_bearer_optimistically() {
	let (broker, transport, store) =
		build_scripted_broker(build_descriptor(false), [reply(200, "{\"name\":\"ada\"}")]);
	let now = OffsetDateTime::now_utc();
	let stale = test_token_pair(now - Duration::hours(1), now + Duration::days(7));

	store.save(stale.clone()).await.expect("Seeding the store should succeed.");

	broker
		.send(RestRequest::get("profile"))
		.await
		.expect("Pass-through response should not error.");

	let recorded = transport.recorded();

	assert_eq!(recorded.len(), 1);
	assert_eq!(recorded[0].url.as_str(), "https://backend.test/api/profile");
	assert_eq!(
		recorded[0].header("authorization"),
		Some(format!("Bearer {}", stale.access.expose()).as_str())
	);
}

#[tokio::test]
async fn recovery_carries_the_refresh_timeout_and_fresh_bearer() {
	let (broker, transport, store) = build_scripted_broker(build_descriptor(false), [
		reply(401, "unauthorized"),
		reply(200, "{\"jwt\":\"minted-access\",\"refreshToken\":\"minted-refresh\"}"),
		reply(200, "{\"data\":{\"bookings\":[]}}"),
	]);
	let sink = Arc::new(RecordingSink::default());
	let broker = broker.with_event_sink(sink.clone());
	let now = OffsetDateTime::now_utc();
	let stale = test_token_pair(now - Duration::hours(1), now + Duration::days(7));

	store.save(stale.clone()).await.expect("Seeding the store should succeed.");

	broker
		.execute(GraphqlRequest::new("query Bookings { bookings { id } }"))
		.await
		.expect("Silent recovery should succeed.");

	let recorded = transport.recorded();

	assert_eq!(recorded.len(), 3);

	// First attempt: expired bearer withheld, no time limit on pipeline requests.
	assert_eq!(recorded[0].header("authorization"), None);
	assert_eq!(recorded[0].timeout, None);

	// Refresh call: default time limit, refresh token in the body, no bearer.
	assert_eq!(recorded[1].url.as_str(), "https://backend.test/api/auth/refreshToken");
	assert_eq!(
		recorded[1].timeout,
		Some(SessionBroker::<ScriptedTransport>::DEFAULT_REFRESH_TIMEOUT)
	);
	assert_eq!(recorded[1].header("authorization"), None);

	let body: serde_json::Value =
		serde_json::from_slice(recorded[1].body.as_deref().expect("Refresh body should be present."))
			.expect("Refresh body should be JSON.");

	assert_eq!(body["refreshToken"], stale.refresh.expose());

	// Forwarded operation: freshly minted bearer.
	assert_eq!(recorded[2].header("authorization"), Some("Bearer minted-access"));
	assert_eq!(sink.recorded(), ["refresh_started", "refresh_succeeded"]);
}

#[tokio::test]
async fn failed_refresh_tears_down_through_the_seam() {
	let (broker, transport, store) = build_scripted_broker(build_descriptor(true), [
		reply(401, "{\"error\":\"session expired\"}"),
		reply(500, "{\"error\":\"refresh store offline\"}"),
		reply(200, ""),
	]);
	let sink = Arc::new(RecordingSink::default());
	let broker = broker.with_event_sink(sink.clone());
	let now = OffsetDateTime::now_utc();
	let stale = test_token_pair(now + Duration::hours(1), now + Duration::days(7));

	store.save(stale.clone()).await.expect("Seeding the store should succeed.");

	let error = broker
		.send(RestRequest::get("profile"))
		.await
		.expect_err("An unrecoverable rejection should surface as an error.");

	assert!(matches!(error, Error::Unauthenticated { status: 401, .. }));

	let recorded = transport.recorded();

	assert_eq!(recorded.len(), 3);

	// The revoke call presents the refresh token that just failed to rotate.
	assert_eq!(recorded[2].url.as_str(), "https://backend.test/api/auth/logout");
	assert_eq!(
		recorded[2].timeout,
		Some(SessionBroker::<ScriptedTransport>::DEFAULT_REFRESH_TIMEOUT)
	);

	let body: serde_json::Value =
		serde_json::from_slice(recorded[2].body.as_deref().expect("Revoke body should be present."))
			.expect("Revoke body should be JSON.");

	assert_eq!(body["refreshToken"], stale.refresh.expose());

	assert_eq!(store.load().await.expect("Loading the wiped store should succeed."), None);
	assert_eq!(broker.presence(), SessionPresence::Unauthenticated);
	assert_eq!(sink.recorded(), ["refresh_started", "refresh_failed", "logout"]);
}

#[tokio::test]
async fn refresh_timeout_override_reaches_the_wire() {
	let (broker, transport, store) = build_scripted_broker(build_descriptor(false), [reply(
		200,
		"{\"jwt\":\"minted-access\",\"refreshToken\":\"minted-refresh\"}",
	)]);
	let broker = broker.with_refresh_timeout(Duration::seconds(3));
	let now = OffsetDateTime::now_utc();

	store
		.save(test_token_pair(now + Duration::hours(1), now + Duration::days(7)))
		.await
		.expect("Seeding the store should succeed.");
	broker.refresh_session().await.expect("Refresh should mint a pair.");

	assert_eq!(transport.recorded()[0].timeout, Some(Duration::seconds(3)));
}

#[tokio::test]
async fn non_positive_refresh_timeout_disables_the_limit() {
	let (broker, transport, store) = build_scripted_broker(build_descriptor(false), [reply(
		200,
		"{\"jwt\":\"minted-access\",\"refreshToken\":\"minted-refresh\"}",
	)]);
	let broker = broker.with_refresh_timeout(Duration::ZERO);
	let now = OffsetDateTime::now_utc();

	store
		.save(test_token_pair(now + Duration::hours(1), now + Duration::days(7)))
		.await
		.expect("Seeding the store should succeed.");
	broker.refresh_session().await.expect("Refresh should mint a pair.");

	assert_eq!(transport.recorded()[0].timeout, None);
}
