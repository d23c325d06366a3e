//! Demonstrates plugging a custom HTTP transport and event sink into the broker.
//!
//! 1. Implement [`HttpTransport`] over whatever client the application already owns;
//!    here a fully offline transport answers from a scripted reply queue.
//! 2. Implement [`SessionEventSink`] to observe session lifecycle transitions.
//! 3. Hand both to [`SessionBroker::with_transport`] and drive the pipelines as usual.
//!
//! The first broker recovers a rejected request silently; the second one fails its
//! refresh and walks through the logout fallback instead.

// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use url::Url;
// self
use session_broker::{
	auth::TokenPair,
	backend::{BackendDescriptor, RefreshRoute, RevokeRoute},
	error::Error,
	http::{HttpTransport, TransportFuture, WireRequest, WireResponse},
	obs::SessionEventSink,
	pipeline::{RestRequest, SessionBroker},
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let descriptor = BackendDescriptor::builder()
		.rest_base(Url::parse("https://backend.example.com/api/")?)
		.graphql_endpoint(Url::parse("https://backend.example.com/graphql")?)
		.refresh_route(RefreshRoute::Rest(Url::parse(
			"https://backend.example.com/api/auth/refreshToken",
		)?))
		.revoke_route(RevokeRoute::Rest(Url::parse(
			"https://backend.example.com/api/auth/logout",
		)?))
		.build()?;
	let sink = Arc::new(PrintlnSink);

	// Script one: rejection, minted pair, successful replay.
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let transport = Arc::new(ScriptedTransport::new([
		reply(401, "{\"error\":\"jwt expired\"}"),
		reply(200, "{\"jwt\":\"fresh-access\",\"refreshToken\":\"fresh-refresh\"}"),
		reply(200, "{\"bookings\":[]}"),
	]));
	let broker = SessionBroker::<ScriptedTransport>::with_transport(store, descriptor.clone(), transport)
		.with_event_sink(sink.clone());

	broker.establish_session(TokenPair::new("stale-access", "long-lived-refresh")).await;

	let response = broker.send(RestRequest::get("bookings")).await?;

	println!("Recovered response status: {}.", response.status);
	println!("Session presence after recovery: {}.", broker.presence());

	// Script two: rejection, refresh failure, revocation; the broker gives up and
	// tears the session down.
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let transport = Arc::new(ScriptedTransport::new([
		reply(401, "{\"error\":\"session expired\"}"),
		reply(500, "{\"error\":\"refresh store offline\"}"),
		reply(200, ""),
	]));
	let broker = SessionBroker::<ScriptedTransport>::with_transport(store, descriptor, transport)
		.with_event_sink(sink);

	broker.establish_session(TokenPair::new("stale-access", "revoked-refresh")).await;

	match broker.send(RestRequest::get("bookings")).await {
		Ok(_) => println!("Scripted transport unexpectedly recovered."),
		Err(e) => println!("Recovery gave up with the original rejection: {e}"),
	}

	println!("Session presence after the fallback: {}.", broker.presence());

	Ok(())
}

fn reply(status: u16, body: &str) -> WireResponse {
	WireResponse { status, body: body.as_bytes().to_vec() }
}

/// Offline transport answering from a fixed reply queue.
struct ScriptedTransport {
	replies: Mutex<VecDeque<WireResponse>>,
}
impl ScriptedTransport {
	fn new(replies: impl IntoIterator<Item = WireResponse>) -> Self {
		Self { replies: Mutex::new(replies.into_iter().collect()) }
	}
}
impl HttpTransport for ScriptedTransport {
	fn dispatch(&self, request: WireRequest) -> TransportFuture<'_, WireResponse> {
		Box::pin(async move {
			println!("Dispatching {} {}.", request.method, request.url);

			Ok(self
				.replies
				.lock()
				.pop_front()
				.unwrap_or(WireResponse { status: 502, body: Vec::new() }))
		})
	}
}

/// Sink that narrates session lifecycle transitions.
struct PrintlnSink;
impl SessionEventSink for PrintlnSink {
	fn refresh_started(&self) {
		println!("Refresh attempt started.");
	}

	fn refresh_succeeded(&self, pair: &TokenPair) {
		println!("Refresh succeeded; new access fingerprint: {}.", pair.access.fingerprint());
	}

	fn refresh_failed(&self, error: &Error) {
		println!("Refresh failed: {error}");
	}

	fn logout(&self) {
		println!("Session cleared by the logout fallback.");
	}
}
