//! Demonstrates the silent-refresh pipeline end to end against a mock backend: a REST
//! call carrying a stale bearer is rejected, the broker exchanges the refresh token for
//! a fresh pair, replays the call, and the caller only ever sees the final response.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use session_broker::{
	auth::TokenPair,
	backend::{BackendDescriptor, RefreshRoute},
	http::ReqwestTransport,
	pipeline::{RestRequest, SessionBroker},
	reqwest::Client,
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let rejected_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/bookings")
				.header("authorization", "Bearer stale-access");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"jwt expired\"}");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refreshToken");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"jwt\":\"fresh-access\",\"refreshToken\":\"fresh-refresh\"}");
		})
		.await;
	let replayed_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/bookings")
				.header("authorization", "Bearer fresh-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"bookings\":[{\"id\":1,\"artist\":\"ada\"}]}");
		})
		.await;
	let descriptor = BackendDescriptor::builder()
		.rest_base(Url::parse(&server.url("/api/"))?)
		.graphql_endpoint(Url::parse(&server.url("/graphql"))?)
		.refresh_route(RefreshRoute::Rest(Url::parse(&server.url("/api/auth/refreshToken"))?))
		.build()?;
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let broker = SessionBroker::with_transport(store, descriptor, transport);

	// The access half is already stale; only the refresh half is still usable.
	broker.establish_session(TokenPair::new("stale-access", "long-lived-refresh")).await;

	let response = broker.send(RestRequest::get("bookings")).await?;

	println!("Replayed response status: {}.", response.status);
	println!("Replayed response body: {}.", String::from_utf8_lossy(&response.body));
	println!("Session presence after recovery: {}.", broker.presence());

	rejected_mock.assert_async().await;
	refresh_mock.assert_async().await;
	replayed_mock.assert_async().await;

	Ok(())
}
