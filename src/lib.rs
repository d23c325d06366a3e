//! Rust's turnkey session broker - bearer attachment, single-flight token refresh, and
//! transparent 401 replay for REST and GraphQL backends in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod backend;
pub mod error;
pub mod http;
pub mod obs;
pub mod pipeline;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		auth::TokenPair,
		backend::BackendDescriptor,
		http::ReqwestTransport,
		pipeline::SessionBroker,
		store::{MemoryStore, SessionStore},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = SessionBroker<ReqwestTransport>;

	/// Builds an unsigned JWT carrying `sub`/`iat`/`exp` claims for expiry-driven tests.
	///
	/// The signature segment is a placeholder; the broker never verifies signatures on the
	/// client side, it only decodes the payload claims.
	pub fn test_jwt(sub: &str, expires_at: OffsetDateTime) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let claims = serde_json::json!({
			"sub": sub,
			"iat": (expires_at - Duration::hours(1)).unix_timestamp(),
			"exp": expires_at.unix_timestamp(),
		});
		let payload = URL_SAFE_NO_PAD
			.encode(serde_json::to_vec(&claims).expect("JWT claim fixture should serialize."));

		format!("{header}.{payload}.test-signature")
	}

	/// Builds a token pair whose halves expire at the provided instants.
	pub fn test_token_pair(
		access_expires_at: OffsetDateTime,
		refresh_expires_at: OffsetDateTime,
	) -> TokenPair {
		TokenPair::new(
			test_jwt("user-demo", access_expires_at),
			test_jwt("user-demo", refresh_expires_at),
		)
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`SessionBroker`] backed by an in-memory store and the reqwest transport
	/// used across integration tests.
	pub fn build_reqwest_test_broker(
		descriptor: BackendDescriptor,
	) -> (ReqwestTestBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let broker = SessionBroker::with_transport(store, descriptor, test_reqwest_transport());

		(broker, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, session_broker as _};
