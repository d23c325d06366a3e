//! Shared helpers for pipeline implementations (store wrappers, decoding, previews).

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	http::{HttpTransport, WireResponse},
	obs,
	pipeline::SessionBroker,
};

/// Longest body excerpt carried inside error values.
pub(crate) const BODY_PREVIEW_LIMIT: usize = 256;

/// Loads the stored pair, tolerating store failures.
///
/// A failing store reads as signed out; the error is logged and never reaches the
/// request path.
pub(crate) async fn load_stored<T>(broker: &SessionBroker<T>) -> Option<TokenPair>
where
	T: ?Sized + HttpTransport,
{
	match broker.store.load().await {
		Ok(stored) => stored,
		Err(e) => {
			obs::note_best_effort_failure("store.load", &e);

			None
		},
	}
}

/// Persists the pair, tolerating store failures.
pub(crate) async fn persist_pair<T>(broker: &SessionBroker<T>, pair: &TokenPair)
where
	T: ?Sized + HttpTransport,
{
	if let Err(e) = broker.store.save(pair.clone()).await {
		obs::note_best_effort_failure("store.save", &e);
	}
}

/// Clears the store, tolerating store failures.
pub(crate) async fn wipe_store<T>(broker: &SessionBroker<T>)
where
	T: ?Sized + HttpTransport,
{
	if let Err(e) = broker.store.clear().await {
		obs::note_best_effort_failure("store.clear", &e);
	}
}

/// Decodes a JSON response body, mapping failures into [`Error::Decode`] with the
/// serde path that failed.
pub(crate) fn decode_json<T>(response: &WireResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { source, status: response.status })
}

/// Renders a lossy, truncated excerpt of a response body for error payloads.
pub(crate) fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	let mut buf = String::new();

	for (idx, ch) in text.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}
