//! Unverified JWT claim decoding and expiry evaluation.
//!
//! The broker never validates signatures. Tokens are opaque credentials minted by the
//! backend, and the only client-side question is how long until they expire. Decoding
//! fails open: a token whose payload cannot be read classifies as already expired, so it
//! gets refreshed (or dropped) instead of being replayed forever.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Safety margin subtracted from a token's lifetime when deciding expiry.
///
/// A token with only a few seconds left would still expire while the request carrying it
/// is in flight, so anything inside this window counts as expired.
pub const EXPIRY_LEEWAY: Duration = Duration::seconds(30);

/// Claims the broker reads from an access or refresh token payload.
///
/// Every field is optional; backends are free to omit any of them and decoding must not
/// fail when they do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Subject (user) identifier.
	#[serde(default)]
	pub sub: Option<String>,
	/// Expiry instant as Unix seconds.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Issued-at instant as Unix seconds.
	#[serde(default)]
	pub iat: Option<i64>,
}

/// Decodes the payload segment of a JWT without verifying its signature.
///
/// Returns `None` for anything that is not a three-segment token carrying a base64url
/// JSON payload.
pub fn decode(token: &str) -> Option<TokenClaims> {
	let payload = token.split('.').nth(1)?;
	let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;

	serde_json::from_slice(&bytes).ok()
}

/// Returns `true` when the token expires within [`EXPIRY_LEEWAY`] of `now`.
///
/// Malformed tokens and tokens without an `exp` claim classify as expired.
pub fn expires_within_leeway(token: &str, now: OffsetDateTime) -> bool {
	let Some(exp) = decode(token).and_then(|claims| claims.exp) else {
		return true;
	};

	exp <= (now + EXPIRY_LEEWAY).unix_timestamp()
}
