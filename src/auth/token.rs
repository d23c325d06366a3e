//! Secret wrappers and the atomic access + refresh credential pair.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::claims::{self, TokenClaims},
};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	const FINGERPRINT_LEN: usize = 16;

	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable log-safe digest of the secret.
	///
	/// The digest is a base64 (no padding) encoding of the secret's SHA-256 hash,
	/// truncated to 16 characters. It identifies a credential across log lines and sink
	/// events without revealing it.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		let digest = hasher.finalize();
		let mut encoded = STANDARD_NO_PAD.encode(digest);

		encoded.truncate(Self::FINGERPRINT_LEN);

		encoded
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Atomic access + refresh credential pair.
///
/// Both halves are always present, making partial pairs unrepresentable. Stores persist
/// and load the pair as one document so a crash can never strand a single half.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived bearer credential attached to outgoing requests.
	pub access: TokenSecret,
	/// Longer-lived credential used only against the refresh and revoke routes.
	pub refresh: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: TokenSecret::new(access), refresh: TokenSecret::new(refresh) }
	}

	/// Decodes the access token's claims without verifying the signature.
	pub fn access_claims(&self) -> Option<TokenClaims> {
		claims::decode(self.access.expose())
	}

	/// Returns `true` when the access token is expired, or inside the leeway, at `instant`.
	pub fn access_expired_at(&self, instant: OffsetDateTime) -> bool {
		claims::expires_within_leeway(self.access.expose(), instant)
	}

	/// Returns `true` when the refresh token is expired, or inside the leeway, at `instant`.
	pub fn refresh_expired_at(&self, instant: OffsetDateTime) -> bool {
		claims::expires_within_leeway(self.refresh.expose(), instant)
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access", &"<redacted>")
			.field("refresh", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn fingerprint_is_stable_and_redacted() {
		let secret = TokenSecret::new("super-secret");
		let first = secret.fingerprint();
		let second = secret.fingerprint();

		assert_eq!(first, second);
		assert_eq!(first.len(), 16);
		assert!(!first.contains("super"));

		let other = TokenSecret::new("different-secret");

		assert_ne!(first, other.fingerprint());
	}

	#[test]
	fn pair_debug_redacts_both_halves() {
		let pair = TokenPair::new("access-value", "refresh-value");
		let rendered = format!("{pair:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("access-value"));
		assert!(!rendered.contains("refresh-value"));
	}

	#[test]
	fn pair_serializes_as_plain_document() {
		let pair = TokenPair::new("access-value", "refresh-value");
		let document =
			serde_json::to_string(&pair).expect("Token pair should serialize to JSON.");

		assert_eq!(document, "{\"access\":\"access-value\",\"refresh\":\"refresh-value\"}");

		let round_trip: TokenPair =
			serde_json::from_str(&document).expect("Serialized pair should deserialize.");

		assert_eq!(round_trip, pair);
	}
}
