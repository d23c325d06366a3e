//! Crate-visible session presence state.

// self
use crate::_prelude::*;

/// Whether the broker currently considers a user signed in.
///
/// Presence tracks the local view only: it flips to [`Authenticated`](Self::Authenticated)
/// on login, restore, and successful refresh, and to
/// [`Unauthenticated`](Self::Unauthenticated) on sign-out and the logout fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPresence {
	/// A session is established and requests carry its credentials.
	Authenticated,
	/// No usable session; requests go out without a bearer and 401s are not recovered.
	#[default]
	Unauthenticated,
}
impl SessionPresence {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionPresence::Authenticated => "authenticated",
			SessionPresence::Unauthenticated => "unauthenticated",
		}
	}

	/// Returns `true` for [`Authenticated`](Self::Authenticated).
	pub const fn is_authenticated(self) -> bool {
		matches!(self, SessionPresence::Authenticated)
	}
}
impl Display for SessionPresence {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
