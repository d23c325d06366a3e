//! Storage contracts and built-in store implementations for the session token pair.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenPair};

/// Persistence future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by session stores.
///
/// The access and refresh tokens travel together as one atomic document; a partially
/// written pair is unrepresentable by construction.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists the pair, replacing any previously stored one.
	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()>;

	/// Loads the stored pair, if one is present.
	fn load(&self) -> StoreFuture<'_, Option<TokenPair>>;

	/// Removes the stored pair; clearing an already empty store succeeds.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
