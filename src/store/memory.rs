//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{SessionStore, StoreFuture},
};

type StoreSlot = Arc<RwLock<Option<TokenPair>>>;

/// Thread-safe storage backend that keeps the pair in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreSlot);
impl MemoryStore {
	fn save_now(slot: StoreSlot, pair: TokenPair) {
		*slot.write() = Some(pair);
	}

	fn load_now(slot: StoreSlot) -> Option<TokenPair> {
		slot.read().clone()
	}

	fn clear_now(slot: StoreSlot) {
		slot.write().take();
	}
}
impl SessionStore for MemoryStore {
	fn save(&self, pair: TokenPair) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::save_now(slot, pair);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<TokenPair>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(slot)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::clear_now(slot);

			Ok(())
		})
	}
}
