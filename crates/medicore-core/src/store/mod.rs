// ── Collection caches ──
//
// In-memory per-kind stores plus the durable warm-start layer behind them.

pub mod durable;
mod entity_store;

pub use durable::{DurableStore, FileStore, MemoryStore};
pub use entity_store::{CacheSnapshot, CacheState, EntityStore, StoreContext};
