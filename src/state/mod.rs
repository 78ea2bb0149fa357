pub mod context;
mod persistence;

pub use context::{Canvas, HostServices};
#[cfg(target_arch = "wasm32")]
pub use persistence::LocalStore;
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceBridge};
