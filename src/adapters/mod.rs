// Adapters layer: concrete pharmacy stores.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;
