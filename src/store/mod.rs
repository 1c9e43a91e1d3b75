//! Persistence layer — JSON file holding the books already evaluated.

pub mod memory;

pub use memory::MemoryStore;
