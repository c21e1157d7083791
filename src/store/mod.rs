//! Contact record stores backing the list provider and batch loader contracts.

pub mod memory;

pub use memory::MemoryContactStore;
