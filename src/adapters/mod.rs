// Adapters layer: concrete implementations of the domain ports.

pub mod csv_loader;
pub mod memory_store;

pub use csv_loader::load_directory;
pub use memory_store::InMemoryStore;
