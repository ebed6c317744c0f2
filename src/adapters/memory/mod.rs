//! In-memory adapter implementations for tests and local development.

mod session_store;

pub use session_store::InMemorySessionStore;
