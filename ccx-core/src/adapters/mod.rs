//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the BackendApi port
//! - JSON file (and in-memory) storage for the SessionStore port

pub mod http;
pub mod session_file;

#[cfg(test)]
pub mod mock_backend;

pub use http::HttpBackend;
pub use session_file::{FileSessionStore, MemorySessionStore};
