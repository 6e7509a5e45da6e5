//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

mod backend;
mod session_store;

pub use backend::BackendApi;
pub use session_store::SessionStore;
