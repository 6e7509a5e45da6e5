//! Session storage port

use crate::domain::result::Result;
use crate::domain::Session;

/// Where the current session lives between invocations
pub trait SessionStore: Send + Sync {
    /// Current session, if any
    fn load(&self) -> Result<Option<Session>>;

    /// Replace the stored session
    fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored session; succeeds when nothing is stored
    fn clear(&self) -> Result<()>;
}
