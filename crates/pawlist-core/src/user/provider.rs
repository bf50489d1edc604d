//! Session provider trait.
//!
//! Defines the interface to the authentication backend.

use async_trait::async_trait;

use super::model::{SignupRequest, UserRecord};
use crate::error::Result;

/// An abstract authentication backend.
///
/// The provider owns the session: which user is active, how credentials are
/// checked, and how password resets are delivered. It is injected into
/// [`UserService`](super::UserService) so that independent sessions (one per
/// test, for instance) never share hidden global state.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the record of the currently active session, if any.
    fn active_user(&self) -> Option<UserRecord>;

    /// Authenticates with username and password and makes the user active.
    ///
    /// # Returns
    ///
    /// - `Ok(UserRecord)`: Credentials accepted
    /// - `Err(PawlistError::Authentication)`: Credentials rejected
    /// - `Err(_)`: Transport or backend failure
    async fn login(&self, username: &str, password: &str) -> Result<UserRecord>;

    /// Creates an account and makes it the active user.
    async fn signup(&self, request: SignupRequest) -> Result<UserRecord>;

    /// Ends the active session. Succeeds when no session is active.
    async fn logout(&self) -> Result<()>;

    /// Starts a password reset for `username`.
    ///
    /// The returned value is backend specific and passed through untouched.
    async fn reset_password(&self, username: &str) -> Result<serde_json::Value>;
}
