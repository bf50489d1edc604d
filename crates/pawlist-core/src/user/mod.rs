//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: `User`, the backend `UserRecord` it is projected from, signup payload
//! - `provider`: `SessionProvider`, the authentication backend port
//! - `service`: `UserService`, current user and favourites
//!
//! # Usage
//!
//! ```ignore
//! use pawlist_core::user::{AuthOutcome, SessionProvider, User, UserService};
//! ```

mod model;
mod provider;
mod service;

#[cfg(test)]
mod service_test;

// Re-export public API
pub use model::{SignupRequest, User, UserRecord, parse_user};
pub use provider::SessionProvider;
pub use service::{AuthOutcome, UserService};
