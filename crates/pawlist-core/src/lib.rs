//! Core of pawlist: the signed-in user and their pet and shelter favourites.
//!
//! The authentication backend and the cache/sync store are ports
//! ([`user::SessionProvider`], [`favourite::DataStore`]); adapters live in
//! `pawlist-infrastructure`.

pub mod config;
pub mod error;
pub mod favourite;
pub mod user;

// Re-export common error type
pub use error::PawlistError;
