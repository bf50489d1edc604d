//! Favourites domain module.
//!
//! # Module Structure
//!
//! - `model`: favourite records and the catalogue `Pet`/`Shelter` they come from
//! - `store`: `Record`, `Collection` and `DataStore` ports
//! - `stream`: `FavouritesStream`, the per-user derived query stream

mod model;
mod store;
mod stream;

pub use model::{FavouritePet, FavouriteShelter, Pet, PetMedia, PetPhoto, Shelter};
pub use store::{Collection, DataStore, Record};
pub use stream::{FavouritesStream, user_changes};
