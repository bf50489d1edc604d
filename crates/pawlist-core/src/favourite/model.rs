//! Favourite records and the catalogue entities they are projected from.

use serde::{Deserialize, Serialize};

use super::store::Record;

/// A pet saved to the favourites list.
///
/// Stored with the wire names `_id`, `name` and `img`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouritePet {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "img")]
    pub image_url: String,
}

impl FavouritePet {
    /// Reduces a catalogue pet to its favourite record.
    ///
    /// The image is the first photo of `image_size`, else `placeholder`.
    pub fn from_pet(pet: &Pet, image_size: u8, placeholder: &str) -> Self {
        Self {
            id: pet.id.clone(),
            name: pet.name.clone(),
            image_url: pet.media.first_image(image_size, placeholder),
        }
    }
}

impl Record for FavouritePet {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A shelter saved to the favourites list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavouriteShelter {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl From<&Shelter> for FavouriteShelter {
    fn from(shelter: &Shelter) -> Self {
        Self {
            id: shelter.id.clone(),
            name: shelter.name.clone().unwrap_or_default(),
            phone: shelter.phone.clone().unwrap_or_default(),
            email: shelter.email.clone().unwrap_or_default(),
        }
    }
}

impl Record for FavouriteShelter {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Pet as returned by the pet catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub media: PetMedia,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetMedia {
    #[serde(default)]
    pub photos: Vec<PetPhoto>,
}

impl PetMedia {
    /// URL of the first photo with the given size, or `fallback`.
    pub fn first_image(&self, size: u8, fallback: &str) -> String {
        self.photos
            .iter()
            .find(|photo| photo.size == size)
            .map(|photo| photo.url.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetPhoto {
    pub size: u8,
    pub url: String,
}

/// Shelter as returned by the pet catalogue. Contact fields may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
