use serde::{Deserialize, Serialize};

/// Root configuration, as stored in `config.toml`.
///
/// Every section is optional; missing sections and keys fall back to the
/// defaults below.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PawlistConfig {
    pub collections: CollectionNames,
    pub assets: AssetConfig,
    pub logging: LoggingConfig,
}

impl PawlistConfig {
    /// Parses a configuration document.
    pub fn from_toml_str(content: &str) -> crate::error::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Names of the store collections holding each favourites list.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CollectionNames {
    pub pets: String,
    pub shelters: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            pets: "pets".to_string(),
            shelters: "shelters".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetConfig {
    /// Base path prepended to bundled asset paths.
    pub base: String,
    /// Placeholder used when a pet has no photo of `image_size`.
    pub generic_pet_image: String,
    /// Photo size picked for favourite pet thumbnails.
    pub image_size: u8,
}

impl AssetConfig {
    /// Resolved placeholder path, e.g. `assets/images/generic-pet.jpg`.
    pub fn placeholder_image(&self) -> String {
        let base = self.base.trim_end_matches('/');
        let image = self.generic_pet_image.trim_start_matches('/');
        if base.is_empty() {
            format!("/{}", image)
        } else {
            format!("{}/{}", base, image)
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base: "assets".to_string(),
            generic_pet_image: "images/generic-pet.jpg".to_string(),
            image_size: 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
