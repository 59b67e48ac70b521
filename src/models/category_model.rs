//! models/category_model.rs
//! Categorías de prenda y género del modelo de preview.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::StudioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    UpperBody,
    LowerBody,
    Dresses,
    Footwear,
    Headwear,
}

impl Category {
    /// Orden en el que se ofrecen al usuario
    pub const ALL: [Category; 5] = [
        Category::UpperBody,
        Category::LowerBody,
        Category::Dresses,
        Category::Footwear,
        Category::Headwear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::UpperBody => "upper_body",
            Category::LowerBody => "lower_body",
            Category::Dresses => "dresses",
            Category::Footwear => "footwear",
            Category::Headwear => "headwear",
        }
    }

    /// El modelo de try-on sólo acepta estas tres
    pub fn is_tryon_supported(&self) -> bool {
        matches!(
            self,
            Category::UpperBody | Category::LowerBody | Category::Dresses
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| StudioError::BadRequest(format!("Unknown garment category: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}
