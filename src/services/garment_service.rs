//! services/garment_service.rs
//! Categorización y descripción de la prenda a partir de los tags del clasificador.
//! Todo es puro: sólo tablas de palabras clave.

use std::collections::HashSet;

use crate::models::category_model::Category;

/// Descripción por defecto cuando ningún tag es reconocido
pub const FALLBACK_DESCRIPTION: &str = "fashion garment";

const DRESS_TAGS: &[&str] = &["dress", "gown"];
const HEADWEAR_TAGS: &[&str] = &["cap", "hat", "beanie", "beret"];
const FOOTWEAR_TAGS: &[&str] = &[
    "shoe",
    "shoes",
    "sneaker",
    "sneakers",
    "boots",
    "loafers",
    "heels",
    "sandal",
    "clog",
    "geta",
    "patten",
    "sabot",
    "loafer",
    "doormat",
    "welcome mat",
    "shoe shop",
    "shoe-shop",
    "shoe store",
];
const LOWER_BODY_TAGS: &[&str] = &[
    "pants", "trousers", "jeans", "jean", "blue jean", "denim", "shorts", "skirt", "cargo",
    "chinos", "joggers", "leggings",
];
const UPPER_BODY_TAGS: &[&str] = &[
    "t-shirt",
    "tee",
    "shirt",
    "top",
    "hoodie",
    "sweatshirt",
    "sweater",
    "jacket",
    "coat",
    "kurta",
    "blouse",
    "polo",
    "tank",
    "cardigan",
];

// Tablas de la descripción
const TEE_TAGS: &[&str] = &["t-shirt", "shirt", "top", "tee"];
const UPPER_GARMENTS: &[&str] = &[
    "hoodie",
    "sweatshirt",
    "sweater",
    "jacket",
    "coat",
    "kurta",
    "blouse",
    "polo",
    "tank",
    "cardigan",
];
const TROUSERS: &[&str] = &[
    "pants", "jeans", "trousers", "shorts", "cargo", "chinos", "joggers", "leggings",
];
const COLOURS: &[&str] = &[
    "black", "white", "red", "blue", "green", "yellow", "beige", "brown", "grey", "gray",
];
const NECKLINES: &[&str] = &["round-neck", "v-neck", "collared"];
const SLEEVES: &[&str] = &["short-sleeve", "long-sleeve"];
const FITS: &[&str] = &["slim-fit", "oversized", "regular-fit"];
/// Calzado en la descripción: incluye "running shoe", que no cambia la categoría
const SHOES: &[&str] = &[
    "shoe",
    "running shoe",
    "shoes",
    "sneaker",
    "sneakers",
    "boots",
    "loafers",
    "heels",
    "sandal",
    "clog",
    "geta",
    "patten",
    "sabot",
    "loafer",
    "doormat",
    "welcome mat",
    "shoe shop",
    "shoe-shop",
    "shoe store",
];

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Categoría inferida. El orden de las reglas importa: un vestido gana a todo,
/// y sin coincidencias se asume `upper_body`.
pub fn infer_category(tags: &[String]) -> Category {
    let set: HashSet<String> = tags.iter().map(|t| normalize(t)).collect();
    let hits = |table: &[&str]| table.iter().any(|k| set.contains(*k));

    let rules: [(&[&str], Category); 5] = [
        (DRESS_TAGS, Category::Dresses),
        (HEADWEAR_TAGS, Category::Headwear),
        (FOOTWEAR_TAGS, Category::Footwear),
        (LOWER_BODY_TAGS, Category::LowerBody),
        (UPPER_BODY_TAGS, Category::UpperBody),
    ];

    rules
        .iter()
        .find(|(table, _)| hits(table))
        .map(|(_, category)| *category)
        .unwrap_or_default()
}

/// Descripción corta de la prenda ("t-shirt, black, v-neck") para prompts y try-on.
pub fn describe_garment(tags: &[String]) -> String {
    let mut terms: Vec<String> = Vec::new();
    let push_unique = |terms: &mut Vec<String>, term: &str| {
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    };

    for raw in tags {
        let tag = normalize(raw);
        let t = tag.as_str();

        if TEE_TAGS.contains(&t) {
            push_unique(&mut terms, "t-shirt");
        } else if UPPER_GARMENTS.contains(&t) {
            push_unique(&mut terms, t);
        } else if TROUSERS.contains(&t) {
            push_unique(&mut terms, if t == "shorts" { "shorts" } else { "pants" });
        } else if DRESS_TAGS.contains(&t) {
            push_unique(&mut terms, "dress");
        } else if t == "skirt" {
            push_unique(&mut terms, "skirt");
        } else if SHOES.contains(&t) {
            // una vez que hay "sneakers" no se agrega más calzado
            if !terms.iter().any(|x| x == "sneakers") {
                let term = if t.contains("sneaker") { "sneakers" } else { "shoes" };
                push_unique(&mut terms, term);
            }
        } else if HEADWEAR_TAGS.contains(&t)
            || COLOURS.contains(&t)
            || NECKLINES.contains(&t)
            || SLEEVES.contains(&t)
            || FITS.contains(&t)
        {
            push_unique(&mut terms, t);
        }
    }

    if terms.is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        terms.join(", ")
    }
}
