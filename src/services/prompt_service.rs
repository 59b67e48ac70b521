//! services/prompt_service.rs
//! Prompts (positivo y negativo) para generar las previews de modelo.

use crate::models::category_model::{Category, Gender};
use crate::services::garment_service::describe_garment;

/// Vistas que se reparten entre las previews, en orden circular
pub const PREVIEW_VIEWS: [&str; 3] = [
    "front view",
    "left three-quarter view",
    "right three-quarter view",
];

const BASE_NEGATIVE: &str = "text, watermark, logo, multiple people, clutter, blur, low-res, artifacts, overexposed, underexposed";
const ANATOMY_NEGATIVE: &str = "text, watermark, logo, multiple people, clutter, blur, low-res, artifacts, bad anatomy, extra limbs, overexposed, underexposed";

/// Encuadre, ropa base, pose y prompt negativo de cada categoría
struct Framing {
    framing: &'static str,
    outfit: &'static str,
    pose: &'static str,
    negative: String,
}

fn framing_for(category: Category) -> Framing {
    match category {
        Category::UpperBody => Framing {
            framing: "tight shoulders-to-waist crop{v}, face out of frame, focus on chest, sleeves and torso",
            outfit: "plain close-fit neutral top",
            pose: "arms slightly away from torso",
            negative: format!("face, eyes, head, {}", ANATOMY_NEGATIVE),
        },
        Category::LowerBody => Framing {
            framing: "full view from hips to shoes{v}, torso cropped above hips, focus on pants and legs",
            outfit: "plain neutral fitted pants",
            pose: "standing straight, legs visible, feet shoulder-width",
            negative: format!(
                "upper body, bare chest, shirt, t-shirt, hoodie, jacket, torso, face, head, {}",
                ANATOMY_NEGATIVE
            ),
        },
        Category::Dresses => Framing {
            framing: "knee-up crop{v}, full dress silhouette in frame",
            outfit: "plain neutral dress",
            pose: "hands relaxed by sides",
            negative: ANATOMY_NEGATIVE.to_string(),
        },
        Category::Footwear => Framing {
            framing: "close-up feet and lower legs{v}, shoes centered, entire shoe visible",
            outfit: "neutral ankle-length pants exposing shoes",
            pose: "standing, feet flat on ground",
            negative: BASE_NEGATIVE.to_string(),
        },
        Category::Headwear => Framing {
            framing: "tight head-and-shoulders crop{v}, headwear centered",
            outfit: "plain neutral top with simple neckline",
            pose: "neutral expression",
            negative: BASE_NEGATIVE.to_string(),
        },
    }
}

/// Devuelve `(positivo, negativo)`. `view_hint` se inserta dentro del encuadre.
pub fn build_prompts(
    tags: &[String],
    category: Category,
    view_hint: Option<&str>,
    gender: Gender,
) -> (String, String) {
    let description = describe_garment(tags);
    let view = view_hint
        .filter(|v| !v.trim().is_empty())
        .map(|v| format!(", {}", v))
        .unwrap_or_default();

    let spec = framing_for(category);
    let framing = spec.framing.replace("{v}", &view);

    let positive = format!(
        "photo of a {} fashion model, {}, {}, studio lighting, soft shadows, high detail, 85mm look, seamless backdrop, {}, sharp focus, photorealistic, emphasizing {}",
        gender.as_str(),
        framing,
        spec.outfit,
        spec.pose,
        description
    );

    (positive, spec.negative)
}

/// Vista asignada a la preview `index`
pub fn view_for(index: usize) -> &'static str {
    PREVIEW_VIEWS[index % PREVIEW_VIEWS.len()]
}
