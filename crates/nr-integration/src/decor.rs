//! Room decor configuration
//!
//! Decor is optional dressing: a missing or unreadable config falls back to
//! the built-in layout, and individual bad entries are skipped rather than
//! failing the whole file.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub type Vec3 = [f64; 3];
pub type Vec2 = [f64; 2];

const DEFAULT_POSTER_SIZE: Vec2 = [1.1, 1.6];
const DEFAULT_FRAME_COLOR: &str = "#111216";

/// Uniform or per-axis scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecorScale {
    Uniform(f64),
    PerAxis(Vec3),
}

/// What a decor item renders as
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecorKind {
    Model {
        #[serde(rename = "modelUrl")]
        model_url: String,
    },
    Poster {
        #[serde(rename = "textureUrl")]
        texture_url: String,
        size: Vec2,
        #[serde(rename = "frameColor")]
        frame_color: String,
    },
}

/// A placed piece of decor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecorItem {
    pub id: String,
    pub enabled: bool,
    pub position: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<DecorScale>,
    #[serde(flatten)]
    pub kind: DecorKind,
}

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn as_vec3(value: Option<&Value>) -> Option<Vec3> {
    match value?.as_array()?.as_slice() {
        [x, y, z] => Some([finite(x)?, finite(y)?, finite(z)?]),
        _ => None,
    }
}

fn as_vec2(value: Option<&Value>) -> Option<Vec2> {
    match value?.as_array()?.as_slice() {
        [x, y] => Some([finite(x)?, finite(y)?]),
        _ => None,
    }
}

fn as_str<'a>(item: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    item.get(key)?.as_str()
}

fn parse_scale(value: Option<&Value>) -> Option<DecorScale> {
    let value = value?;
    finite(value)
        .map(DecorScale::Uniform)
        .or_else(|| as_vec3(Some(value)).map(DecorScale::PerAxis))
}

/// Parse one entry; `None` when it is not a usable item
pub fn parse_decor_item(entry: &Value) -> Option<DecorItem> {
    let item = entry.as_object()?;
    let id = as_str(item, "id").filter(|s| !s.is_empty())?;
    let kind = as_str(item, "kind").filter(|s| !s.is_empty())?;
    let position = as_vec3(item.get("position"))?;

    let kind = match kind {
        "model" => DecorKind::Model {
            model_url: as_str(item, "modelUrl").filter(|s| !s.is_empty())?.to_string(),
        },
        "poster" => DecorKind::Poster {
            texture_url: as_str(item, "textureUrl").filter(|s| !s.is_empty())?.to_string(),
            size: as_vec2(item.get("size")).unwrap_or(DEFAULT_POSTER_SIZE),
            frame_color: as_str(item, "frameColor")
                .unwrap_or(DEFAULT_FRAME_COLOR)
                .to_string(),
        },
        _ => return None,
    };

    Some(DecorItem {
        id: id.to_string(),
        enabled: item.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        position,
        rotation: as_vec3(item.get("rotation")),
        scale: parse_scale(item.get("scale")),
        kind,
    })
}

/// Parse a decor payload: an array of items or `{ "items": [...] }`.
///
/// Any other shape yields no items. Disabled items are dropped.
pub fn parse_decor_payload(payload: &Value) -> Vec<DecorItem> {
    let raw_items = match payload {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("items") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    raw_items
        .iter()
        .filter_map(parse_decor_item)
        .filter(|item| item.enabled)
        .collect()
}

/// Built-in decor layout
pub fn default_decor_items() -> Vec<DecorItem> {
    vec![
        DecorItem {
            id: "poster-left".to_string(),
            enabled: true,
            position: [-2.4, 1.6, -2.95],
            rotation: None,
            scale: None,
            kind: DecorKind::Poster {
                texture_url: "/decor/posters/poster-left.jpg".to_string(),
                size: DEFAULT_POSTER_SIZE,
                frame_color: DEFAULT_FRAME_COLOR.to_string(),
            },
        },
        DecorItem {
            id: "plant-corner".to_string(),
            enabled: true,
            position: [2.6, 0.0, -2.5],
            rotation: Some([0.0, -0.6, 0.0]),
            scale: Some(DecorScale::Uniform(0.9)),
            kind: DecorKind::Model {
                model_url: "/decor/models/potted_plant.glb".to_string(),
            },
        },
    ]
}

/// Load decor items from `path`.
///
/// Unreadable files and malformed JSON fall back to [`default_decor_items`].
pub fn load_decor_items(path: &Path) -> Vec<DecorItem> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Decor config {} unavailable ({}), using defaults", path.display(), e);
            return default_decor_items();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(payload) => parse_decor_payload(&payload),
        Err(e) => {
            debug!("Decor config {} is not valid JSON ({}), using defaults", path.display(), e);
            default_decor_items()
        }
    }
}
