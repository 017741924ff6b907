//! Surface materials and the named palette the settings panel chooses from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Phong-style surface description handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Diffuse colour as `0xRRGGBB`
    pub color: u32,
    pub specular: u32,
    pub shininess: f32,
    pub reflectivity: f32,
    pub opacity: f32,
    pub flat_shading: bool,
}

/// Returned whenever a renderable has no material of its own.
pub static FALLBACK_MATERIAL: Material = Material {
    color: 0xff0000,
    specular: 0x000000,
    shininess: 0.0,
    reflectivity: 0.0,
    opacity: 1.0,
    flat_shading: true,
};

impl Material {
    pub fn with_color(color: u32) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Reflective materials sample the skybox as an environment map.
    pub fn uses_environment_map(&self) -> bool {
        self.reflectivity > 0.0
    }

    /// Diffuse colour split into linear `[r, g, b]` in `0.0..=1.0`
    pub fn rgb(&self) -> [f32; 3] {
        let channel = |shift: u32| ((self.color >> shift) & 0xff) as f32 / 255.0;
        [channel(16), channel(8), channel(0)]
    }

    /// Pack `[r, g, b]` in `0.0..=1.0` into `0xRRGGBB`.
    pub fn pack_rgb(rgb: [f32; 3]) -> u32 {
        rgb.iter().fold(0, |acc, c| {
            (acc << 8) | (c.clamp(0.0, 1.0) * 255.0).round() as u32
        })
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            specular: 0x111111,
            shininess: 30.0,
            reflectivity: 0.0,
            opacity: 1.0,
            flat_shading: false,
        }
    }
}

/// Insertion-ordered `name -> Material` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialPalette {
    materials: IndexMap<String, Material>,
}

impl MaterialPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// The palette shipped with the viewer.
    pub fn builtin() -> Self {
        let mut palette = Self::new();
        palette.insert(
            "Gold",
            Material {
                color: 0xd4af37,
                specular: 0xffe8a0,
                shininess: 80.0,
                reflectivity: 0.3,
                ..Material::default()
            },
        );
        palette.insert(
            "Silver",
            Material {
                color: 0xc0c0c0,
                specular: 0xffffff,
                shininess: 100.0,
                reflectivity: 0.5,
                ..Material::default()
            },
        );
        palette.insert(
            "Plastic",
            Material {
                color: 0x2266cc,
                specular: 0x444444,
                shininess: 40.0,
                ..Material::default()
            },
        );
        palette.insert(
            "Clay",
            Material {
                color: 0xb5651d,
                specular: 0x000000,
                shininess: 2.0,
                ..Material::default()
            },
        );
        palette
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds or replaces a material; a replaced name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    /// Merge another palette into this one
    pub fn extend(&mut self, other: MaterialPalette) {
        self.materials.extend(other.materials);
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.names().next()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_opaque_red() {
        assert_eq!(FALLBACK_MATERIAL.color, 0xff0000);
        assert_eq!(FALLBACK_MATERIAL.opacity, 1.0);
        assert!(FALLBACK_MATERIAL.flat_shading);
        assert_eq!(FALLBACK_MATERIAL.rgb(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pack_rgb() {
        assert_eq!(Material::pack_rgb([1.0, 0.5, 0.0]), 0xff8000);
        assert_eq!(Material::pack_rgb([2.0, -1.0, 1.0]), 0xff00ff);
    }

    #[test]
    fn test_palette_from_json_keeps_order() {
        let palette = MaterialPalette::from_json(
            r#"{"Zinc": {"color": 8421504}, "Amber": {"color": 16750848, "reflectivity": 0.2}}"#,
        )
        .unwrap();
        assert_eq!(palette.names().collect::<Vec<_>>(), vec!["Zinc", "Amber"]);
        assert_eq!(palette.first_name(), Some("Zinc"));
        let amber = palette.get("Amber").unwrap();
        assert!(amber.uses_environment_map());
        assert_eq!(amber.opacity, 1.0);
    }

    #[test]
    fn test_builtin_palette() {
        let palette = MaterialPalette::builtin();
        assert_eq!(palette.len(), 4);
        assert!(palette.get("Gold").unwrap().uses_environment_map());
        assert!(!palette.get("Clay").unwrap().uses_environment_map());
    }
}
