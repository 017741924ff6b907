//! Turns freshly loaded geometry into a centred, fitted renderable.

use nalgebra::Point3;

use crate::geometry::{Aabb, BoundingSphere, Mesh};
use crate::material::{Material, FALLBACK_MATERIAL};
use crate::node::{LoadedGeometry, MeshNode, NodeKind, Renderable};

/// Longest axis of every normalized model, in scene units
pub const CANONICAL_SIZE: f32 = 80.0;

/// Raised when a bounding box has no extent to scale against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateGeometry;

/// Centre raw meshes on their bounding box and wrap them in a renderable.
///
/// Prebuilt nodes are passed through untouched. The returned mesh node has
/// unit scale; call [`compute_fit_scale`] to size it.
pub fn normalize(geometry: LoadedGeometry, material: Option<Material>) -> Renderable {
    match geometry {
        LoadedGeometry::Raw(mesh) => Renderable::new(NodeKind::Mesh(center_mesh(mesh, material))),
        LoadedGeometry::Prebuilt(node) => Renderable::new(NodeKind::Group(node)),
    }
}

fn center_mesh(mut mesh: Mesh, material: Option<Material>) -> MeshNode {
    let origin = Aabb::new(Point3::origin(), Point3::origin());
    if let Some(bounds) = mesh.bounds() {
        mesh.translate(-bounds.center().coords);
    }
    let bounds = mesh.bounds().unwrap_or(origin);
    let sphere = mesh.bounding_sphere().unwrap_or(BoundingSphere {
        center: origin.center(),
        radius: 0.0,
    });

    MeshNode {
        mesh,
        bounds,
        sphere,
        scale: 1.0,
        material,
        cast_shadow: true,
        receive_shadow: true,
    }
}

/// Uniform scale that makes the longest bounding-box axis `canonical_size`.
pub fn compute_fit_scale(node: &MeshNode, canonical_size: f32) -> Result<f32, DegenerateGeometry> {
    let longest = node.bounds.max_extent();
    if !longest.is_finite() || longest <= 0.0 {
        return Err(DegenerateGeometry);
    }
    Ok(canonical_size / longest)
}

/// The renderable's own material, or the shared fallback.
pub fn material_or_fallback(renderable: &Renderable) -> &Material {
    renderable.material().unwrap_or(&FALLBACK_MATERIAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::node::SceneNode;

    fn box_mesh(min: [f32; 3], max: [f32; 3]) -> Mesh {
        let mut mesh = Mesh::cube(2.0);
        let (min, max) = (Point3::from(min), Point3::from(max));
        for triangle in &mut mesh.triangles {
            for vertex in &mut triangle.vertices {
                let p = vertex.position;
                vertex.position = Point3::new(
                    if p.x < 0.0 { min.x } else { max.x },
                    if p.y < 0.0 { min.y } else { max.y },
                    if p.z < 0.0 { min.z } else { max.z },
                );
            }
        }
        mesh
    }

    #[test]
    fn test_centers_on_origin() {
        let renderable = normalize(
            LoadedGeometry::Raw(box_mesh([2.0, 3.0, -7.0], [12.0, 5.0, 1.0])),
            None,
        );
        let node = renderable.as_mesh().unwrap();
        assert!(node.bounds.center().coords.norm() < 1e-4);
        assert!((node.sphere.center.coords.norm()) < 1e-4);
        assert!(node.cast_shadow && node.receive_shadow);
        assert_eq!(node.scale, 1.0);
    }

    #[test]
    fn test_fit_scale_reaches_canonical_size() {
        let renderable = normalize(
            LoadedGeometry::Raw(box_mesh([-10.0, -5.0, -2.0], [10.0, 5.0, 2.0])),
            None,
        );
        let node = renderable.as_mesh().unwrap();
        let scale = compute_fit_scale(node, CANONICAL_SIZE).unwrap();
        assert!((scale - 4.0).abs() < 1e-5);
        assert!((node.bounds.max_extent() * scale - CANONICAL_SIZE).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_geometry() {
        let point = Point3::new(3.0, 3.0, 3.0);
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::from_positions(point, point, point));
        let renderable = normalize(LoadedGeometry::Raw(mesh), None);
        assert_eq!(
            compute_fit_scale(renderable.as_mesh().unwrap(), CANONICAL_SIZE),
            Err(DegenerateGeometry)
        );

        // Tiny is not degenerate
        let tiny = normalize(
            LoadedGeometry::Raw(box_mesh([0.0, 0.0, 0.0], [1e-8, 0.0, 0.0])),
            None,
        );
        let scale = compute_fit_scale(tiny.as_mesh().unwrap(), CANONICAL_SIZE).unwrap();
        assert!((tiny.as_mesh().unwrap().bounds.max_extent() * scale - CANONICAL_SIZE).abs() < 1e-2);

        let empty = normalize(LoadedGeometry::Raw(Mesh::new()), None);
        assert_eq!(
            compute_fit_scale(empty.as_mesh().unwrap(), CANONICAL_SIZE),
            Err(DegenerateGeometry)
        );
    }

    #[test]
    fn test_prebuilt_passes_through() {
        let node = SceneNode {
            name: Some("world".into()),
            parts: Vec::new(),
        };
        let renderable = normalize(LoadedGeometry::Prebuilt(node.clone()), None);
        assert_eq!(renderable.kind(), &NodeKind::Group(node));
    }

    #[test]
    fn test_material_fallback() {
        let mut renderable = normalize(LoadedGeometry::Raw(Mesh::cube(1.0)), None);
        assert_eq!(material_or_fallback(&renderable), &FALLBACK_MATERIAL);

        let gold = Material::with_color(0xd4af37);
        renderable.set_material(gold);
        assert_eq!(material_or_fallback(&renderable).color, 0xd4af37);
    }
}
