/// Geometry primitives shared by the decoders, the normalizer and the renderers
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Build a triangle from bare positions, using the face normal for every vertex
    pub fn from_positions(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        let n = (b - a).cross(&(c - a));
        let n = if n.norm() > f32::EPSILON {
            n.normalize()
        } else {
            Vector3::zeros()
        };
        let vertex = |p: Point3<f32>| Vertex {
            position: p,
            normal: n,
        };
        Self::new(vertex(a), vertex(b), vertex(c))
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` when there are none
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, p| Self {
            min: bounds.min.inf(p),
            max: bounds.max.sup(p),
        }))
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Length of the longest axis
    pub fn max_extent(&self) -> f32 {
        self.extent().max()
    }
}

/// Sphere enclosing a mesh, centred on its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Point3<f32>> {
        self.triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| &v.position))
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions())
    }

    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let center = self.bounds()?.center();
        let radius = self
            .positions()
            .map(|p| (p - center).norm())
            .fold(0.0_f32, f32::max);
        Some(BoundingSphere { center, radius })
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: Vector3<f32>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position += offset;
            }
        }
    }

    /// Create a simple cube mesh for testing
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let corner = |x: f32, y: f32, z: f32| Point3::new(x * half, y * half, z * half);
        // Each face as a quad wound counter-clockwise seen from outside
        let faces = [
            [(-1., -1., 1.), (1., -1., 1.), (1., 1., 1.), (-1., 1., 1.)],
            [(1., -1., -1.), (-1., -1., -1.), (-1., 1., -1.), (1., 1., -1.)],
            [(-1., 1., 1.), (1., 1., 1.), (1., 1., -1.), (-1., 1., -1.)],
            [(-1., -1., -1.), (1., -1., -1.), (1., -1., 1.), (-1., -1., 1.)],
            [(1., -1., 1.), (1., -1., -1.), (1., 1., -1.), (1., 1., 1.)],
            [(-1., -1., -1.), (-1., -1., 1.), (-1., 1., 1.), (-1., 1., -1.)],
        ];

        let mut mesh = Self::with_capacity(12);
        for quad in faces {
            let [a, b, c, d] = quad.map(|(x, y, z)| corner(x, y, z));
            mesh.add_triangle(Triangle::from_positions(a, b, c));
            mesh.add_triangle(Triangle::from_positions(a, c, d));
        }
        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_bounds() {
        let bounds = Mesh::cube(2.0).bounds().unwrap();
        assert!((bounds.min - Point3::new(-1.0, -1.0, -1.0)).norm() < 1e-6);
        assert!((bounds.max - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-6);
        assert!((bounds.max_extent() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        assert!(Mesh::new().bounds().is_none());
        assert!(Mesh::new().bounding_sphere().is_none());
    }

    #[test]
    fn test_cube_normals_point_outward() {
        for triangle in &Mesh::cube(2.0).triangles {
            let centroid = triangle
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.position.coords)
                / 3.0;
            assert!(triangle.calculate_normal().dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_translate_moves_bounds() {
        let mut mesh = Mesh::cube(2.0);
        mesh.translate(Vector3::new(5.0, 0.0, -1.0));
        let center = mesh.bounds().unwrap().center();
        assert!((center - Point3::new(5.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_bounding_sphere_radius() {
        let sphere = Mesh::cube(2.0).bounding_sphere().unwrap();
        assert!((sphere.radius - 3.0_f32.sqrt()).abs() < 1e-5);
    }
}
