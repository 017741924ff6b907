/// Perspective camera looking at the origin of the object container
use nalgebra::{Matrix4, Point3, Vector3};

/// Distance from the origin the camera starts at, in scene units
pub const DEFAULT_DISTANCE: f32 = 120.0;

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, DEFAULT_DISTANCE),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 60f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            near: 0.01,
            far: 12000.0,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Rotate the eye around the target (view control scheme).
    ///
    /// The polar angle is kept away from the poles so `up` stays valid.
    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }
        let azimuth = offset.x.atan2(offset.z) + d_azimuth;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() + d_polar)
            .clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vector3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );
    }

    /// Move toward (`factor < 1`) or away from the target.
    pub fn zoom(&mut self, factor: f32) {
        let offset = (self.position - self.target) * factor.max(0.0);
        let distance = offset.norm().clamp(self.near * 10.0, self.far * 0.5);
        if let Some(direction) = offset.try_normalize(f32::EPSILON) {
            self.position = self.target + direction * distance;
        }
    }

    /// Project a 3D point to 2D screen space, returning `(x, y, depth)`
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        let clip = mvp * point.to_homogeneous();

        // Behind the eye or degenerate
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}
