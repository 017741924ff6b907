/// Object rotation for the trackball scheme and model matrix helpers
use nalgebra::{Matrix4, Rotation3};

/// Rotation state around three axes (in radians), with angular velocity
/// that decays by the damping factor every step
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    velocity: (f32, f32),
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            velocity: (0.0, 0.0),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotate and keep spinning afterwards; roll is disabled for the trackball.
    pub fn spin(&mut self, dx: f32, dy: f32) {
        self.rotate(dx, dy, 0.0);
        self.velocity = (dx, dy);
    }

    /// Advance the spin one step. Returns whether the object moved.
    pub fn step(&mut self, damping: f32) -> bool {
        let (vx, vy) = self.velocity;
        if vx.abs() < 1e-4 && vy.abs() < 1e-4 {
            self.velocity = (0.0, 0.0);
            return false;
        }
        self.rotate(vx, vy, 0.0);
        let keep = 1.0 - damping.clamp(0.0, 1.0);
        self.velocity = (vx * keep, vy * keep);
        true
    }
}

/// Matrices for the object container and the models inside it
pub struct Transform;

impl Transform {
    /// Euler rotation applied as roll about x, then pitch about y, then yaw about z
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        Rotation3::from_euler_angles(rotation.x, rotation.y, rotation.z).to_homogeneous()
    }

    /// Rotation of the container followed by the model's own uniform scale
    pub fn model_matrix(rotation: &RotationState, scale: f32) -> Matrix4<f32> {
        Self::rotation_matrix(rotation) * Matrix4::new_scaling(scale)
    }
}
