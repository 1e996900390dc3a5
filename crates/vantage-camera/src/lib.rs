mod input;

pub use input::{InputState, cursor_to_ndc};

use glam::{Mat4, Vec2, Vec3, Vec4};
use winit::keyboard::KeyCode;

pub const FOV_Y_DEGREES: f32 = 45.0;
pub const Z_NEAR: f32 = 0.2;
pub const Z_FAR: f32 = 256.0;

/// A half-line in world space; `direction` is unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Look-at camera with a projection fixed when it is created.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,
    projection: Mat4,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let aspect = (width.max(1) as f32) / (height.max(1) as f32);
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            look_at: Vec3::ZERO,
            projection: Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR),
        }
    }

    pub fn set(&mut self, position: Vec3, look_at: Vec3) {
        self.position = position;
        self.look_at = look_at;
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        let forward = (self.look_at - self.position).normalize_or_zero();
        // Straight up or down has no usable Y-up reference.
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.look_at, up)
    }

    /// World-space ray from the camera through the NDC point `ndc`.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let eye = self.projection.inverse() * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let eye = Vec4::new(eye.x, eye.y, -1.0, 0.0);
        let world = self.view().inverse() * eye;
        Ray {
            origin: self.position,
            direction: world.truncate().normalize(),
        }
    }

    /// NDC position of a world point, or `None` behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.projection * self.view() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        Some(Vec2::new(clip.x, clip.y) / clip.w)
    }
}

/// Orbits the origin on a sphere of fixed radius, steered by two angles.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitController {
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
    step: f32,
}

impl OrbitController {
    pub fn new(theta: f32, phi: f32, radius: f32, step: f32) -> Self {
        Self {
            theta,
            phi,
            radius,
            step,
        }
    }

    /// Applies one frame of held keys: A/D turn `theta`, W/S turn `phi`.
    pub fn update(&mut self, input: &InputState) {
        if input.is_down(KeyCode::KeyA) {
            self.theta += self.step;
        }
        if input.is_down(KeyCode::KeyD) {
            self.theta -= self.step;
        }
        if input.is_down(KeyCode::KeyW) {
            self.phi += self.step;
        }
        if input.is_down(KeyCode::KeyS) {
            self.phi -= self.step;
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (st, ct) = self.theta.sin_cos();
        let (sp, cp) = self.phi.sin_cos();
        Vec3::new(ct * cp, ct * sp, st) * self.radius
    }
}
