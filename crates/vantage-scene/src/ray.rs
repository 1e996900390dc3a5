use glam::Vec3;
use vantage_3d::Plane;
use vantage_camera::Ray;

/// Below this `|dot(direction, normal)|` the ray is treated as parallel.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Where `ray` meets `plane`, if it does so in front of the ray origin.
///
/// Parallel rays, planes behind the origin and degenerate normals all yield
/// `None`, so callers never see a non-finite point.
pub fn intersect_plane(ray: &Ray, plane: &Plane) -> Option<Vec3> {
    let denom = ray.direction.dot(plane.normal);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = -(ray.origin - plane.origin).dot(plane.normal) / denom;
    if !t.is_finite() || t < 0.0 {
        return None;
    }
    let point = ray.at(t);
    point.is_finite().then_some(point)
}
