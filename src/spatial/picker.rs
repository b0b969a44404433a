/// Proximity picking against oriented boxes

use cgmath::{InnerSpace, Quaternion, Rotation, Vector3};

/// A box with a center, an orientation and half-extents along its local axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub half_extents: Vector3<f32>,
}

impl OrientedBox {
    pub fn new(center: Vector3<f32>, rotation: Quaternion<f32>, half_extents: Vector3<f32>) -> Self {
        Self {
            center,
            rotation,
            half_extents,
        }
    }
}

/// Approximate distance from `point` to the surface of `bounds`.
///
/// Zero when the point is inside or touching the box. Exact along faces and
/// edges; only good enough near corners for threshold comparisons.
pub fn distance_to_surface(point: Vector3<f32>, bounds: &OrientedBox) -> f32 {
    let local = bounds.rotation.conjugate().rotate_vector(point - bounds.center);

    let dx = (local.x.abs() - bounds.half_extents.x).max(0.0);
    let dy = (local.y.abs() - bounds.half_extents.y).max(0.0);
    let dz = (local.z.abs() - bounds.half_extents.z).max(0.0);

    if dx == 0.0 && dy == 0.0 && dz == 0.0 {
        return 0.0;
    }
    Vector3::new(dx, dy, dz).magnitude()
}

/// Nearest candidate strictly closer than `max_distance`.
///
/// Ties keep the first candidate in iteration order.
pub fn pick_nearest<K, I>(point: Vector3<f32>, candidates: I, max_distance: f32) -> Option<(K, f32)>
where
    I: IntoIterator<Item = (K, OrientedBox)>,
{
    let mut best: Option<(K, f32)> = None;
    let mut best_distance = max_distance;

    for (key, bounds) in candidates {
        let distance = distance_to_surface(point, &bounds);
        if distance < best_distance {
            best_distance = distance;
            best = Some((key, distance));
        }
    }

    best
}
