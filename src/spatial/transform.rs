/// Rigid transforms with uniform scale
///
/// Poses in the album are a position, a rotation and one uniform scale factor.
/// Euler angles follow the Y-X-Z composition used by the album document:
/// a rotation `[x, y, z]` in degrees is `yaw(y) * pitch(x) * roll(z)`.

use cgmath::{Deg, InnerSpace, Matrix3, One, Quaternion, Rad, Rotation, Rotation3, Vector3, Zero};

/// Position + rotation, as reported for a tracked hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Pose {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vector3<f32>) -> Self {
        Self::new(position, Quaternion::one())
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(Vector3::unit_y())
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(Vector3::unit_z())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vector3::zero())
    }
}

impl From<Pose> for Transform {
    fn from(pose: Pose) -> Self {
        Transform::new(pose.position, pose.rotation, 1.0)
    }
}

/// Similarity transform: scale, then rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: f32,
}

impl Transform {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>, scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zero(), Quaternion::one(), 1.0)
    }

    /// Transform placed by an album entry's position and Euler rotation
    pub fn from_euler_degrees(position: Vector3<f32>, euler: Vector3<f32>) -> Self {
        Self::new(position, euler_to_quaternion(euler), 1.0)
    }

    pub fn transform_point(&self, point: Vector3<f32>) -> Vector3<f32> {
        self.position + self.rotation.rotate_vector(point * self.scale)
    }

    /// `self` applied after `child`: the world transform of a node whose local
    /// transform is `child` and whose parent sits at `self`
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.conjugate();
        let scale = 1.0 / self.scale;
        Transform {
            position: rotation.rotate_vector(-self.position) * scale,
            rotation,
            scale,
        }
    }

    /// Local transform that keeps `world` in place under a parent at `parent`
    pub fn relative_to(world: &Transform, parent: &Transform) -> Transform {
        parent.inverse().compose(world)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rotation for Euler angles in degrees (`yaw(y) * pitch(x) * roll(z)`)
pub fn euler_to_quaternion(euler: Vector3<f32>) -> Quaternion<f32> {
    Quaternion::from_angle_y(Deg(euler.y))
        * Quaternion::from_angle_x(Deg(euler.x))
        * Quaternion::from_angle_z(Deg(euler.z))
}

/// Euler angles in degrees, each wrapped to `[0, 360)`
pub fn quaternion_to_euler(rotation: Quaternion<f32>) -> Vector3<f32> {
    // cgmath matrices are column-major: m[col][row]
    let m = Matrix3::from(rotation.normalize());
    let m00 = m[0][0];
    let m02 = m[2][0];
    let m10 = m[0][1];
    let m11 = m[1][1];
    let m12 = m[2][1];
    let m20 = m[0][2];
    let m22 = m[2][2];

    let sin_x = (-m12).clamp(-1.0, 1.0);
    let x = sin_x.asin();
    let (y, z) = if sin_x.abs() < 0.9999 {
        (m02.atan2(m22), m10.atan2(m11))
    } else {
        // Gimbal lock: roll folds into yaw
        ((-m20).atan2(m00), 0.0)
    };

    let wrap = |r: f32| {
        let deg = Deg::from(Rad(r)).0.rem_euclid(360.0);
        if deg >= 360.0 {
            0.0
        } else {
            deg
        }
    };
    Vector3::new(wrap(x), wrap(y), wrap(z))
}

/// Project `v` onto the plane with unit normal `normal`
pub fn project_on_plane(v: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
    v - normal * v.dot(normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn near_rotation(a: Quaternion<f32>, b: Quaternion<f32>) -> bool {
        // q and -q are the same rotation
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn test_yaw_turns_forward_to_right() {
        let q = euler_to_quaternion(Vector3::new(0.0, 90.0, 0.0));
        assert!(near(q.rotate_vector(Vector3::unit_z()), Vector3::unit_x()));
    }

    #[test]
    fn test_euler_round_trip() {
        for euler in [
            Vector3::new(10.0, 20.0, 30.0),
            Vector3::new(0.0, 180.0, 0.0),
            Vector3::new(350.0, 5.0, 270.0),
            Vector3::new(45.0, 300.0, 0.0),
        ] {
            let q = euler_to_quaternion(euler);
            let back = quaternion_to_euler(q);
            assert!(near_rotation(q, euler_to_quaternion(back)), "{euler:?} -> {back:?}");
        }
    }

    #[test]
    fn test_euler_gimbal_lock() {
        let q = euler_to_quaternion(Vector3::new(90.0, 30.0, 20.0));
        let back = quaternion_to_euler(q);
        assert!(near_rotation(q, euler_to_quaternion(back)));
        assert_eq!(back.z, 0.0);
    }

    #[test]
    fn test_compose_and_inverse() {
        let parent = Transform::new(
            Vector3::new(1.0, 2.0, 3.0),
            euler_to_quaternion(Vector3::new(0.0, 90.0, 0.0)),
            2.0,
        );
        let child = Transform::new(Vector3::new(0.0, 0.0, 1.0), Quaternion::one(), 0.5);

        let world = parent.compose(&child);
        assert!(near(world.position, Vector3::new(3.0, 2.0, 3.0)));
        assert!((world.scale - 1.0).abs() < 1e-6);

        let local = Transform::relative_to(&world, &parent);
        assert!(near(local.position, child.position));
        assert!((local.scale - child.scale).abs() < 1e-6);
        assert!(near_rotation(local.rotation, child.rotation));
    }

    #[test]
    fn test_project_on_plane() {
        let p = project_on_plane(Vector3::new(1.0, 1.0, 0.0), Vector3::unit_x());
        assert!(near(p, Vector3::unit_y()));
    }
}
