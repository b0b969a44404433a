/// Two-handed resize
///
/// While a picture is held with both hands it hangs under a handle placed
/// between the hands. The handle's scale is the distance between the hands, so
/// pulling the hands apart stretches the picture; `resize_record` then re-lays
/// the picture out so that only its width follows the stretch.

use cgmath::{InnerSpace, Matrix3, Quaternion, Rotation, Vector3};

use crate::spatial::transform::project_on_plane;
use crate::spatial::{AnchorFrames, Pose, Transform};
use crate::state::PictureRecord;

/// Hands closer than this do not define a direction (meters)
pub const MIN_HAND_SPAN: f32 = 0.001;

const MIN_PROJECTED: f32 = 1e-6;

/// Orthonormal right-handed basis spanned by the two hands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeBasis {
    /// From the left hand to the right hand
    pub x: Vector3<f32>,
    /// Averaged hand "up", made perpendicular to `x`
    pub y: Vector3<f32>,
    pub z: Vector3<f32>,
}

impl ResizeBasis {
    /// `None` when the hands are less than `MIN_HAND_SPAN` apart
    pub fn from_hands(left: &Pose, right: &Pose) -> Option<Self> {
        let span = right.position - left.position;
        if span.magnitude() < MIN_HAND_SPAN {
            return None;
        }
        let x = span.normalize();

        let average = left.rotation.slerp(right.rotation, 0.5);
        let mut y = project_on_plane(average.rotate_vector(Vector3::unit_y()), x);
        if y.magnitude2() < MIN_PROJECTED {
            // up is along the hands, forward cannot be
            y = project_on_plane(average.rotate_vector(Vector3::unit_z()), x);
        }
        if y.magnitude2() < MIN_PROJECTED {
            return None;
        }
        let y = y.normalize();

        let z = x.cross(y).normalize();
        let y = z.cross(x);
        Some(Self { x, y, z })
    }

    /// Rotation looking along `z` with `y` up
    pub fn rotation(&self) -> Quaternion<f32> {
        Quaternion::from(Matrix3::from_cols(self.x, self.y, self.z)).normalize()
    }
}

/// Handle transform (rig-local): midpoint of the hands, basis rotation, hand
/// distance as scale
pub fn handle_transform(left: &Pose, right: &Pose) -> Option<Transform> {
    let basis = ResizeBasis::from_hands(left, right)?;
    Some(Transform::new(
        (left.position + right.position) * 0.5,
        basis.rotation(),
        (right.position - left.position).magnitude(),
    ))
}

/// The parent of a picture held with both hands
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResizeHandle {
    local: Transform,
}

impl ResizeHandle {
    /// Recompute from the hands. Degenerate poses keep the previous handle and
    /// return `false`.
    pub fn update(&mut self, left: &Pose, right: &Pose) -> bool {
        match handle_transform(left, right) {
            Some(local) => {
                self.local = local;
                true
            }
            None => false,
        }
    }

    pub fn local(&self) -> Transform {
        self.local
    }

    pub fn world(&self, rig: &Transform) -> Transform {
        rig.compose(&self.local)
    }
}

/// Re-lay out a held picture under the current handle scale and store its new
/// size in the record. `false` if the record has no live node.
pub fn resize_record(record: &mut PictureRecord, anchors: &AnchorFrames, max_size: f32) -> bool {
    let Some(node) = record.node_mut() else {
        return false;
    };
    let dims = node.apply_scale(anchors, max_size);
    record.width = dims.width;
    record.height = dims.height;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::transform::euler_to_quaternion;
    use proptest::prelude::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn test_level_hands_give_identity_rotation() {
        let left = Pose::at(Vector3::new(-0.3, 1.0, 0.0));
        let right = Pose::at(Vector3::new(0.3, 1.0, 0.0));

        let handle = handle_transform(&left, &right).unwrap();
        assert!(close(handle.position, Vector3::new(0.0, 1.0, 0.0)));
        assert!((handle.scale - 0.6).abs() < 1e-6);
        assert!(close(handle.rotation.rotate_vector(Vector3::unit_z()), Vector3::unit_z()));
        assert!(close(handle.rotation.rotate_vector(Vector3::unit_y()), Vector3::unit_y()));
    }

    #[test]
    fn test_up_along_hands_uses_forward() {
        // both hands rolled so their "up" points from left to right
        let rolled = euler_to_quaternion(Vector3::new(0.0, 0.0, -90.0));
        let left = Pose::new(Vector3::new(-0.3, 1.0, 0.0), rolled);
        let right = Pose::new(Vector3::new(0.3, 1.0, 0.0), rolled);

        let basis = ResizeBasis::from_hands(&left, &right).unwrap();
        assert!(close(basis.y, Vector3::unit_z()));
        assert!(close(basis.z, -Vector3::unit_y()));
    }

    #[test]
    fn test_coinciding_hands_keep_previous_handle() {
        let mut handle = ResizeHandle::default();
        let left = Pose::at(Vector3::new(-0.2, 1.0, 0.0));
        let right = Pose::at(Vector3::new(0.2, 1.0, 0.0));
        assert!(handle.update(&left, &right));
        let before = handle.local();

        let same = Pose::at(Vector3::new(0.0, 1.0, 0.0));
        assert!(!handle.update(&same, &same));
        assert_eq!(handle.local(), before);
    }

    fn pose_strategy() -> impl Strategy<Value = Pose> {
        (
            -1.0f32..1.0,
            -1.0f32..1.0,
            -1.0f32..1.0,
            0.0f32..360.0,
            0.0f32..360.0,
            0.0f32..360.0,
        )
            .prop_map(|(px, py, pz, rx, ry, rz)| {
                Pose::new(Vector3::new(px, py, pz), euler_to_quaternion(Vector3::new(rx, ry, rz)))
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn test_basis_is_orthonormal(left in pose_strategy(), right in pose_strategy()) {
            prop_assume!((right.position - left.position).magnitude() >= 0.01);
            let basis = ResizeBasis::from_hands(&left, &right).unwrap();

            for axis in [basis.x, basis.y, basis.z] {
                prop_assert!((axis.magnitude() - 1.0).abs() < 1e-4);
            }
            prop_assert!(basis.x.dot(basis.y).abs() < 1e-4);
            prop_assert!(basis.y.dot(basis.z).abs() < 1e-4);
            prop_assert!(basis.z.dot(basis.x).abs() < 1e-4);
            prop_assert!(close(basis.x.cross(basis.y), basis.z));

            let rotation = basis.rotation();
            prop_assert!((rotation.rotate_vector(Vector3::unit_x()) - basis.x).magnitude() < 1e-3);
            prop_assert!((rotation.rotate_vector(Vector3::unit_z()) - basis.z).magnitude() < 1e-3);
        }
    }
}
