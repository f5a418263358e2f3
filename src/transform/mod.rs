//! Rigid transforms on primitives.

pub use glam::{DMat3, DQuat, DVec3};

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

/// A rotation followed by a translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    /// Rotation matrix in row-major order
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// Mapping `(x, y, z)` to `(x, -z, y)`.
    ///
    /// ```rust
    /// use gausplat_scene::transform::RigidTransform;
    ///
    /// let mut positions = [[1.0, 2.0, 3.0]];
    /// RigidTransform::FLIP_YZ.apply_to_positions(&mut positions);
    /// assert_eq!(positions, [[1.0, -3.0, 2.0]]);
    /// ```
    pub const FLIP_YZ: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]],
        translation: [0.0; 3],
    };

    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0; 3],
    };

    #[inline]
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_cols_array_2d(&self.rotation).transpose()
    }

    /// Transforming the positions in place.
    pub fn apply_to_positions(
        &self,
        positions: &mut [[f32; 3]],
    ) {
        let rotation = self.rotation_matrix();
        let translation = DVec3::from_array(self.translation);

        positions.par_iter_mut().for_each(|position| {
            let position_new =
                rotation * DVec3::from_array(position.map(f64::from)) + translation;
            *position = position_new.to_array().map(|v| v as f32);
        });
    }

    /// Rotating the quaternions `(w, x, y, z)` in place.
    ///
    /// The outputs are normalized with a non-negative `w`.
    /// Zero quaternions are left unchanged.
    pub fn apply_to_rotations(
        &self,
        rotations: &mut [[f32; 4]],
    ) {
        let rotation = self.rotation_matrix();

        rotations.par_iter_mut().for_each(|quaternion| {
            let [w, x, y, z] = quaternion.map(f64::from);
            let quaternion_old = DQuat::from_xyzw(x, y, z, w);
            if quaternion_old.length_squared() == 0.0 {
                return;
            }

            let matrix = rotation * DMat3::from_quat(quaternion_old.normalize());
            let mut quaternion_new = DQuat::from_mat3(&matrix).normalize();
            if quaternion_new.w < 0.0 {
                quaternion_new = -quaternion_new;
            }

            *quaternion = [
                quaternion_new.w as f32,
                quaternion_new.x as f32,
                quaternion_new.y as f32,
                quaternion_new.z as f32,
            ];
        });
    }
}

impl Default for RigidTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}
