//! Camera projector.

pub use crate::error::Error;

use glam::DMat4;

/// A pinhole camera for one rendering pass.
///
/// All matrices are in **row-major order**, i.e., `M[row][col]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Center position in world space.
    pub camera_center: [f64; 3],
    /// Affine transformation from camera space to world space.
    ///
    /// # Format
    ///
    /// ```plaintext
    /// [R_c   | T_c]
    /// [...   | ...]
    /// [0 0 0 | 1  ]
    /// ```
    pub camera_to_world: [[f64; 4]; 4],
    /// The horizontal field of view in radians.
    pub field_of_view_x: f64,
    /// The vertical field of view in radians.
    pub field_of_view_y: f64,
    /// The product of [`Camera::view_matrix`] and [`Camera::projection_matrix`].
    pub full_projection_matrix: [[f64; 4]; 4],
    /// Image height.
    pub image_height: u32,
    /// Image width.
    pub image_width: u32,
    /// The transpose of the perspective projection.
    pub projection_matrix: [[f64; 4]; 4],
    /// Horizontal principal point offset in normalized device coordinates.
    pub shift_x: f64,
    /// Vertical principal point offset in normalized device coordinates.
    pub shift_y: f64,
    /// `tan(field_of_view_x / 2)`
    pub tan_fov_x: f64,
    /// `tan(field_of_view_y / 2)`
    pub tan_fov_y: f64,
    /// The transpose of [`Camera::world_to_camera`].
    pub view_matrix: [[f64; 4]; 4],
    /// The inverse of [`Camera::camera_to_world`].
    pub world_to_camera: [[f64; 4]; 4],
}

impl Camera {
    /// The far clipping depth.
    pub const Z_FAR: f64 = 100.0;
    /// The near clipping depth.
    pub const Z_NEAR: f64 = 0.01;

    /// Building the camera.
    ///
    /// ## Arguments
    ///
    /// * `camera_to_world` - The camera pose in row-major order.
    /// * `intrinsics` - `[fx, fy, cx, cy]` normalized by the image size.
    /// * `image_height` - Image height.
    /// * `image_width` - Image width.
    ///
    /// ## Errors
    ///
    /// It fails if the pose is not invertible or any focal length is not positive.
    pub fn new(
        camera_to_world: [[f64; 4]; 4],
        intrinsics: [f64; 4],
        image_height: u32,
        image_width: u32,
    ) -> Result<Self, Error> {
        let [fx, fy, cx, cy] = intrinsics;
        if !(fx > 0.0 && fy > 0.0) {
            return Err(Error::Validation(
                format!("The focal lengths ({fx}, {fy})"),
                "positive".into(),
            ));
        }

        // The glam matrices are column-major
        let camera_to_world_mat = DMat4::from_cols_array_2d(&camera_to_world).transpose();
        let determinant = camera_to_world_mat.determinant();
        if !determinant.is_normal() {
            return Err(Error::Validation(
                format!("The determinant of camera pose ({determinant})"),
                "non-zero and finite".into(),
            ));
        }
        let world_to_camera_mat = camera_to_world_mat.inverse();
        let world_to_camera = world_to_camera_mat.transpose().to_cols_array_2d();
        let view_matrix = world_to_camera_mat.to_cols_array_2d();

        let tan_fov_x = 1.0 / (2.0 * fx);
        let tan_fov_y = 1.0 / (2.0 * fy);
        let field_of_view_x = 2.0 * tan_fov_x.atan();
        let field_of_view_y = 2.0 * tan_fov_y.atan();
        let shift_x = 2.0 * cx - 1.0;
        let shift_y = 2.0 * cy - 1.0;

        let projection_matrix = Self::projection(
            field_of_view_x,
            field_of_view_y,
            shift_x,
            shift_y,
        );

        let full_projection_matrix = (DMat4::from_cols_array_2d(&view_matrix).transpose()
            * DMat4::from_cols_array_2d(&projection_matrix).transpose())
        .transpose()
        .to_cols_array_2d();

        let camera_center = [
            camera_to_world[0][3],
            camera_to_world[1][3],
            camera_to_world[2][3],
        ];

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::render::camera",
            "new > fov ({field_of_view_x}, {field_of_view_y}) > shift ({shift_x}, {shift_y})",
        );

        Ok(Self {
            camera_center,
            camera_to_world,
            field_of_view_x,
            field_of_view_y,
            full_projection_matrix,
            image_height,
            image_width,
            projection_matrix,
            shift_x,
            shift_y,
            tan_fov_x,
            tan_fov_y,
            view_matrix,
            world_to_camera,
        })
    }

    /// Returns the transposed perspective projection with principal point shifts.
    pub fn projection(
        field_of_view_x: f64,
        field_of_view_y: f64,
        shift_x: f64,
        shift_y: f64,
    ) -> [[f64; 4]; 4] {
        let (near, far) = (Self::Z_NEAR, Self::Z_FAR);
        let top = (field_of_view_y / 2.0).tan() * near;
        let bottom = -top;
        let right = (field_of_view_x / 2.0).tan() * near;
        let left = -right;

        let mut p = [[0.0; 4]; 4];
        p[0][0] = 2.0 * near / (right - left);
        p[1][1] = 2.0 * near / (top - bottom);
        p[0][2] = (right + left) / (right - left) + shift_x;
        p[1][2] = (top + bottom) / (top - bottom) + shift_y;
        p[3][2] = 1.0;
        p[2][2] = far / (far - near);
        p[2][3] = -(far * near) / (far - near);

        // Transposing
        std::array::from_fn(|row| std::array::from_fn(|col| p[col][row]))
    }

    /// Returns the aspect ratio (`width / height`).
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.image_width as f64 / self.image_height as f64
    }
}
