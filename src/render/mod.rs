//! Render requests for an external rasterizer.

pub mod camera;

pub use crate::error::Error;
pub use burn::{
    config::Config,
    tensor::{backend::Backend, Int, Tensor},
};
pub use camera::*;

use std::fmt;

/// The seam to a Gaussian rasterizer.
pub trait Gaussian3dRasterizer<B: Backend> {
    fn rasterize(
        &self,
        input: RasterizeInput<B>,
        settings: &RasterizeSettings,
    ) -> Result<RasterizeOutput<B>, Error>;
}

#[derive(Config, Debug)]
pub struct Gaussian3dRenderOptions {
    /// Background color in normalized RGB.
    #[config(default = "[1.0, 1.0, 1.0]")]
    pub background_rgb: [f64; 3],
    /// Evaluating SH colors toward the camera before rasterization.
    ///
    /// It takes effect only when the SH degree is positive.
    #[config(default = false)]
    pub evaluate_colors_sh: bool,
    /// Passing 3D covariances instead of scalings and rotations.
    #[config(default = false)]
    pub precompute_covariances: bool,
    /// The factor of scalings.
    #[config(default = 1.0)]
    pub scale_modifier: f64,
}

/// Per-frame settings of rasterization.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterizeSettings {
    pub background_rgb: [f64; 3],
    /// Position of camera center in world space.
    pub camera_center: [f64; 3],
    pub colors_sh_degree: u32,
    pub debug: bool,
    /// See [`Camera::full_projection_matrix`].
    pub full_projection_matrix: [[f64; 4]; 4],
    pub image_height: u32,
    pub image_width: u32,
    pub prefiltered: bool,
    pub scale_modifier: f64,
    pub tan_fov_x: f64,
    pub tan_fov_y: f64,
    /// See [`Camera::view_matrix`].
    pub view_matrix: [[f64; 4]; 4],
}

/// Per-primitive inputs of rasterization.
#[derive(Clone)]
pub struct RasterizeInput<B: Backend> {
    /// `[P, M]`, where `M` is `K * C` or `3` if the colors are evaluated.
    pub colors_precomputed: Tensor<B, 2>,
    /// `[P, 6]`
    ///
    /// It replaces [`RasterizeInput::scalings`] and [`RasterizeInput::rotations`] if set.
    pub covariances: Option<Tensor<B, 2>>,
    /// `[P, 1]`
    pub opacities: Tensor<B, 2>,
    /// `[P, 3]`
    pub positions: Tensor<B, 2>,
    /// `[P, 3]`
    ///
    /// Screen-space positions which only collect gradients.
    pub positions_2d: Tensor<B, 2>,
    /// `[P, 4]`
    pub rotations: Option<Tensor<B, 2>>,
    /// `[P, 3]`
    pub scalings: Option<Tensor<B, 2>>,
}

/// Outputs of rasterization.
#[derive(Clone)]
pub struct RasterizeOutput<B: Backend> {
    /// `[1, I_y, I_x]`
    pub alphas: Tensor<B, 3>,
    /// `[3, I_y, I_x]`
    pub colors_rgb_2d: Tensor<B, 3>,
    /// `[1, I_y, I_x]`
    pub depths: Tensor<B, 3>,
    /// `[P]`
    pub radii: Tensor<B, 1, Int>,
}

/// Outputs of rendering.
#[derive(Clone)]
pub struct Gaussian3dRenderOutput<B: Backend> {
    /// `[1, I_y, I_x]`
    pub alphas: Tensor<B, 3>,
    /// `[3, I_y, I_x]`
    pub colors_rgb_2d: Tensor<B, 3>,
    /// `[1, I_y, I_x]`
    pub depths: Tensor<B, 3>,
    /// `[P, 3]`
    ///
    /// The screen-space positions passed to the rasterizer,
    /// whose gradients are available under autodiff.
    pub positions_2d: Tensor<B, 2>,
    /// `[P]`
    pub radii: Tensor<B, 1, Int>,
}

impl<B: Backend> fmt::Debug for RasterizeInput<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("RasterizeInput")
            .field("colors_precomputed.dims()", &self.colors_precomputed.dims())
            .field(
                "covariances.dims()",
                &self.covariances.as_ref().map(|c| c.dims()),
            )
            .field("opacities.dims()", &self.opacities.dims())
            .field("positions.dims()", &self.positions.dims())
            .field("positions_2d.dims()", &self.positions_2d.dims())
            .field("rotations.dims()", &self.rotations.as_ref().map(|r| r.dims()))
            .field("scalings.dims()", &self.scalings.as_ref().map(|s| s.dims()))
            .finish()
    }
}

impl<B: Backend> fmt::Debug for RasterizeOutput<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("RasterizeOutput")
            .field("alphas.dims()", &self.alphas.dims())
            .field("colors_rgb_2d.dims()", &self.colors_rgb_2d.dims())
            .field("depths.dims()", &self.depths.dims())
            .field("radii.dims()", &self.radii.dims())
            .finish()
    }
}

impl<B: Backend> fmt::Debug for Gaussian3dRenderOutput<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Gaussian3dRenderOutput")
            .field("alphas.dims()", &self.alphas.dims())
            .field("colors_rgb_2d.dims()", &self.colors_rgb_2d.dims())
            .field("depths.dims()", &self.depths.dims())
            .field("positions_2d.dims()", &self.positions_2d.dims())
            .field("radii.dims()", &self.radii.dims())
            .finish()
    }
}

impl Default for Gaussian3dRenderOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
