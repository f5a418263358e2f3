//! 3DGS scene rendering implementation.

pub use super::*;

/// Scene renderers
impl<B: Backend> Gaussian3dScene<B> {
    /// Rendering the scene from the camera with the rasterizer.
    pub fn render<R: Gaussian3dRasterizer<B>>(
        &self,
        rasterizer: &R,
        camera: &Camera,
        options: &Gaussian3dRenderOptions,
    ) -> Result<Gaussian3dRenderOutput<B>, Error> {
        let degree = self.colors_sh_degree();
        let device = self.device();

        let settings = RasterizeSettings {
            background_rgb: options.background_rgb,
            camera_center: camera.camera_center,
            colors_sh_degree: degree,
            debug: false,
            full_projection_matrix: camera.full_projection_matrix,
            image_height: camera.image_height,
            image_width: camera.image_width,
            prefiltered: false,
            scale_modifier: options.scale_modifier,
            tan_fov_x: camera.tan_fov_x,
            tan_fov_y: camera.tan_fov_y,
            view_matrix: camera.view_matrix,
        };

        // [P, 3]
        let positions = self.get_positions();
        let positions_2d = positions.zeros_like().require_grad();

        // [P, K, C]
        let colors_sh = self.get_colors_sh();
        let colors_precomputed = if options.evaluate_colors_sh && degree > 0 {
            // [1, 3]
            let camera_center = Tensor::<B, 2>::from_data(
                TensorData::new(camera.camera_center.map(|v| v as f32).to_vec(), [1, 3]),
                &device,
            );
            let directions = normalize_rows(positions.to_owned() - camera_center);

            // [P, 3] <- [P, 3, K]
            eval_sh(degree, colors_sh.swap_dims(1, 2), directions)?
                .add_scalar(0.5)
                .clamp_min(0.0)
        } else {
            // [P, K * C]
            colors_sh.flatten::<2>(1, 2)
        };

        let (covariances, rotations, scalings) = if options.precompute_covariances {
            (Some(self.get_covariances(options.scale_modifier)), None, None)
        } else {
            (None, Some(self.get_rotations()), Some(self.get_scalings()))
        };

        let input = RasterizeInput {
            colors_precomputed,
            covariances,
            opacities: self.get_opacities(),
            positions,
            positions_2d: positions_2d.to_owned(),
            rotations,
            scalings,
        };

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::render",
            "render > input ({input:?})",
        );

        let output = rasterizer.rasterize(input, &settings)?;

        Ok(Gaussian3dRenderOutput {
            alphas: output.alphas,
            colors_rgb_2d: output.colors_rgb_2d,
            depths: output.depths,
            positions_2d,
            radii: output.radii,
        })
    }
}
