//! 3DGS scene property implementation.

pub use super::*;

use burn::tensor::activation;
use humansize::{format_size, BINARY};

/// Outer property value getters
impl<B: Backend> Gaussian3dScene<B> {
    /// Colors in SH space. (Outer value)
    ///
    /// The shape is `[P, K, C]`.
    /// - `P` is [`Self::point_count`].
    /// - `K` is `(d + 1)²`, where `d` is [`Self::colors_sh_degree`].
    /// - `C` is the channel count, which is `3` when `d` is positive.
    ///
    /// The colors are normalized RGB in `(0, 1)` when `d` is zero.
    #[inline]
    pub fn get_colors_sh(&self) -> Tensor<B, 3> {
        Self::make_colors_sh(
            self.colors_sh_dc.val(),
            self.colors_sh_rest.as_ref().map(|rest| rest.val()),
        )
    }

    /// 3D covariances. (Outer value)
    ///
    /// The shape is `[P, 6]`, in the order of `(xx, xy, xz, yy, yz, zz)`.
    #[inline]
    pub fn get_covariances(
        &self,
        scale_modifier: f64,
    ) -> Tensor<B, 2> {
        covariance_from_scaling_rotation(
            self.get_scalings(),
            scale_modifier,
            self.rotations.val(),
        )
    }

    /// Opacities. (Outer value)
    ///
    /// The shape is `[P, 1]`.
    ///
    /// They range from `0.0` to `1.0`.
    #[inline]
    pub fn get_opacities(&self) -> Tensor<B, 2> {
        Self::make_opacities(self.opacities.val())
    }

    /// 3D Positions. (Outer value)
    ///
    /// The shape is `[P, 3]`.
    #[inline]
    pub fn get_positions(&self) -> Tensor<B, 2> {
        Self::make_positions(self.positions.val())
    }

    /// Rotations. (Outer value)
    ///
    /// The shape is `[P, 4]`.
    ///
    /// They are represented as normalized Hamilton quaternions in scalar-first order,
    /// i.e., `[w, x, y, z]`.
    #[inline]
    pub fn get_rotations(&self) -> Tensor<B, 2> {
        Self::make_rotations(self.rotations.val())
    }

    /// 3D scalings. (Outer value)
    ///
    /// The shape is `[P, 3]`.
    #[inline]
    pub fn get_scalings(&self) -> Tensor<B, 2> {
        self.scaling_activation.activate(self.scalings.val())
    }
}

/// Outer property value makers
impl<B: Backend> Gaussian3dScene<B> {
    /// Making values for [`Gaussian3dScene::get_colors_sh`]
    pub fn make_colors_sh(
        colors_sh_dc: Tensor<B, 3>,
        colors_sh_rest: Option<Tensor<B, 3>>,
    ) -> Tensor<B, 3> {
        match colors_sh_rest {
            Some(colors_sh_rest) => Tensor::cat(vec![colors_sh_dc, colors_sh_rest], 1),
            None => activation::sigmoid(colors_sh_dc),
        }
    }

    /// Making values for [`Gaussian3dScene::get_opacities`]
    #[inline]
    pub fn make_opacities(opacities: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::sigmoid(opacities)
    }

    /// Making values for [`Gaussian3dScene::get_positions`]
    #[inline]
    pub fn make_positions(positions: Tensor<B, 2>) -> Tensor<B, 2> {
        positions
    }

    /// Making values for [`Gaussian3dScene::get_rotations`]
    #[inline]
    pub fn make_rotations(rotations: Tensor<B, 2>) -> Tensor<B, 2> {
        normalize_rows(rotations)
    }
}

/// Inner property value makers
impl<B: Backend> Gaussian3dScene<B> {
    /// Making values for [`Gaussian3dScene::opacities`]
    #[inline]
    pub fn make_inner_opacities(opacities: Tensor<B, 2>) -> Tensor<B, 2> {
        opacities.to_owned().div(-opacities + 1.0).log()
    }

    /// Making values for [`Gaussian3dScene::scalings`]
    #[inline]
    pub fn make_inner_scalings(
        &self,
        scalings: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        self.scaling_activation.deactivate(scalings)
    }
}

/// Inner property value setters
impl<B: Backend> Gaussian3dScene<B> {
    /// Replacing all inner values at once.
    ///
    /// ## Arguments
    ///
    /// * `positions` - `[P, 3]`
    /// * `colors_sh` - `[P, K, C]`. The first coefficient goes to
    ///   [`Gaussian3dScene::colors_sh_dc`] and the rest go to
    ///   [`Gaussian3dScene::colors_sh_rest`].
    /// * `scalings` - `[P, 3]`
    /// * `rotations` - `[P, 4]`
    /// * `opacities` - `[P, 1]`
    ///
    /// ## Errors
    ///
    /// It fails and keeps the scene unchanged if any shape mismatches.
    pub fn set_data(
        &mut self,
        positions: Tensor<B, 2>,
        colors_sh: Tensor<B, 3>,
        scalings: Tensor<B, 2>,
        rotations: Tensor<B, 2>,
        opacities: Tensor<B, 2>,
    ) -> Result<&mut Self, Error> {
        let point_count = positions.dims()[0];
        let degree = *self.colors_sh_degree;
        let [_, coefficient_count, channel_count] = colors_sh.dims();

        let check = |name: &str, output: Vec<usize>, target: Vec<usize>| {
            if output == target {
                Ok(())
            } else {
                Err(Error::Validation(
                    format!("The shape of {name} ({output:?})"),
                    format!("{target:?}"),
                ))
            }
        };
        check("positions", positions.dims().into(), vec![point_count, 3])?;
        check("scalings", scalings.dims().into(), vec![point_count, 3])?;
        check("rotations", rotations.dims().into(), vec![point_count, 4])?;
        check("opacities", opacities.dims().into(), vec![point_count, 1])?;
        if degree == 0 {
            check(
                "colors_sh",
                colors_sh.dims().into(),
                vec![point_count, 1, channel_count.max(1)],
            )?;
        } else {
            check(
                "colors_sh",
                colors_sh.dims().into(),
                vec![point_count, sh_count(degree), 3],
            )?;
        }

        // Empty ranges are not sliceable
        let (colors_sh_dc, colors_sh_rest) = if point_count == 0 {
            let device = colors_sh.device();
            (
                Tensor::zeros([0, 1, channel_count], &device),
                (degree > 0)
                    .then(|| Tensor::zeros([0, coefficient_count - 1, channel_count], &device)),
            )
        } else {
            (
                colors_sh
                    .to_owned()
                    .slice([0..point_count, 0..1, 0..channel_count]),
                (degree > 0).then(|| {
                    colors_sh.slice([0..point_count, 1..coefficient_count, 0..channel_count])
                }),
            )
        };

        self.set_inner_colors_sh_dc(colors_sh_dc)
            .set_inner_colors_sh_rest(colors_sh_rest)
            .set_inner_opacities(opacities)
            .set_inner_positions(positions)
            .set_inner_rotations(rotations)
            .set_inner_scalings(scalings);

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::property",
            "set_data > point_count ({point_count})",
        );

        Ok(self)
    }

    /// Setting inner values for [`Gaussian3dScene::colors_sh_dc`]
    #[inline]
    pub fn set_inner_colors_sh_dc(
        &mut self,
        colors_sh_dc: Tensor<B, 3>,
    ) -> &mut Self {
        self.colors_sh_dc =
            Param::initialized(self.colors_sh_dc.id.to_owned(), colors_sh_dc);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::colors_sh_rest`]
    #[inline]
    pub fn set_inner_colors_sh_rest(
        &mut self,
        colors_sh_rest: Option<Tensor<B, 3>>,
    ) -> &mut Self {
        self.colors_sh_rest = match (self.colors_sh_rest.take(), colors_sh_rest) {
            (Some(param), Some(rest)) => Some(Param::initialized(param.id, rest)),
            (None, Some(rest)) => Some(Param::from_tensor(rest)),
            (_, None) => None,
        };
        self
    }

    /// Setting inner values for [`Gaussian3dScene::opacities`]
    #[inline]
    pub fn set_inner_opacities(
        &mut self,
        opacities: Tensor<B, 2>,
    ) -> &mut Self {
        self.opacities = Param::initialized(self.opacities.id.to_owned(), opacities);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::positions`]
    #[inline]
    pub fn set_inner_positions(
        &mut self,
        positions: Tensor<B, 2>,
    ) -> &mut Self {
        self.positions = Param::initialized(self.positions.id.to_owned(), positions);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::rotations`]
    #[inline]
    pub fn set_inner_rotations(
        &mut self,
        rotations: Tensor<B, 2>,
    ) -> &mut Self {
        self.rotations = Param::initialized(self.rotations.id.to_owned(), rotations);
        self
    }

    /// Setting inner values for [`Gaussian3dScene::scalings`]
    #[inline]
    pub fn set_inner_scalings(
        &mut self,
        scalings: Tensor<B, 2>,
    ) -> &mut Self {
        self.scalings = Param::initialized(self.scalings.id.to_owned(), scalings);
        self
    }
}

/// Attribute getters
impl<B: Backend> Gaussian3dScene<B> {
    /// Channel count of colors.
    #[inline]
    pub fn colors_channel_count(&self) -> usize {
        self.colors_sh_dc.dims()[2]
    }

    /// Degree of spherical harmonics.
    #[inline]
    pub fn colors_sh_degree(&self) -> u32 {
        *self.colors_sh_degree
    }

    /// The device.
    #[inline]
    pub fn device(&self) -> B::Device {
        self.positions.device()
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        let point_count_target = self.positions.dims()[0];
        let point_count_other = self.colors_sh_dc.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);
        if let Some(colors_sh_rest) = &self.colors_sh_rest {
            let point_count_other = colors_sh_rest.dims()[0];
            debug_assert_eq!(point_count_other, point_count_target);
        }
        let point_count_other = self.opacities.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);
        let point_count_other = self.rotations.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);
        let point_count_other = self.scalings.dims()[0];
        debug_assert_eq!(point_count_other, point_count_target);

        point_count_target
    }

    /// The scaling activation policy.
    #[inline]
    pub fn scaling_activation(&self) -> ScalingActivation {
        *self.scaling_activation
    }

    /// Size of the parameters in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.num_params() * size_of::<B::FloatElem>()
    }

    /// Readable size of the parameters.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn set_data_and_get_outer_properties() {
        let device = Default::default();
        let mut scene = Gaussian3dSceneConfig::new(0).init::<B>(&device).unwrap();

        let positions =
            Tensor::<B, 2>::from_data([[0.0, 1.0, 2.0], [-1.0, -2.0, -3.0]], &device);
        let colors_sh = Tensor::<B, 3>::from_data([[[0.0, 0.0, 0.0]], [[2.0, -2.0, 0.5]]], &device);
        let scalings = Tensor::<B, 2>::from_data([[0.1; 3], [0.2; 3]], &device);
        let rotations = Tensor::<B, 2>::from_data([[1.0, 0.0, 0.0, 0.0]; 2], &device);
        let opacities = Tensor::<B, 2>::zeros([2, 1], &device);

        scene
            .set_data(
                positions.to_owned(),
                colors_sh,
                scalings,
                rotations.to_owned(),
                opacities,
            )
            .unwrap();

        assert_eq!(scene.point_count(), 2);
        assert_eq!(scene.colors_channel_count(), 3);

        let target = rotations;
        let output = scene.get_rotations();
        output.into_data().assert_eq(&target.into_data(), true);

        let target = Tensor::<B, 2>::from_data([[0.5], [0.5]], &device);
        let output = scene.get_opacities();
        output.into_data().assert_approx_eq(&target.into_data(), 6);

        let target = Tensor::<B, 2>::from_data(
            [[0.1_f32.exp(); 3], [0.2_f32.exp(); 3]],
            &device,
        );
        let output = scene.get_scalings();
        output.into_data().assert_approx_eq(&target.into_data(), 6);

        let target = positions;
        let output = scene.get_positions();
        output.into_data().assert_eq(&target.into_data(), true);

        let target = Tensor::<B, 3>::from_data(
            [[[0.5, 0.5, 0.5]], [[0.8807971, 0.11920292, 0.62245935]]],
            &device,
        );
        let output = scene.get_colors_sh();
        output.into_data().assert_approx_eq(&target.into_data(), 6);
    }

    #[test]
    fn set_data_with_sh_rest() {
        let device = Default::default();
        let mut scene = Gaussian3dSceneConfig::new(1).init::<B>(&device).unwrap();

        let colors_sh = Tensor::<B, 3>::from_data(
            [
                [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0], [10.0, 11.0, 12.0]],
                [[-1.0, -2.0, -3.0], [-4.0, -5.0, -6.0], [-7.0, -8.0, -9.0], [-10.0, -11.0, -12.0]],
            ],
            &device,
        );
        scene
            .set_data(
                Tensor::zeros([2, 3], &device),
                colors_sh.to_owned(),
                Tensor::zeros([2, 3], &device),
                Tensor::ones([2, 4], &device),
                Tensor::zeros([2, 1], &device),
            )
            .unwrap();

        assert_eq!(scene.colors_sh_dc.dims(), [2, 1, 3]);
        assert_eq!(scene.colors_sh_rest.as_ref().map(|r| r.dims()), Some([2, 3, 3]));

        let target = colors_sh;
        let output = scene.get_colors_sh();
        output.into_data().assert_eq(&target.into_data(), true);

        let target = Tensor::<B, 2>::from_data([[0.5; 4]; 2], &device);
        let output = scene.get_rotations();
        output.into_data().assert_approx_eq(&target.into_data(), 6);
    }

    #[test]
    fn set_data_invalid() {
        let device = Default::default();
        let mut scene = Gaussian3dSceneConfig::new(1).init::<B>(&device).unwrap();

        let result = scene.set_data(
            Tensor::zeros([2, 3], &device),
            Tensor::zeros([2, 4, 3], &device),
            Tensor::zeros([3, 3], &device),
            Tensor::zeros([2, 4], &device),
            Tensor::zeros([2, 1], &device),
        );
        assert!(matches!(result, Err(Error::Validation(_, _))));

        let result = scene.set_data(
            Tensor::zeros([2, 3], &device),
            Tensor::zeros([2, 9, 3], &device),
            Tensor::zeros([2, 3], &device),
            Tensor::zeros([2, 4], &device),
            Tensor::zeros([2, 1], &device),
        );
        assert!(matches!(result, Err(Error::Validation(_, _))));

        let result = scene.set_data(
            Tensor::zeros([2, 3], &device),
            Tensor::zeros([2, 4, 3], &device),
            Tensor::zeros([2, 3], &device),
            Tensor::zeros([2, 4], &device),
            Tensor::zeros([1, 1], &device),
        );
        assert!(matches!(result, Err(Error::Validation(_, _))));

        assert_eq!(scene.point_count(), 0);
    }

    #[test]
    fn covariances_and_size() {
        let device = Default::default();
        let mut scene = Gaussian3dSceneConfig::new(0).init::<B>(&device).unwrap();

        scene
            .set_data(
                Tensor::zeros([1, 3], &device),
                Tensor::zeros([1, 1, 3], &device),
                Tensor::<B, 2>::from_data([[0.0, 1.0_f32.ln(), 2.0_f32.ln()]], &device),
                Tensor::<B, 2>::from_data([[2.0, 0.0, 0.0, 0.0]], &device),
                Tensor::zeros([1, 1], &device),
            )
            .unwrap();

        let target = Tensor::<B, 2>::from_data([[0.25, 0.0, 0.0, 0.25, 0.0, 1.0]], &device);
        let output = scene.get_covariances(0.5);
        output.into_data().assert_approx_eq(&target.into_data(), 5);

        assert_eq!(scene.size(), (3 + 3 + 3 + 4 + 1) * 4);
        assert_eq!(scene.size_readable(), "56 B");
    }
}
