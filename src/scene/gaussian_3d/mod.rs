pub mod activation;
pub mod config;
pub mod export;
pub mod import;
pub mod property;
pub mod render;

pub use crate::{
    error::Error,
    function::*,
    polygon,
    render::*,
    scene::point::*,
    spherical_harmonics::*,
};
pub use burn::{
    module::{Ignored, Module, Param},
    tensor::{backend::Backend, Tensor, TensorData},
};
pub use config::*;
pub use export::PolygonVariant;

use std::fmt;

/// The seed of random initialization.
pub const SEED: u64 = 0x3D65;

/// A set of 3D Gaussian primitives in structure-of-arrays layout.
///
/// - `P` is [`Gaussian3dScene::point_count`].
/// - `K` is `(d + 1)²`, where `d` is [`Gaussian3dScene::colors_sh_degree`].
/// - `C` is the channel count of colors.
#[derive(Module)]
pub struct Gaussian3dScene<B: Backend> {
    /// `[P, 1, C]`
    ///
    /// It is the zeroth SH coefficient when the degree is positive,
    /// or a color logit otherwise.
    pub colors_sh_dc: Param<Tensor<B, 3>>,
    /// `[P, K - 1, 3]`
    ///
    /// It is absent when the degree is zero.
    pub colors_sh_rest: Option<Param<Tensor<B, 3>>>,
    /// `[P, 1]`
    pub opacities: Param<Tensor<B, 2>>,
    /// `[P, 3]`
    pub positions: Param<Tensor<B, 2>>,
    /// `[P, 4]` (w, x, y, z)
    pub rotations: Param<Tensor<B, 2>>,
    /// `[P, 3]`
    pub scalings: Param<Tensor<B, 2>>,
    pub colors_sh_degree: Ignored<u32>,
    pub scaling_activation: Ignored<ScalingActivation>,
}

impl<B: Backend> fmt::Debug for Gaussian3dScene<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Gaussian3dScene")
            .field("device", &self.device())
            .field("colors_sh_degree", &*self.colors_sh_degree)
            .field("scaling_activation", &*self.scaling_activation)
            .field("colors_sh_dc.dims()", &self.colors_sh_dc.dims())
            .field(
                "colors_sh_rest.dims()",
                &self.colors_sh_rest.as_ref().map(|rest| rest.dims()),
            )
            .field("opacities.dims()", &self.opacities.dims())
            .field("positions.dims()", &self.positions.dims())
            .field("rotations.dims()", &self.rotations.dims())
            .field("scalings.dims()", &self.scalings.dims())
            .finish()
    }
}
