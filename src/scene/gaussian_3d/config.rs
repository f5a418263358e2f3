pub use super::activation::*;
pub use burn::config::Config;

use super::{Gaussian3dScene, Ignored, Param};
use crate::spherical_harmonics::{sh_count, SH_DEGREE_MAX};

#[derive(Config, Debug)]
pub struct Gaussian3dSceneConfig {
    /// It should be no more than [`SH_DEGREE_MAX`].
    pub colors_sh_degree: u32,
    #[config(default = "ScalingActivationKind::Exp")]
    pub scaling_activation: ScalingActivationKind,
    /// The upper bound of the sigmoid policy.
    #[config(default = 0.3)]
    pub scale_max: f64,
    /// The lower bound of the sigmoid policy.
    #[config(default = 0.001)]
    pub scale_min: f64,
    /// The factor of the softplus policy.
    #[config(default = 0.1)]
    pub scale_multiplier: f64,
}

impl Gaussian3dSceneConfig {
    /// Resolving the scaling activation policy.
    pub fn resolve_scaling_activation(&self) -> Result<ScalingActivation, Error> {
        Ok(match self.scaling_activation {
            ScalingActivationKind::Exp => ScalingActivation::Exp,
            ScalingActivationKind::Softplus => {
                if !(self.scale_multiplier > 0.0) {
                    return Err(Error::Validation(
                        format!("The scale multiplier ({})", self.scale_multiplier),
                        "positive".into(),
                    ));
                }
                ScalingActivation::Softplus {
                    multiplier: self.scale_multiplier,
                }
            },
            ScalingActivationKind::Sigmoid => {
                if !(self.scale_min < self.scale_max) {
                    return Err(Error::Validation(
                        format!("The scale minimum ({})", self.scale_min),
                        format!("less than the scale maximum ({})", self.scale_max),
                    ));
                }
                ScalingActivation::Sigmoid {
                    min: self.scale_min,
                    max: self.scale_max,
                }
            },
        })
    }

    /// Validating the config.
    pub fn validate(&self) -> Result<(), Error> {
        if self.colors_sh_degree > SH_DEGREE_MAX {
            return Err(Error::Validation(
                format!("SH degree ({})", self.colors_sh_degree),
                format!("no more than {SH_DEGREE_MAX}"),
            ));
        }
        self.resolve_scaling_activation()?;
        Ok(())
    }

    /// Initializing an empty scene.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Gaussian3dScene<B>, Error> {
        self.validate()?;
        let degree = self.colors_sh_degree;
        let scaling_activation = self.resolve_scaling_activation()?;

        let colors_sh_rest = (degree > 0).then(|| {
            Param::from_tensor(Tensor::zeros([0, sh_count(degree) - 1, 3], device))
        });

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::gaussian_3d::config",
            "init > degree ({degree}) > scaling activation ({scaling_activation:?})",
        );

        Ok(Gaussian3dScene {
            colors_sh_dc: Param::from_tensor(Tensor::zeros([0, 1, 3], device)),
            colors_sh_rest,
            opacities: Param::from_tensor(Tensor::zeros([0, 1], device)),
            positions: Param::from_tensor(Tensor::zeros([0, 3], device)),
            rotations: Param::from_tensor(Tensor::zeros([0, 4], device)),
            scalings: Param::from_tensor(Tensor::zeros([0, 3], device)),
            colors_sh_degree: Ignored(degree),
            scaling_activation: Ignored(scaling_activation),
        })
    }
}
