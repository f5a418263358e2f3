//! Scaling activation policies.

pub use crate::error::Error;
pub use burn::tensor::{backend::Backend, Tensor};

use burn::tensor::activation;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The margin keeping sigmoid inputs away from `0` and `1`.
pub const SIGMOID_MARGIN: f64 = 1e-6;

/// The raw scalings below which `log(softplus(raw))` equals `raw` in `f32`.
pub const SOFTPLUS_LOG_LINEAR_MAX: f64 = -16.0;

/// The scalings below which the inverse of softplus takes the series form.
pub const SOFTPLUS_SERIES_MAX: f64 = 1e-2;

/// The name of a scaling activation policy.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingActivationKind {
    #[default]
    Exp,
    Softplus,
    Sigmoid,
}

/// The scaling activation policy of a scene.
///
/// It maps raw scalings to physical scalings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalingActivation {
    /// `exp(raw)`
    Exp,
    /// `softplus(raw) * multiplier`
    Softplus { multiplier: f64 },
    /// `min + (max - min) * sigmoid(raw)`
    Sigmoid { min: f64, max: f64 },
}

impl ScalingActivationKind {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exp => "exp",
            Self::Softplus => "softplus",
            Self::Sigmoid => "sigmoid",
        }
    }
}

impl ScalingActivation {
    #[inline]
    pub const fn kind(&self) -> ScalingActivationKind {
        match self {
            Self::Exp => ScalingActivationKind::Exp,
            Self::Softplus { .. } => ScalingActivationKind::Softplus,
            Self::Sigmoid { .. } => ScalingActivationKind::Sigmoid,
        }
    }

    /// Mapping raw scalings to physical scalings.
    pub fn activate<B: Backend>(
        &self,
        scalings: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        match *self {
            Self::Exp => scalings.exp(),
            Self::Softplus { multiplier } => softplus(scalings).mul_scalar(multiplier),
            Self::Sigmoid { min, max } => activation::sigmoid(scalings)
                .mul_scalar(max - min)
                .add_scalar(min),
        }
    }

    /// Mapping physical scalings back to raw scalings.
    ///
    /// The sigmoid policy clamps the scalings inside `(min, max)`.
    pub fn deactivate<B: Backend>(
        &self,
        scalings: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        match *self {
            Self::Exp => scalings.log(),
            Self::Softplus { multiplier } => {
                let scalings = scalings.div_scalar(multiplier);
                softplus_inverse(scalings.to_owned(), scalings.log())
            },
            Self::Sigmoid { min, max } => {
                let ratios = scalings
                    .sub_scalar(min)
                    .div_scalar(max - min)
                    .clamp(SIGMOID_MARGIN, 1.0 - SIGMOID_MARGIN);
                ratios.to_owned().div(-ratios + 1.0).log()
            },
        }
    }

    /// Mapping raw scalings to physical scalings in log space.
    ///
    /// The exponential policy returns the raw scalings as they are.
    pub fn to_log_scalings<B: Backend>(
        &self,
        scalings: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        match *self {
            Self::Exp => scalings,
            Self::Softplus { multiplier } => {
                let is_linear = scalings.to_owned().lower_elem(SOFTPLUS_LOG_LINEAR_MAX);
                softplus(scalings.to_owned())
                    .log()
                    .mask_where(is_linear, scalings)
                    .add_scalar(multiplier.ln())
            },
            _ => self.activate(scalings).log(),
        }
    }

    /// Mapping physical scalings in log space back to raw scalings.
    ///
    /// It is the inverse of [`ScalingActivation::to_log_scalings`].
    pub fn from_log_scalings<B: Backend>(
        &self,
        scalings: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        match *self {
            Self::Exp => scalings,
            Self::Softplus { multiplier } => {
                let scalings_log = scalings.sub_scalar(multiplier.ln());
                softplus_inverse(scalings_log.to_owned().exp(), scalings_log)
            },
            _ => self.deactivate(scalings.exp()),
        }
    }
}

/// `max(x, 0) + log(1 + exp(-|x|))`
fn softplus<B: Backend>(values: Tensor<B, 2>) -> Tensor<B, 2> {
    activation::relu(values.to_owned()) + values.abs().neg().exp().log1p()
}

/// `log(exp(x) - 1)` with `x` and `log(x)` given.
fn softplus_inverse<B: Backend>(
    values: Tensor<B, 2>,
    values_log: Tensor<B, 2>,
) -> Tensor<B, 2> {
    // log(x) + log(1 + x / 2 + x² / 6)
    let is_series = values.to_owned().lower_elem(SOFTPLUS_SERIES_MAX);
    let series = values_log
        + (values.to_owned().div_scalar(2.0) + values.to_owned().powf_scalar(2.0).div_scalar(6.0))
            .log1p();

    // x + log(1 - exp(-x))
    let exact = values.to_owned() + values.neg().exp().neg().add_scalar(1.0).log();

    exact.mask_where(is_series, series)
}

impl Default for ScalingActivation {
    #[inline]
    fn default() -> Self {
        Self::Exp
    }
}

impl fmt::Display for ScalingActivationKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingActivationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "exp" => Self::Exp,
            "softplus" => Self::Softplus,
            "sigmoid" => Self::Sigmoid,
            _ => return Err(Error::UnknownScalingActivation(s.to_owned())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn kind_from_str() {
        assert_eq!("exp".parse::<ScalingActivationKind>().unwrap(), ScalingActivationKind::Exp);
        assert_eq!(
            "softplus".parse::<ScalingActivationKind>().unwrap(),
            ScalingActivationKind::Softplus
        );
        assert_eq!(
            "sigmoid".parse::<ScalingActivationKind>().unwrap(),
            ScalingActivationKind::Sigmoid
        );
        assert!(matches!(
            "relu".parse::<ScalingActivationKind>(),
            Err(Error::UnknownScalingActivation(name)) if name == "relu"
        ));
        assert_eq!(ScalingActivationKind::Softplus.to_string(), "softplus");
    }

    #[test]
    fn activate() {
        let device = Default::default();
        let raw = Tensor::<B, 2>::from_data([[0.0, 1.0, -2.0]], &device);

        let target = Tensor::<B, 2>::from_data([[1.0, 2.7182817, 0.13533528]], &device);
        let output = ScalingActivation::Exp.activate(raw.to_owned());
        output.into_data().assert_approx_eq(&target.into_data(), 5);

        let target =
            Tensor::<B, 2>::from_data([[0.06931472, 0.13132616, 0.012692801]], &device);
        let output = ScalingActivation::Softplus { multiplier: 0.1 }.activate(raw.to_owned());
        output.into_data().assert_approx_eq(&target.into_data(), 5);

        let target = Tensor::<B, 2>::from_data([[0.1505, 0.2195865, 0.0366417]], &device);
        let output = ScalingActivation::Sigmoid {
            min: 0.001,
            max: 0.3,
        }
        .activate(raw);
        output.into_data().assert_approx_eq(&target.into_data(), 5);
    }

    #[test]
    fn deactivate_inverts_activate() {
        let device = Default::default();
        let raw = Tensor::<B, 2>::from_data([[0.0, 1.0, -2.0], [0.5, -0.5, 2.0]], &device);

        for policy in [
            ScalingActivation::Exp,
            ScalingActivation::Softplus { multiplier: 0.1 },
            ScalingActivation::Sigmoid {
                min: 0.001,
                max: 0.3,
            },
        ] {
            let target = raw.to_owned();
            let output = policy.deactivate(policy.activate(raw.to_owned()));
            output.into_data().assert_approx_eq(&target.into_data(), 3);

            let target = raw.to_owned();
            let output = policy.from_log_scalings(policy.to_log_scalings(raw.to_owned()));
            output.into_data().assert_approx_eq(&target.into_data(), 3);
        }
    }

    #[test]
    fn log_scalings_exp_is_identity() {
        let device = Default::default();
        let raw = Tensor::<B, 2>::from_data([[0.1, 0.2, -3.75]], &device);

        let output = ScalingActivation::Exp.to_log_scalings(raw.to_owned());
        output.into_data().assert_eq(&raw.to_owned().into_data(), true);

        let output = ScalingActivation::Exp.from_log_scalings(raw.to_owned());
        output.into_data().assert_eq(&raw.into_data(), true);
    }

    #[test]
    fn softplus_extreme_values() {
        let device = Default::default();
        let policy = ScalingActivation::Softplus { multiplier: 0.1 };
        let raw = Tensor::<B, 2>::from_data([[-20.0, -5.0, 95.0], [-120.0, 0.001, 30.0]], &device);

        let scalings = policy.activate(raw.to_owned()).into_data().to_vec::<f32>().unwrap();
        assert!(scalings.iter().all(|v| v.is_finite() && *v >= 0.0), "{scalings:?}");
        assert!(scalings[0] > 0.0, "{scalings:?}");
        assert!((scalings[2] - 9.5).abs() < 1e-5, "{scalings:?}");

        let scalings_log = policy.to_log_scalings(raw.to_owned());
        let values = scalings_log.to_owned().into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.is_finite()), "{values:?}");

        let output = policy.from_log_scalings(scalings_log);
        output.into_data().assert_approx_eq(&raw.to_owned().into_data(), 3);

        let raw = Tensor::<B, 2>::from_data([[-20.0, -5.0, 95.0]], &device);
        let output = policy.deactivate(policy.activate(raw.to_owned()));
        output.into_data().assert_approx_eq(&raw.into_data(), 3);
    }

    #[test]
    fn deactivate_sigmoid_saturated() {
        let device = Default::default();
        let policy = ScalingActivation::Sigmoid {
            min: 0.001,
            max: 0.3,
        };
        let scalings = Tensor::<B, 2>::from_data([[0.0, 0.5, 0.1505]], &device);

        let output = policy.deactivate(scalings).into_data().to_vec::<f32>().unwrap();
        assert!(output.iter().all(|v| v.is_finite()), "{output:?}");
        assert!(output[0] < -10.0);
        assert!(output[1] > 10.0);
        assert!(output[2].abs() < 1e-4);
    }
}
