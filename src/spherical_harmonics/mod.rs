pub use burn::tensor::{backend::Backend, Tensor};

use crate::error::Error;

/// The maximum degree of spherical harmonics for evaluation
pub const SH_DEGREE_MAX: u32 = 4;

/// The maximum degree of spherical harmonics for the viewer-compatible files
pub const SH_DEGREE_VIEWER: u32 = 3;

/// The real coefficients of orthonormalized spherical harmonics from degree 0 to 4
///
/// ## Examples
///
/// ```rust
/// use gausplat_scene::spherical_harmonics::SH_COEF;
/// use std::f64::consts::PI;
///
/// assert_eq!(SH_COEF.0[0], 0.28209479177387814);
/// assert_eq!(SH_COEF.3[3 + 2], 1.445305721320277);
///
/// assert!((SH_COEF.1[1] - (3.0 / 4.0 / PI).sqrt()).abs() < 1e-15);
/// assert!((SH_COEF.2[2] - (5.0 / 16.0 / PI).sqrt()).abs() < 1e-15);
/// assert!((SH_COEF.4[4] - (9.0 / 256.0 / PI).sqrt()).abs() < 1e-15);
/// ```
#[allow(clippy::type_complexity)]
pub const SH_COEF: ([f64; 1], [f64; 3], [f64; 5], [f64; 7], [f64; 9]) = (
    [0.28209479177387814],
    [-0.4886025119029199, 0.4886025119029199, -0.4886025119029199],
    [
        1.0925484305920792,
        -1.0925484305920792,
        0.31539156525252005,
        -1.0925484305920792,
        0.5462742152960396,
    ],
    [
        -0.5900435899266435,
        2.890611442640554,
        -0.4570457994644658,
        0.3731763325901154,
        -0.4570457994644658,
        1.445305721320277,
        -0.5900435899266435,
    ],
    [
        2.5033429417967046,
        -1.7701307697799304,
        0.9461746957575601,
        -0.6690465435572892,
        0.10578554691520431,
        -0.6690465435572892,
        0.47308734787878004,
        -1.7701307697799304,
        0.6258357354491761,
    ],
);

/// The count of coefficients per channel for the degree, i.e., `(degree + 1)²`.
#[inline]
pub const fn sh_count(degree: u32) -> usize {
    (degree as usize + 1).pow(2)
}

/// The degree for the count of coefficients per channel.
pub fn sh_degree_from_count(count: usize) -> Result<u32, Error> {
    (0..=SH_DEGREE_MAX)
        .find(|&degree| sh_count(degree) == count)
        .ok_or_else(|| {
            Error::Validation(
                format!("SH coefficient count ({count})"),
                "a square from 1 to 25".into(),
            )
        })
}

/// Converting RGB colors to the SH coefficients of degree 0.
#[inline]
pub fn rgb_to_sh<B: Backend, const D: usize>(colors_rgb: Tensor<B, D>) -> Tensor<B, D> {
    (colors_rgb - 0.5) / SH_COEF.0[0]
}

/// Converting the SH coefficients of degree 0 to RGB colors.
#[inline]
pub fn sh_to_rgb<B: Backend, const D: usize>(colors_sh: Tensor<B, D>) -> Tensor<B, D> {
    colors_sh * SH_COEF.0[0] + 0.5
}

/// Scalar version of [`rgb_to_sh`].
#[inline]
pub fn rgb_to_sh_scalar(color_rgb: f64) -> f64 {
    (color_rgb - 0.5) / SH_COEF.0[0]
}

/// Scalar version of [`sh_to_rgb`].
#[inline]
pub fn sh_to_rgb_scalar(color_sh: f64) -> f64 {
    color_sh * SH_COEF.0[0] + 0.5
}

/// Evaluating spherical harmonics at unit directions.
///
/// ## Arguments
///
/// * `degree` - It should be no more than [`SH_DEGREE_MAX`].
/// * `colors_sh` - The shape is `[P, C, M]`, where `M >= (degree + 1)²`.
/// * `directions` - Unit vectors. The shape is `[P, 3]`.
///
/// ## Returns
///
/// The shape is `[P, C]`.
pub fn eval_sh<B: Backend>(
    degree: u32,
    colors_sh: Tensor<B, 3>,
    directions: Tensor<B, 2>,
) -> Result<Tensor<B, 2>, Error> {
    let [point_count, channel_count, coefficient_count] = colors_sh.dims();

    if degree > SH_DEGREE_MAX {
        return Err(Error::Validation(
            format!("SH degree ({degree})"),
            format!("no more than {SH_DEGREE_MAX}"),
        ));
    }
    if coefficient_count < sh_count(degree) {
        return Err(Error::Validation(
            format!("SH coefficient count ({coefficient_count})"),
            format!("at least {} for degree {degree}", sh_count(degree)),
        ));
    }
    if directions.dims() != [point_count, 3] {
        return Err(Error::Validation(
            format!("The shape of directions ({:?})", directions.dims()),
            format!("{:?}", [point_count, 3]),
        ));
    }

    if point_count == 0 {
        return Ok(Tensor::zeros([0, channel_count], &directions.device()));
    }

    // [P, C]
    let sh = |index: usize| {
        colors_sh
            .to_owned()
            .slice([0..point_count, 0..channel_count, index..index + 1])
            .reshape([point_count, channel_count])
    };

    let mut result = sh(0) * SH_COEF.0[0];
    if degree < 1 {
        return Ok(result);
    }

    // [P, 1]
    let x = directions.to_owned().slice([0..point_count, 0..1]);
    let y = directions.to_owned().slice([0..point_count, 1..2]);
    let z = directions.slice([0..point_count, 2..3]);

    let c = SH_COEF.1;
    result = result
        + sh(1) * y.to_owned() * c[0]
        + sh(2) * z.to_owned() * c[1]
        + sh(3) * x.to_owned() * c[2];
    if degree < 2 {
        return Ok(result);
    }

    let xx = x.to_owned() * x.to_owned();
    let yy = y.to_owned() * y.to_owned();
    let zz = z.to_owned() * z.to_owned();
    let xy = x.to_owned() * y.to_owned();
    let yz = y.to_owned() * z.to_owned();
    let xz = x.to_owned() * z.to_owned();

    let c = SH_COEF.2;
    result = result
        + sh(4) * xy.to_owned() * c[0]
        + sh(5) * yz.to_owned() * c[1]
        + sh(6) * (zz.to_owned() * 2.0 - xx.to_owned() - yy.to_owned()) * c[2]
        + sh(7) * xz.to_owned() * c[3]
        + sh(8) * (xx.to_owned() - yy.to_owned()) * c[4];
    if degree < 3 {
        return Ok(result);
    }

    let c = SH_COEF.3;
    result = result
        + sh(9) * y.to_owned() * (xx.to_owned() * 3.0 - yy.to_owned()) * c[0]
        + sh(10) * xy.to_owned() * z.to_owned() * c[1]
        + sh(11) * y.to_owned() * (zz.to_owned() * 4.0 - xx.to_owned() - yy.to_owned()) * c[2]
        + sh(12)
            * z.to_owned()
            * (zz.to_owned() * 2.0 - xx.to_owned() * 3.0 - yy.to_owned() * 3.0)
            * c[3]
        + sh(13) * x.to_owned() * (zz.to_owned() * 4.0 - xx.to_owned() - yy.to_owned()) * c[4]
        + sh(14) * z * (xx.to_owned() - yy.to_owned()) * c[5]
        + sh(15) * x * (xx.to_owned() - yy.to_owned() * 3.0) * c[6];
    if degree < 4 {
        return Ok(result);
    }

    let c = SH_COEF.4;
    result = result
        + sh(16) * xy.to_owned() * (xx.to_owned() - yy.to_owned()) * c[0]
        + sh(17) * yz.to_owned() * (xx.to_owned() * 3.0 - yy.to_owned()) * c[1]
        + sh(18) * xy.to_owned() * (zz.to_owned() * 7.0 - 1.0) * c[2]
        + sh(19) * yz * (zz.to_owned() * 7.0 - 3.0) * c[3]
        + sh(20) * ((zz.to_owned() * 35.0 - 30.0) * zz.to_owned() + 3.0) * c[4]
        + sh(21) * xz.to_owned() * (zz.to_owned() * 7.0 - 3.0) * c[5]
        + sh(22) * (xx.to_owned() - yy.to_owned()) * (zz * 7.0 - 1.0) * c[6]
        + sh(23) * xz * (xx.to_owned() - yy.to_owned() * 3.0) * c[7]
        + sh(24)
            * (xx.to_owned() * (xx.to_owned() - yy.to_owned() * 3.0)
                - yy.to_owned() * (xx * 3.0 - yy))
            * c[8];

    Ok(result)
}
