//! Rotation and covariance kernels for 3D Gaussians.

pub use burn::tensor::{backend::Backend, Tensor};

/// Normalizing each row to unit length.
///
/// The shape of `values` is `[P, D]`.
#[inline]
pub fn normalize_rows<B: Backend>(values: Tensor<B, 2>) -> Tensor<B, 2> {
    values
        .to_owned()
        .div(values.powf_scalar(2.0).sum_dim(1).sqrt())
}

/// Building rotation matrices from quaternions.
///
/// ## Arguments
///
/// * `rotations` - The shape is `[P, 4]`. The quaternions are in scalar-first order,
///   i.e., `[w, x, y, z]`. They are normalized here, so they must not be zero.
///
/// ## Returns
///
/// The shape is `[P, 3, 3]`, i.e., `R[p][row][col]`.
pub fn build_rotation<B: Backend>(rotations: Tensor<B, 2>) -> Tensor<B, 3> {
    let point_count = rotations.dims()[0];
    if point_count == 0 {
        return Tensor::zeros([0, 3, 3], &rotations.device());
    }
    let q = normalize_rows(rotations);

    let w = q.to_owned().slice([0..point_count, 0..1]);
    let x = q.to_owned().slice([0..point_count, 1..2]);
    let y = q.to_owned().slice([0..point_count, 2..3]);
    let z = q.slice([0..point_count, 3..4]);

    let xx = x.to_owned() * x.to_owned();
    let yy = y.to_owned() * y.to_owned();
    let zz = z.to_owned() * z.to_owned();
    let xy = x.to_owned() * y.to_owned();
    let xz = x.to_owned() * z.to_owned();
    let yz = y.to_owned() * z.to_owned();
    let wx = w.to_owned() * x;
    let wy = w.to_owned() * y;
    let wz = w * z;

    // [P, 9]
    let entries = Tensor::cat(
        vec![
            -(yy.to_owned() + zz.to_owned()) * 2.0 + 1.0,
            (xy.to_owned() - wz.to_owned()) * 2.0,
            (xz.to_owned() + wy.to_owned()) * 2.0,
            (xy + wz) * 2.0,
            -(xx.to_owned() + zz) * 2.0 + 1.0,
            (yz.to_owned() - wx.to_owned()) * 2.0,
            (xz - wy) * 2.0,
            (yz + wx) * 2.0,
            -(xx + yy) * 2.0 + 1.0,
        ],
        1,
    );

    entries.reshape([point_count, 3, 3])
}

/// Building the factor `L = R · diag(modifier · s)` of covariance matrices.
///
/// ## Arguments
///
/// * `scalings` - The shape is `[P, 3]`.
/// * `rotations` - The shape is `[P, 4]`, in scalar-first order.
/// * `modifier` - The factor applied on all scalings.
///
/// ## Returns
///
/// The shape is `[P, 3, 3]`.
pub fn build_scaling_rotation<B: Backend>(
    scalings: Tensor<B, 2>,
    rotations: Tensor<B, 2>,
    modifier: f64,
) -> Tensor<B, 3> {
    // R · diag(s) scales the columns of R
    // [P, 1, 3]
    let scalings = scalings.mul_scalar(modifier).unsqueeze_dim::<3>(1);

    build_rotation(rotations) * scalings
}

/// Keeping the upper triangle of symmetric matrices.
///
/// ## Arguments
///
/// * `matrices` - The shape is `[P, 3, 3]`.
///
/// ## Returns
///
/// The shape is `[P, 6]`, in the order of `(xx, xy, xz, yy, yz, zz)`.
pub fn strip_symmetric<B: Backend>(matrices: Tensor<B, 3>) -> Tensor<B, 2> {
    let point_count = matrices.dims()[0];
    if point_count == 0 {
        return Tensor::zeros([0, 6], &matrices.device());
    }
    let entry = |row: usize, col: usize| {
        matrices
            .to_owned()
            .slice([0..point_count, row..row + 1, col..col + 1])
            .reshape([point_count, 1])
    };

    Tensor::cat(
        vec![
            entry(0, 0),
            entry(0, 1),
            entry(0, 2),
            entry(1, 1),
            entry(1, 2),
            entry(2, 2),
        ],
        1,
    )
}

/// Computing 3D covariances `Σ = L · Lᵀ` in packed form.
///
/// ## Arguments
///
/// * `scalings` - Activated scalings. The shape is `[P, 3]`.
/// * `modifier` - The factor applied on all scalings.
/// * `rotations` - The shape is `[P, 4]`, in scalar-first order.
///
/// ## Returns
///
/// The shape is `[P, 6]`. See [`strip_symmetric`] for the order.
pub fn covariance_from_scaling_rotation<B: Backend>(
    scalings: Tensor<B, 2>,
    modifier: f64,
    rotations: Tensor<B, 2>,
) -> Tensor<B, 2> {
    if scalings.dims()[0] == 0 {
        return Tensor::zeros([0, 6], &scalings.device());
    }
    let factors = build_scaling_rotation(scalings, rotations, modifier);
    let covariances = factors.to_owned().matmul(factors.swap_dims(1, 2));

    strip_symmetric(covariances)
}
