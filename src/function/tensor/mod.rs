pub use crate::error::Error;

use burn::tensor::{backend::Backend, Tensor};

pub trait TensorExtension {
    /// Converting the values to `f32` in row-major order.
    fn into_f32s(self) -> Result<Vec<f32>, Error>;
}

pub trait TensorRowsExtension {
    /// Converting the values to `f32` rows.
    ///
    /// The column count should be `N`.
    fn into_rows<const N: usize>(self) -> Result<Vec<[f32; N]>, Error>;

    /// Converting the values to `f32` columns.
    fn into_columns(self) -> Result<Vec<Vec<f32>>, Error>;
}

impl<B: Backend, const D: usize> TensorExtension for Tensor<B, D> {
    fn into_f32s(self) -> Result<Vec<f32>, Error> {
        self.into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|err| Error::Tensor(format!("{err:?}")))
    }
}

impl<B: Backend> TensorRowsExtension for Tensor<B, 2> {
    fn into_rows<const N: usize>(self) -> Result<Vec<[f32; N]>, Error> {
        let [_, column_count] = self.dims();
        if column_count != N {
            return Err(Error::Validation(
                format!("The column count ({column_count})"),
                N.to_string(),
            ));
        }
        if N == 0 {
            return Ok(vec![]);
        }

        Ok(self
            .into_f32s()?
            .chunks_exact(N)
            .map(|row| std::array::from_fn(|i| row[i]))
            .collect())
    }

    fn into_columns(self) -> Result<Vec<Vec<f32>>, Error> {
        let [row_count, column_count] = self.dims();
        if row_count == 0 {
            return Ok(vec![vec![]; column_count]);
        }

        Ok(self
            .swap_dims(0, 1)
            .into_f32s()?
            .chunks_exact(row_count)
            .map(<[f32]>::to_vec)
            .collect())
    }
}
