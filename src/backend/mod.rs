pub use burn::{
    backend::ndarray::{NdArray, NdArrayDevice},
    tensor::backend::{AutodiffBackend, Backend},
};

use burn::backend::autodiff;

pub type Autodiff<B> = autodiff::Autodiff<B>;

/// The CPU backend for scene storage and export.
pub type Cpu = NdArray<f32>;

/// The CPU backend with gradients.
pub type CpuAutodiff = Autodiff<Cpu>;
