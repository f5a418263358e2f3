pub mod codec;
pub mod colormap;
pub mod covariance;
pub mod tensor;

pub use codec::*;
pub use covariance::*;
pub use tensor::*;
