pub mod gaussian_3d;
pub mod point;

pub use gaussian_3d::*;
pub use point::*;
