//! Binary polygon file (PLY) codec with scalar properties.

pub mod header;
pub mod object;
pub mod payload;

pub use object::*;
