//! Encoding and decoding traits.

use std::io::{Read, Write};

pub trait Decoder: Sized {
    type Err;

    fn decode(reader: &mut impl Read) -> Result<Self, Self::Err>;
}

pub trait DecoderWith<T>: Sized {
    type Err;

    fn decode_with(
        reader: &mut impl Read,
        init: T,
    ) -> Result<Self, Self::Err>;
}

pub trait Encoder {
    type Err;

    fn encode(
        &self,
        writer: &mut impl Write,
    ) -> Result<(), Self::Err>;
}
