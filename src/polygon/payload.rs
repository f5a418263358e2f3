//! Polygon file (PLY) payload in columns.

pub use super::header::*;
pub use crate::function::DecoderWith;

use byteorder::{ByteOrder, LittleEndian};
use half::f16;
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};
use std::io::{Read, Write};

/// Count of rows decoded at once.
const ROW_BATCH_SIZE: usize = 1 << 14;

/// Values of one property of one element.
///
/// The bytes are always little-endian, whatever the body format is.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub kind: ScalarKind,
    pub bytes: Vec<u8>,
}

/// Columns of each element, in the property order of [`Header`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub elements: IndexMap<String, Vec<Column>>,
}

impl Column {
    #[inline]
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            bytes: vec![],
        }
    }

    /// Encoding the values as `kind`.
    ///
    /// Integer kinds take the values rounded toward zero and saturated.
    pub fn from_f32s(
        kind: ScalarKind,
        values: &[f32],
    ) -> Self {
        let mut bytes = vec![0; values.len() * kind.size()];
        let chunks = bytes.chunks_exact_mut(kind.size());

        for (chunk, &value) in chunks.zip(values) {
            match kind {
                ScalarKind::Char => chunk[0] = (value as i8) as u8,
                ScalarKind::UChar => chunk[0] = value as u8,
                ScalarKind::Short => LittleEndian::write_i16(chunk, value as i16),
                ScalarKind::UShort => LittleEndian::write_u16(chunk, value as u16),
                ScalarKind::Int => LittleEndian::write_i32(chunk, value as i32),
                ScalarKind::UInt => LittleEndian::write_u32(chunk, value as u32),
                ScalarKind::Half => {
                    LittleEndian::write_u16(chunk, f16::from_f32(value).to_bits())
                },
                ScalarKind::Float => LittleEndian::write_f32(chunk, value),
                ScalarKind::Double => LittleEndian::write_f64(chunk, value as f64),
            }
        }

        Self { kind, bytes }
    }

    #[inline]
    pub fn from_u8s(values: &[u8]) -> Self {
        Self {
            kind: ScalarKind::UChar,
            bytes: values.to_vec(),
        }
    }

    /// Row count
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decoding the values as `f32`.
    pub fn to_f32s(&self) -> Vec<f32> {
        self.bytes
            .chunks_exact(self.kind.size())
            .map(|chunk| match self.kind {
                ScalarKind::Char => chunk[0] as i8 as f32,
                ScalarKind::UChar => chunk[0] as f32,
                ScalarKind::Short => LittleEndian::read_i16(chunk) as f32,
                ScalarKind::UShort => LittleEndian::read_u16(chunk) as f32,
                ScalarKind::Int => LittleEndian::read_i32(chunk) as f32,
                ScalarKind::UInt => LittleEndian::read_u32(chunk) as f32,
                ScalarKind::Half => f16::from_bits(LittleEndian::read_u16(chunk)).to_f32(),
                ScalarKind::Float => LittleEndian::read_f32(chunk),
                ScalarKind::Double => LittleEndian::read_f64(chunk) as f32,
            })
            .collect()
    }
}

impl Payload {
    /// Encoding the columns into rows.
    pub fn encode_with(
        &self,
        writer: &mut impl Write,
        header: &Header,
    ) -> Result<(), Error> {
        let is_big_endian = match header.format {
            Format::BinaryLittleEndian => false,
            Format::BinaryBigEndian => true,
            Format::Ascii => {
                return Err(Error::UnsupportedPolygonFormat(
                    header.format.as_str().into(),
                ))
            },
        };

        for element in header.elements.values() {
            let columns = self
                .elements
                .get(&element.name)
                .ok_or_else(|| Error::MissingPolygonElement(element.name.to_owned()))?;
            validate_columns(element, columns)?;

            let row_size = element.row_size();
            if row_size == 0 || element.count == 0 {
                continue;
            }

            let mut bytes = vec![0; element.count * row_size];
            bytes
                .par_chunks_mut(row_size)
                .enumerate()
                .for_each(|(row, chunk)| {
                    let mut offset = 0;
                    for column in columns {
                        let size = column.kind.size();
                        let target = &mut chunk[offset..offset + size];
                        target.copy_from_slice(&column.bytes[row * size..(row + 1) * size]);
                        if is_big_endian {
                            target.reverse();
                        }
                        offset += size;
                    }
                });

            writer.write_all(&bytes)?;
        }

        Ok(())
    }
}

impl DecoderWith<&Header> for Payload {
    type Err = Error;

    fn decode_with(
        reader: &mut impl Read,
        header: &Header,
    ) -> Result<Self, Self::Err> {
        let is_big_endian = match header.format {
            Format::BinaryLittleEndian => false,
            Format::BinaryBigEndian => true,
            Format::Ascii => {
                return Err(Error::UnsupportedPolygonFormat(
                    header.format.as_str().into(),
                ))
            },
        };

        let mut elements = IndexMap::with_capacity(header.elements.len());
        for element in header.elements.values() {
            let row_size = element.row_size();
            element.count.checked_mul(row_size).ok_or_else(|| {
                Error::InvalidPolygonHeader(format!(
                    "The body size of element {:?} overflows ({} rows of {row_size} bytes)",
                    element.name, element.count,
                ))
            })?;

            // The count is untrusted, so the columns grow with the body read
            let row_count_reserved = element.count.min(ROW_BATCH_SIZE);
            let mut columns = element
                .properties
                .values()
                .map(|property| {
                    let mut column = Column::new(property.kind);
                    column
                        .bytes
                        .reserve_exact(row_count_reserved * property.kind.size());
                    column
                })
                .collect::<Vec<_>>();

            let mut rows_remaining = element.count;
            let mut buffer = vec![];
            while rows_remaining > 0 && row_size > 0 {
                let row_count = rows_remaining.min(ROW_BATCH_SIZE);
                buffer.resize(row_count * row_size, 0);
                reader.read_exact(&mut buffer)?;

                for row in buffer.chunks_exact(row_size) {
                    let mut offset = 0;
                    for column in columns.iter_mut() {
                        let size = column.kind.size();
                        let value = &row[offset..offset + size];
                        if is_big_endian {
                            column.bytes.extend(value.iter().rev());
                        } else {
                            column.bytes.extend_from_slice(value);
                        }
                        offset += size;
                    }
                }

                rows_remaining -= row_count;
            }

            elements.insert(element.name.to_owned(), columns);
        }

        Ok(Self { elements })
    }
}

fn validate_columns(
    element: &Element,
    columns: &[Column],
) -> Result<(), Error> {
    if columns.len() != element.properties.len() {
        return Err(Error::MismatchedPropertyCount(
            element.name.to_owned(),
            element.properties.len(),
            columns.len(),
        ));
    }
    for (property, column) in element.properties.values().zip(columns) {
        if property.kind != column.kind {
            return Err(Error::Validation(
                format!("The kind of property {:?} ({:?})", property.name, column.kind),
                format!("{:?}", property.kind),
            ));
        }
        if column.len() != element.count {
            return Err(Error::Validation(
                format!("The row count of property {:?} ({})", property.name, column.len()),
                element.count.to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_sample(format: Format) -> Header {
        let mut element = Element::new("vertex", 3);
        element
            .push_property("x", ScalarKind::Float)
            .push_property("y", ScalarKind::Half)
            .push_property("red", ScalarKind::UChar);
        let mut header = Header::new(format);
        header.push_element(element);
        header
    }

    fn payload_sample() -> Payload {
        let mut payload = Payload::default();
        payload.elements.insert(
            "vertex".into(),
            vec![
                Column::from_f32s(ScalarKind::Float, &[1.0, -2.5, 3.25]),
                Column::from_f32s(ScalarKind::Half, &[0.5, 1.0, -0.25]),
                Column::from_u8s(&[0, 128, 255]),
            ],
        );
        payload
    }

    #[test]
    fn column_conversions() {
        let values = [0.0, 1.5, -2.0, 65504.0];

        let column = Column::from_f32s(ScalarKind::Float, &values);
        assert_eq!(column.len(), 4);
        assert_eq!(column.bytes[4..8], 1.5_f32.to_le_bytes());
        assert_eq!(column.to_f32s(), values);

        let column = Column::from_f32s(ScalarKind::Half, &values);
        assert_eq!(column.bytes.len(), 8);
        assert_eq!(column.to_f32s(), values);

        let column = Column::from_f32s(ScalarKind::Double, &values);
        assert_eq!(column.to_f32s(), values);

        let column = Column::from_f32s(ScalarKind::UChar, &[0.0, 254.9, 300.0, -1.0]);
        assert_eq!(column.bytes, vec![0, 254, 255, 0]);
    }

    #[test]
    fn encode_and_decode_little_endian() {
        let header = header_sample(Format::BinaryLittleEndian);
        let payload = payload_sample();

        let mut bytes = vec![];
        payload.encode_with(&mut bytes, &header).unwrap();
        assert_eq!(bytes.len(), 3 * (4 + 2 + 1));
        assert_eq!(bytes[0..4], 1.0_f32.to_le_bytes());
        assert_eq!(bytes[4..6], half::f16::from_f32(0.5).to_le_bytes());
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7..11], (-2.5_f32).to_le_bytes());

        let output = Payload::decode_with(&mut Cursor::new(bytes), &header).unwrap();
        assert_eq!(output, payload);
    }

    #[test]
    fn encode_and_decode_big_endian() {
        let header = header_sample(Format::BinaryBigEndian);
        let payload = payload_sample();

        let mut bytes = vec![];
        payload.encode_with(&mut bytes, &header).unwrap();
        assert_eq!(bytes[0..4], 1.0_f32.to_be_bytes());
        assert_eq!(bytes[4..6], half::f16::from_f32(0.5).to_be_bytes());

        let output = Payload::decode_with(&mut Cursor::new(bytes), &header).unwrap();
        assert_eq!(output, payload);
    }

    #[test]
    fn encode_invalid() {
        let header = header_sample(Format::BinaryLittleEndian);

        let mut payload = payload_sample();
        payload.elements["vertex"].pop();
        payload.encode_with(&mut vec![], &header).unwrap_err();

        let mut payload = payload_sample();
        payload.elements["vertex"][0] = Column::from_f32s(ScalarKind::Float, &[1.0]);
        payload.encode_with(&mut vec![], &header).unwrap_err();

        let mut payload = payload_sample();
        payload.elements["vertex"][1] = Column::from_f32s(ScalarKind::Float, &[1.0; 3]);
        payload.encode_with(&mut vec![], &header).unwrap_err();

        Payload::default().encode_with(&mut vec![], &header).unwrap_err();

        let header = header_sample(Format::Ascii);
        payload_sample().encode_with(&mut vec![], &header).unwrap_err();
    }

    #[test]
    fn decode_truncated() {
        let header = header_sample(Format::BinaryLittleEndian);
        let bytes = vec![0; 3 * 7 - 1];

        Payload::decode_with(&mut Cursor::new(bytes), &header).unwrap_err();
    }

    #[test]
    fn decode_oversized_count() {
        let mut header = header_sample(Format::BinaryLittleEndian);
        header.get_mut("vertex").unwrap().count = usize::MAX;

        let error = Payload::decode_with(&mut Cursor::new(vec![0; 7]), &header).unwrap_err();
        assert!(matches!(error, Error::InvalidPolygonHeader(_)), "{error:?}");

        header.get_mut("vertex").unwrap().count = 1 << 40;
        let error = Payload::decode_with(&mut Cursor::new(vec![0; 7]), &header).unwrap_err();
        assert!(matches!(error, Error::Io(_)), "{error:?}");
    }
}
