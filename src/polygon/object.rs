//! Polygon file (PLY) object.

pub use super::payload::*;

use std::io::{Read, Write};

/// A binary polygon file with scalar properties only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    pub header: Header,
    pub payload: Payload,
}

impl Object {
    #[inline]
    pub fn new(format: Format) -> Self {
        Self {
            header: Header::new(format),
            payload: Default::default(),
        }
    }

    /// Appending an element with its columns.
    ///
    /// The columns are in the order of `properties`.
    pub fn push_element(
        &mut self,
        name: &str,
        properties: impl IntoIterator<Item = (String, Column)>,
    ) -> Result<&mut Self, Error> {
        let mut count = None;
        let mut element = Element::new(name, 0);
        let mut columns = vec![];

        for (property_name, column) in properties {
            let column_count = column.len();
            match count {
                None => count = Some(column_count),
                Some(count) if count != column_count => {
                    return Err(Error::Validation(
                        format!("The row count of property {property_name:?} ({column_count})"),
                        count.to_string(),
                    ));
                },
                _ => {},
            }
            element.push_property(property_name, column.kind);
            columns.push(column);
        }

        if columns.len() != element.properties.len() {
            return Err(Error::MalformedPropertyName(format!(
                "The property names of element {name:?} should be unique"
            )));
        }

        element.count = count.unwrap_or_default();
        self.header.push_element(element);
        self.payload.elements.insert(name.to_owned(), columns);

        Ok(self)
    }

    #[inline]
    pub fn elem(
        &self,
        name: &str,
    ) -> Option<&Element> {
        self.header.get(name)
    }

    /// Getting the column of a property of an element.
    pub fn elem_prop(
        &self,
        element_name: &str,
        property_name: &str,
    ) -> Result<&Column, Error> {
        let element = self
            .elem(element_name)
            .ok_or_else(|| Error::MissingPolygonElement(element_name.to_owned()))?;
        let index = element.properties.get_index_of(property_name).ok_or_else(|| {
            Error::MissingPolygonProperty(format!("{element_name}.{property_name}"))
        })?;

        self.payload
            .elements
            .get(element_name)
            .and_then(|columns| columns.get(index))
            .ok_or_else(|| Error::MissingPolygonProperty(format!("{element_name}.{property_name}")))
    }
}

impl Decoder for Object {
    type Err = Error;

    fn decode(reader: &mut impl Read) -> Result<Self, Self::Err> {
        let header = Header::decode(reader)?;
        let payload = Payload::decode_with(reader, &header)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::polygon",
            "decode > elements ({:?})",
            header.elements.values().map(|e| (&e.name, e.count)).collect::<Vec<_>>(),
        );

        Ok(Self { header, payload })
    }
}

impl Encoder for Object {
    type Err = Error;

    fn encode(
        &self,
        writer: &mut impl Write,
    ) -> Result<(), Self::Err> {
        self.header.encode(writer)?;
        self.payload.encode_with(writer, &self.header)?;

        #[cfg(all(debug_assertions, not(test)))]
        log::debug!(
            target: "gausplat::scene::polygon",
            "encode > elements ({:?})",
            self.header.elements.values().map(|e| (&e.name, e.count)).collect::<Vec<_>>(),
        );

        Ok(())
    }
}
