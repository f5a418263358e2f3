//! Polygon file (PLY) header.

pub use crate::{
    error::Error,
    function::{Decoder, Encoder},
};
pub use indexmap::IndexMap;

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

/// The maximum size of a header in bytes.
pub const HEADER_SIZE_MAX: usize = 1 << 20;

/// The body format.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Format {
    Ascii,
    BinaryBigEndian,
    #[default]
    BinaryLittleEndian,
}

/// The scalar type of a property.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScalarKind {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Half,
    Float,
    Double,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    pub name: String,
    pub kind: ScalarKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Element {
    pub name: String,
    /// Row count
    pub count: usize,
    pub properties: IndexMap<String, Property>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    pub format: Format,
    pub comments: Vec<String>,
    pub elements: IndexMap<String, Element>,
}

impl Format {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryBigEndian => "binary_big_endian",
            Self::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

impl ScalarKind {
    /// Size in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort | Self::Half => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::UChar => "uchar",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Half => "half",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl Element {
    pub fn new(
        name: impl Into<String>,
        count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Default::default(),
        }
    }

    /// Appending a property, replacing the one with the same name.
    pub fn push_property(
        &mut self,
        name: impl Into<String>,
        kind: ScalarKind,
    ) -> &mut Self {
        let name = name.into();
        self.properties
            .insert(name.to_owned(), Property { name, kind });
        self
    }

    /// Size of a row in bytes.
    #[inline]
    pub fn row_size(&self) -> usize {
        self.properties.values().map(|p| p.kind.size()).sum()
    }
}

impl Header {
    #[inline]
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    #[inline]
    pub fn get(
        &self,
        element_name: &str,
    ) -> Option<&Element> {
        self.elements.get(element_name)
    }

    #[inline]
    pub fn get_mut(
        &mut self,
        element_name: &str,
    ) -> Option<&mut Element> {
        self.elements.get_mut(element_name)
    }

    /// Appending an element, replacing the one with the same name.
    pub fn push_element(
        &mut self,
        element: Element,
    ) -> &mut Self {
        self.elements.insert(element.name.to_owned(), element);
        self
    }
}

impl Decoder for Header {
    type Err = Error;

    fn decode(reader: &mut impl Read) -> Result<Self, Self::Err> {
        let mut size = 0;
        let mut next_line = || -> Result<String, Error> {
            let mut line = Vec::new();
            let mut byte = [0; 1];
            loop {
                reader.read_exact(&mut byte)?;
                size += 1;
                if size > HEADER_SIZE_MAX {
                    return Err(Error::InvalidPolygonHeader(format!(
                        "The size should be no more than {HEADER_SIZE_MAX} bytes"
                    )));
                }
                match byte[0] {
                    b'\n' => break,
                    b'\r' => continue,
                    byte => line.push(byte),
                }
            }
            String::from_utf8(line)
                .map_err(|err| Error::InvalidPolygonHeader(err.to_string()))
        };

        if next_line()? != "ply" {
            return Err(Error::InvalidPolygonHeader(
                "The magic line should be \"ply\"".into(),
            ));
        }

        let mut format = None;
        let mut comments = vec![];
        let mut elements = IndexMap::<String, Element>::new();
        loop {
            let line = next_line()?;
            let mut words = line.split_whitespace();
            match words.next() {
                Some("end_header") => break,
                Some("format") => {
                    let kind = words.next().unwrap_or_default();
                    let version = words.next().unwrap_or_default();
                    if version != "1.0" {
                        return Err(Error::UnsupportedPolygonFormat(format!(
                            "{kind} {version}"
                        )));
                    }
                    format = Some(kind.parse::<Format>()?);
                },
                Some("comment") | Some("obj_info") => {
                    let comment = line
                        .split_once(char::is_whitespace)
                        .map(|(_, comment)| comment.trim())
                        .unwrap_or_default();
                    comments.push(comment.to_owned());
                },
                Some("element") => {
                    let (Some(name), Some(count), None) =
                        (words.next(), words.next(), words.next())
                    else {
                        return Err(Error::InvalidPolygonHeader(line.to_owned()));
                    };
                    let count = count
                        .parse::<usize>()
                        .map_err(|_| Error::InvalidPolygonHeader(line.to_owned()))?;
                    elements.insert(name.to_owned(), Element::new(name, count));
                },
                Some("property") => {
                    let Some((_, element)) = elements.last_mut() else {
                        return Err(Error::InvalidPolygonHeader(format!(
                            "The property should follow an element: {line}"
                        )));
                    };
                    let (Some(kind), Some(name), None) =
                        (words.next(), words.next(), words.next())
                    else {
                        return Err(Error::UnsupportedPolygonFormat(format!(
                            "The property should be a scalar: {line}"
                        )));
                    };
                    element.push_property(name, kind.parse::<ScalarKind>()?);
                },
                Some(_) => return Err(Error::InvalidPolygonHeader(line.to_owned())),
                None => continue,
            }
        }

        let format = format.ok_or_else(|| {
            Error::InvalidPolygonHeader("The format line is missing".into())
        })?;

        Ok(Self {
            format,
            comments,
            elements,
        })
    }
}

impl Encoder for Header {
    type Err = Error;

    fn encode(
        &self,
        writer: &mut impl Write,
    ) -> Result<(), Self::Err> {
        write!(writer, "{self}")?;
        Ok(())
    }
}

impl fmt::Display for Header {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "ply")?;
        writeln!(f, "format {} 1.0", self.format.as_str())?;
        for comment in &self.comments {
            writeln!(f, "comment {comment}")?;
        }
        for element in self.elements.values() {
            writeln!(f, "element {} {}", element.name, element.count)?;
            for property in element.properties.values() {
                writeln!(f, "property {} {}", property.kind.as_str(), property.name)?;
            }
        }
        writeln!(f, "end_header")
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ascii" => Self::Ascii,
            "binary_big_endian" => Self::BinaryBigEndian,
            "binary_little_endian" => Self::BinaryLittleEndian,
            _ => return Err(Error::UnsupportedPolygonFormat(s.to_owned())),
        })
    }
}

impl FromStr for ScalarKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "char" | "int8" => Self::Char,
            "uchar" | "uint8" => Self::UChar,
            "short" | "int16" => Self::Short,
            "ushort" | "uint16" => Self::UShort,
            "int" | "int32" => Self::Int,
            "uint" | "uint32" => Self::UInt,
            "half" | "float16" => Self::Half,
            "float" | "float32" => Self::Float,
            "double" | "float64" => Self::Double,
            _ => {
                return Err(Error::UnsupportedPolygonFormat(format!(
                    "Unknown property type: {s}"
                )))
            },
        })
    }
}
