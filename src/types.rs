//! Enumerations used to describe fields in a vtk file and their textual
//! representation.
//!
//! Every enumeration converts infallibly to the string used in the file
//! (`as_str`). Parsing goes through [`FromStr`]; callers that want the
//! tolerant behavior of the header parser use [`parse_or_undefined`], which
//! maps anything unrecognized to the `Undefined` variant and reports the
//! failure instead of raising it.

use std::fmt;
use std::str::FromStr;

/// Error returned from the `FromStr` implementations in this module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{value}` is not a valid {kind}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Enumerations that have an `Undefined` fallback when the string
/// representation is not recognized
pub trait Undefined: FromStr + Sized {
    const UNDEFINED: Self;
}

/// Parse `value`, falling back to the undefined variant.
///
/// The returned flag is `true` only if the string was recognized.
pub fn parse_or_undefined<T: Undefined>(value: &str) -> (T, bool) {
    match value.parse::<T>() {
        Ok(parsed) => (parsed, true),
        Err(_) => (T::UNDEFINED, false),
    }
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),* $(,)? }) => {
        impl $name {
            /// the representation of this value inside a vtk file
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                    Self::Undefined => "Undefined",
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)*
                    _ => Err(UnknownVariant::new($kind, s)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Undefined for $name {
            const UNDEFINED: Self = Self::Undefined;
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// numeric type of every value stored in a field
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Undefined,
}

string_enum!(DataType, "data type", {
    Int8 => "Int8",
    Int16 => "Int16",
    Int32 => "Int32",
    Int64 => "Int64",
    UInt8 => "UInt8",
    UInt16 => "UInt16",
    UInt32 => "UInt32",
    UInt64 => "UInt64",
    Float32 => "Float32",
    Float64 => "Float64",
});

impl DataType {
    /// All defined data types
    pub const ALL: [DataType; 10] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::Float32,
        DataType::Float64,
    ];

    /// width of a single value in bytes, `0` if undefined
    pub fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
            Self::Undefined => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// the mesh entity a field is attached to
pub enum Location {
    Point,
    Cell,
    Undefined,
}

string_enum!(Location, "location", {
    Point => "Point",
    Cell => "Cell",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// how the values of a field are stored in the file
pub enum Encoding {
    /// whitespace separated text inside the `DataArray` element
    Ascii,
    /// raw bytes in the `AppendedData` section, addressed by an offset
    Appended,
    Undefined,
}

string_enum!(Encoding, "format", {
    Ascii => "ascii",
    Appended => "appended",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// number of components stored per element
pub enum FieldShape {
    /// one component
    Scalar,
    /// three components
    Vector,
    /// a fixed number of components other than one or three, such as a
    /// connectivity row
    Constant,
    Undefined,
}

impl FieldShape {
    /// the shape a header with `components` components describes
    pub fn from_components(components: u8) -> Self {
        match components {
            1 => Self::Scalar,
            3 => Self::Vector,
            _ => Self::Constant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// width of the length prefix written in front of every appended block
pub enum HeaderType {
    UInt32,
    UInt64,
}

impl HeaderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
        }
    }

    /// number of bytes in a length prefix
    pub fn size(&self) -> usize {
        match self {
            Self::UInt32 => 4,
            Self::UInt64 => 8,
        }
    }
}

impl Default for HeaderType {
    fn default() -> Self {
        Self::UInt32
    }
}

impl FromStr for HeaderType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UInt32" => Ok(Self::UInt32),
            "UInt64" => Ok(Self::UInt64),
            _ => Err(UnknownVariant::new("header type", s)),
        }
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// vtk cell types, discriminants are the codes written to the `types` array
pub enum ElementType {
    Vertex = 1,
    Line = 3,
    Triangle = 5,
    Polygon = 7,
    Pixel = 8,
    Quad = 9,
    Tetra = 10,
    Voxel = 11,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    QuadraticEdge = 21,
    QuadraticTriangle = 22,
    QuadraticQuad = 23,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
}

impl ElementType {
    /// the integer code of the element type
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let element = match code {
            1 => Self::Vertex,
            3 => Self::Line,
            5 => Self::Triangle,
            7 => Self::Polygon,
            8 => Self::Pixel,
            9 => Self::Quad,
            10 => Self::Tetra,
            11 => Self::Voxel,
            12 => Self::Hexahedron,
            13 => Self::Wedge,
            14 => Self::Pyramid,
            21 => Self::QuadraticEdge,
            22 => Self::QuadraticTriangle,
            23 => Self::QuadraticQuad,
            24 => Self::QuadraticTetra,
            25 => Self::QuadraticHexahedron,
            _ => return None,
        };

        Some(element)
    }

    /// number of vertices of the element, `None` for element types without a fixed
    /// vertex count
    pub fn vertex_count(&self) -> Option<u8> {
        element_vertex_count(self.code())
    }
}

/// number of vertices for the element type with the given code
pub fn element_vertex_count(code: u8) -> Option<u8> {
    match code {
        1 => Some(1),
        3 => Some(2),
        5 | 21 => Some(3),
        8 | 9 | 10 => Some(4),
        11 | 12 | 23 | 24 => Some(8),
        13 | 22 => Some(6),
        14 => Some(5),
        25 => Some(20),
        _ => None,
    }
}
