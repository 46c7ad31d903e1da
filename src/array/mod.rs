//! container types for data to be read / written from files
//!
//! Any type implementing [`FieldBuffer`] can be attached to a field descriptor
//! and will move its own bytes in and out of the file. Three containers are
//! provided: `Vec<T>` for scalar fields, [`Vector`] for three component fields
//! and [`Field`] for an arbitrary number of components.

mod field;
mod vector;

pub use field::Field;
pub use vector::Vector;

use crate::prelude::*;

use num_traits::NumCast;
use std::any::Any;
use std::fmt::Debug;
use std::str::FromStr;

/// A primitive that can be stored in a vtk data array
pub trait Numeric: Copy + Default + Debug + PartialEq + NumCast + FromStr + 'static {
    const DATA_TYPE: DataType;
    const SIZE: usize;

    /// append the little endian bytes of the value
    fn extend_le_bytes(self, out: &mut Vec<u8>);

    /// decode a value from exactly `Self::SIZE` little endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// append the ascii representation of the value
    fn write_ascii(self, out: &mut Vec<u8>);
}

macro_rules! numeric_int {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl Numeric for $t {
                const DATA_TYPE: DataType = DataType::$variant;
                const SIZE: usize = std::mem::size_of::<$t>();

                fn extend_le_bytes(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut arr = [0; std::mem::size_of::<$t>()];
                    arr.copy_from_slice(bytes);
                    <$t>::from_le_bytes(arr)
                }

                fn write_ascii(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(self.to_string().as_bytes());
                }
            }
        )*
    };
}

macro_rules! numeric_float {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl Numeric for $t {
                const DATA_TYPE: DataType = DataType::$variant;
                const SIZE: usize = std::mem::size_of::<$t>();

                fn extend_le_bytes(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut arr = [0; std::mem::size_of::<$t>()];
                    arr.copy_from_slice(bytes);
                    <$t>::from_le_bytes(arr)
                }

                fn write_ascii(self, out: &mut Vec<u8>) {
                    let mut buffer = ryu::Buffer::new();
                    out.extend_from_slice(buffer.format(self).as_bytes());
                }
            }
        )*
    };
}

numeric_int!(
    i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64,
    u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64
);
numeric_float!(f32 => Float32, f64 => Float64);

/// Size and type of a field as reported by whoever owns its values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct FieldMetaData {
    /// number of elements (tuples), not the number of individual values
    pub elements: u64,
    pub data_type: DataType,
}

/// A container that carries the values of a field and can write / read them
/// itself
pub trait FieldBuffer: Debug {
    fn data_type(&self) -> DataType;

    fn components(&self) -> u8;

    /// number of elements (tuples) currently held
    fn elements(&self) -> u64;

    /// write every value to the sink, in element-major order
    fn flush(&self, sink: &mut PayloadWriter<'_>) -> Result<(), Error>;

    /// replace the contents of the buffer with the values in `source`
    fn absorb(&mut self, source: &mut PayloadReader<'_>) -> Result<(), Error>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn meta_data(&self) -> FieldMetaData {
        FieldMetaData::new(self.elements(), self.data_type())
    }
}

impl<NUM> FieldBuffer for Vec<NUM>
where
    NUM: Numeric,
{
    fn data_type(&self) -> DataType {
        NUM::DATA_TYPE
    }

    fn components(&self) -> u8 {
        1
    }

    fn elements(&self) -> u64 {
        self.len() as u64
    }

    fn flush(&self, sink: &mut PayloadWriter<'_>) -> Result<(), Error> {
        sink.write(self.as_slice())
    }

    fn absorb(&mut self, source: &mut PayloadReader<'_>) -> Result<(), Error> {
        *self = source.read_all()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_bytes() {
        let mut out = Vec::new();
        (-2i16).extend_le_bytes(&mut out);
        1.5f32.extend_le_bytes(&mut out);
        assert_eq!(out.len(), 6);
        assert_eq!(i16::from_le_slice(&out[0..2]), -2);
        assert_eq!(f32::from_le_slice(&out[2..6]), 1.5);
    }

    #[test]
    fn ascii_values() {
        let mut out = Vec::new();
        0.25f64.write_ascii(&mut out);
        out.push(b' ');
        u64::MAX.write_ascii(&mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "0.25 18446744073709551615");
    }

    #[test]
    fn vec_meta_data() {
        let values = vec![1u8, 2, 3];
        assert_eq!(values.meta_data(), FieldMetaData::new(3, DataType::UInt8));
        assert_eq!(FieldBuffer::components(&values), 1);
    }
}
