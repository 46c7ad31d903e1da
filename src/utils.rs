use crate::types::HeaderType;

/// Expand `$body` once for the primitive matching a runtime [`DataType`](crate::DataType),
/// with `$n` bound as a type alias to that primitive.
macro_rules! with_numeric {
    ($data_type:expr, $n:ident => $body:expr, undefined => $undefined:expr) => {
        match $data_type {
            $crate::DataType::Int8 => {
                type $n = i8;
                $body
            }
            $crate::DataType::Int16 => {
                type $n = i16;
                $body
            }
            $crate::DataType::Int32 => {
                type $n = i32;
                $body
            }
            $crate::DataType::Int64 => {
                type $n = i64;
                $body
            }
            $crate::DataType::UInt8 => {
                type $n = u8;
                $body
            }
            $crate::DataType::UInt16 => {
                type $n = u16;
                $body
            }
            $crate::DataType::UInt32 => {
                type $n = u32;
                $body
            }
            $crate::DataType::UInt64 => {
                type $n = u64;
                $body
            }
            $crate::DataType::Float32 => {
                type $n = f32;
                $body
            }
            $crate::DataType::Float64 => {
                type $n = f64;
                $body
            }
            $crate::DataType::Undefined => $undefined,
        }
    };
}

pub(crate) use with_numeric;

/// position of the first occurrence of `needle` in `haystack`
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }

    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub(crate) fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    find_bytes(haystack, needle).is_some()
}

/// write the length prefix of an appended block
pub(crate) fn write_length_prefix(out: &mut Vec<u8>, header_type: HeaderType, length: u64) {
    match header_type {
        HeaderType::UInt32 => {
            let length = u32::try_from(length).unwrap_or_else(|_| {
                log::warn!(
                    "appended block of {length} bytes does not fit a UInt32 header, truncating the prefix"
                );
                u32::MAX
            });
            out.extend_from_slice(&length.to_le_bytes());
        }
        HeaderType::UInt64 => out.extend_from_slice(&length.to_le_bytes()),
    }
}

/// read the length prefix of an appended block, `None` if there are not enough bytes
pub(crate) fn read_length_prefix(bytes: &[u8], header_type: HeaderType) -> Option<u64> {
    match header_type {
        HeaderType::UInt32 => {
            let mut arr = [0; 4];
            arr.copy_from_slice(bytes.get(0..4)?);
            Some(u32::from_le_bytes(arr) as u64)
        }
        HeaderType::UInt64 => {
            let mut arr = [0; 8];
            arr.copy_from_slice(bytes.get(0..8)?);
            Some(u64::from_le_bytes(arr))
        }
    }
}
