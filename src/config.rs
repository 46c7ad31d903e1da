use crate::types::{Encoding, HeaderType};

/// Settings that apply to a whole file.
///
/// An engine copies its configuration at the start of every write or read and
/// hands the copy to every step of the pass, so a setter called between two
/// writes never affects a pass that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// width of the length prefix of every appended block
    pub header_type: HeaderType,
    /// encoding given to the geometry arrays
    pub geometry_encoding: Encoding,
    /// encoding given to newly declared data arrays
    pub data_encoding: Encoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_type: HeaderType::UInt32,
            geometry_encoding: Encoding::Appended,
            data_encoding: Encoding::Appended,
        }
    }
}

impl Config {
    /// size in bytes of the length prefix of an appended block
    pub fn header_size(&self) -> u64 {
        self.header_type.size() as u64
    }
}
