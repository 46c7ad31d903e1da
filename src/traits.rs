//! # Traits
//!
//! Two seams separate the engine from the rest of a program:
//!
//! * [`FieldSource`] is implemented by whatever owns the values of the arrays
//!   that are not carried by a self describing buffer. It is asked for sizes
//!   before a write and moves values through a [`PayloadWriter`] or a
//!   [`PayloadReader`] by field name. With the `derive` feature it can be
//!   derived for a struct of buffers.
//! * [`Grid`] is implemented by every kind of grid the engine can write. It
//!   owns the geometry arrays, the text layout of the file and the collection
//!   file of parallel runs, while the engine keeps the offsets and the two
//!   payload passes.
//!

use crate::array::FieldMetaData;
use crate::config::Config;
use crate::field::FieldDescriptor;
use crate::file_name::FileName;
use crate::payload::{PayloadReader, PayloadWriter};
use crate::registry::FieldRegistry;
use crate::types::Location;
use crate::Error;

/// Owner of the values of external fields.
///
/// Only [`flush`](FieldSource::flush) and [`absorb`](FieldSource::absorb) are
/// required. A source that does not recognize a name should return
/// [`Error::FieldNotFound`], the engine then skips that field with a warning.
///
/// ```ignore
/// struct Solver {
///     pressure: Vec<f64>,
/// }
///
/// impl vtk_xml::FieldSource for Solver {
///     fn field_metadata(&self, name: &str) -> Option<vtk_xml::FieldMetaData> {
///         match name {
///             "p" => Some(vtk_xml::FieldMetaData::new(self.pressure.len() as u64, vtk_xml::DataType::Float64)),
///             _ => None,
///         }
///     }
///
///     fn flush(&self, name: &str, sink: &mut vtk_xml::PayloadWriter) -> Result<(), vtk_xml::Error> {
///         match name {
///             "p" => sink.write(&self.pressure),
///             _ => Err(vtk_xml::Error::FieldNotFound(name.into())),
///         }
///     }
///
///     fn absorb(&mut self, name: &str, source: &mut vtk_xml::PayloadReader) -> Result<(), vtk_xml::Error> {
///         match name {
///             "p" => {
///                 self.pressure = source.read_all()?;
///                 Ok(())
///             }
///             _ => Err(vtk_xml::Error::FieldNotFound(name.into())),
///         }
///     }
/// }
/// ```
pub trait FieldSource {
    /// number of points or cells known to the source, used when the grid
    /// dimensions have not been set
    fn element_count(&self, _location: Location) -> Option<u64> {
        None
    }

    /// authoritative size and type of the field called `name`
    fn field_metadata(&self, _name: &str) -> Option<FieldMetaData> {
        None
    }

    /// write every value of the field called `name`
    fn flush(&self, name: &str, sink: &mut PayloadWriter) -> Result<(), Error>;

    /// read every value of the field called `name`
    fn absorb(&mut self, name: &str, source: &mut PayloadReader) -> Result<(), Error>;
}

/// The empty source, for files whose arrays are all carried by buffers
impl FieldSource for () {
    fn flush(&self, name: &str, _sink: &mut PayloadWriter) -> Result<(), Error> {
        Err(Error::FieldNotFound(name.into()))
    }

    fn absorb(&mut self, name: &str, _source: &mut PayloadReader) -> Result<(), Error> {
        Err(Error::FieldNotFound(name.into()))
    }
}

/// Grid specific behavior of an engine
pub trait Grid {
    /// extension of the files written for this grid, without the dot
    const EXTENSION: &'static str;

    /// insert the geometry descriptors of the grid
    fn init_geometry(&mut self, fields: &mut FieldRegistry, config: &Config);

    /// current number of points or cells of the grid
    fn element_count(&self, location: Location) -> u64;

    /// set the dimensions that are still unknown from the sizes of the
    /// geometry descriptors and from `source`
    fn set_missing_global_data(&mut self, fields: &mut FieldRegistry, source: &dyn FieldSource);

    /// write the complete text shell of a file with empty arrays
    fn write_meta_data(&self, fields: &FieldRegistry, config: &Config, out: &mut Vec<u8>);

    /// Parse the text shell of `input`, updating the grid dimensions, the
    /// header type and the descriptors. Returns the names of the data arrays
    /// present in the file.
    fn read_meta_data(&mut self, fields: &mut FieldRegistry, config: &mut Config, input: &[u8]) -> Vec<String>;

    /// write the values of `field`
    fn write_field_data(
        &self,
        field: &FieldDescriptor,
        source: &dyn FieldSource,
        sink: &mut PayloadWriter,
    ) -> Result<(), Error>;

    /// read the values of `field`
    fn read_field_data(
        &self,
        field: &mut FieldDescriptor,
        source: &mut dyn FieldSource,
        reader: &mut PayloadReader,
    ) -> Result<(), Error>;

    /// write the collection file of a parallel run with `procs` blocks
    fn write_collection(
        &self,
        fields: &FieldRegistry,
        file_name: &FileName,
        procs: u32,
        out: &mut Vec<u8>,
    );
}
