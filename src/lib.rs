#![doc = include_str!("../README.md")]

pub mod array;
mod config;
mod field;
mod file_name;
pub mod mesh;
pub mod parse;
mod payload;
pub mod prelude;
mod registry;
mod traits;
mod types;
mod utils;
mod vtk_file;
mod write_vtk;

pub use array::{Field, FieldBuffer, FieldMetaData, Numeric, Vector};
pub use config::Config;
pub use field::{DataSource, DerivedRule, FieldDescriptor, Storage};
pub use file_name::FileName;
pub use mesh::{UnstructuredGrid, VtkUnstructured};
pub use parse::ParseError;
pub use payload::{PayloadReader, PayloadWriter};
pub use registry::{FieldId, FieldRegistry, Group};
pub use traits::{FieldSource, Grid};
pub use types::{
    element_vertex_count, parse_or_undefined, DataType, ElementType, Encoding, FieldShape,
    HeaderType, Location, Undefined, UnknownVariant,
};
pub use vtk_file::VtkFile;

#[cfg(feature = "derive")]
pub use vtk_xml_derive::FieldSource;

pub use ndarray;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing VTK xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("field `{0}` is not provided by this source")]
    FieldNotFound(String),
    #[error("field `{name}` is declared as {declared} but {actual} values were used")]
    TypeMismatch {
        name: String,
        declared: DataType,
        actual: DataType,
    },
    #[error("a value of field `{name}` cannot be represented as {data_type}")]
    ValueOutOfRange { name: String, data_type: DataType },
    #[error("values of field `{0}` do not fit its number of components")]
    Shape(String),
}
