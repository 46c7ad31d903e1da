//! Common traits and types that are useful for working with `vtk_xml`
#![allow(unused_imports)]

pub use crate::array::{Field, FieldBuffer, FieldMetaData, Numeric, Vector};
pub use crate::traits::{FieldSource, Grid};
pub use crate::types::{DataType, ElementType, Encoding, FieldShape, HeaderType, Location};
pub use crate::{Config, FieldDescriptor, FieldId, PayloadReader, PayloadWriter};
pub use crate::{VtkFile, VtkUnstructured};
pub use crate::Error;

pub(crate) use crate::ParseError;

pub(crate) use derive_more::{Constructor, Deref, DerefMut, Display, From, Into};

pub(crate) use ndarray::Array2;
