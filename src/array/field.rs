use crate::prelude::*;

use super::{FieldBuffer, Numeric};
use std::any::Any;

/// Field with an arbitrary number of components per element.
///
/// Rows of the array are elements, columns are components. Values are
/// written row by row, which is the order vtk expects for multi-component
/// arrays.
#[derive(Debug, Clone, PartialEq, Constructor, Deref, DerefMut, Into)]
pub struct Field<NUM>(Array2<NUM>);

impl<NUM: Numeric> Default for Field<NUM> {
    fn default() -> Self {
        Self(Array2::default((0, 1)))
    }
}

impl<NUM> FieldBuffer for Field<NUM>
where
    NUM: Numeric,
{
    fn data_type(&self) -> DataType {
        NUM::DATA_TYPE
    }

    fn components(&self) -> u8 {
        self.0.ncols() as u8
    }

    fn elements(&self) -> u64 {
        self.0.nrows() as u64
    }

    fn flush(&self, sink: &mut PayloadWriter<'_>) -> Result<(), Error> {
        for row in self.0.rows() {
            for value in row.iter() {
                sink.write(std::slice::from_ref(value))?;
            }
        }

        Ok(())
    }

    fn absorb(&mut self, source: &mut PayloadReader<'_>) -> Result<(), Error> {
        let components = source.components().max(1) as usize;
        let flat: Vec<NUM> = source.read_all()?;
        let rows = flat.len() / components;

        self.0 = Array2::from_shape_vec((rows, components), flat)
            .map_err(|_| Error::Shape(source.name().to_string()))?;

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
