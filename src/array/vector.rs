use crate::prelude::*;

use super::{FieldBuffer, Numeric};
use std::any::Any;

/// Three component field, one `[x, y, z]` tuple per element
///
/// ```
/// let velocity = vtk_xml::Vector::new(vec![[0.0f64, 1.0, 0.0], [1.0, 0.0, 0.0]]);
/// assert_eq!(velocity.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Constructor, Deref, DerefMut, Into)]
pub struct Vector<NUM>(Vec<[NUM; 3]>);

impl<NUM> FieldBuffer for Vector<NUM>
where
    NUM: Numeric,
{
    fn data_type(&self) -> DataType {
        NUM::DATA_TYPE
    }

    fn components(&self) -> u8 {
        3
    }

    fn elements(&self) -> u64 {
        self.0.len() as u64
    }

    fn flush(&self, sink: &mut PayloadWriter<'_>) -> Result<(), Error> {
        for tuple in self.0.iter() {
            sink.write(&tuple[..])?;
        }

        Ok(())
    }

    fn absorb(&mut self, source: &mut PayloadReader<'_>) -> Result<(), Error> {
        let flat: Vec<NUM> = source.read_all()?;

        self.0 = flat
            .chunks_exact(3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
            .collect();

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
