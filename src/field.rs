//! Metadata of a single data array.
//!
//! A [`FieldDescriptor`] never owns values directly. It knows the shape, type,
//! location and encoding of the array, its size, and where its bytes live in
//! the file. Where the values come from is described by [`Storage`].

use crate::array::{FieldBuffer, FieldMetaData};
use crate::parse::DataArrayHeader;
use crate::types::{DataType, Encoding, FieldShape, Location};

/// Where the values of a field come from
#[derive(Debug)]
pub enum Storage {
    /// values are physically written to and read from the file
    Stored(DataSource),
    /// values are generated from the grid description and never read back
    Derived(DerivedRule),
}

/// Owner of the values of a stored field
#[derive(Debug)]
pub enum DataSource {
    /// the collaborator passed to `write` / `read` moves the values by name
    External,
    /// the descriptor carries a buffer that moves its own values
    Buffer(Box<dyn FieldBuffer>),
}

/// Algorithm used to generate the values of a derived field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedRule {
    /// the homogeneous element type code, once per cell
    CellTypes,
    /// running sum of the homogeneous element vertex count, once per cell
    CellOffsets,
}

#[derive(Debug)]
pub struct FieldDescriptor {
    name: String,
    data_type: DataType,
    shape: FieldShape,
    components: u8,
    location: Location,
    encoding: Encoding,
    elements: u64,
    offset: u64,
    position: Option<usize>,
    storage: Storage,
}

impl FieldDescriptor {
    /// an empty descriptor whose values are provided by the collaborator
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Undefined,
            shape: FieldShape::Undefined,
            components: 1,
            location: Location::Undefined,
            encoding: Encoding::Undefined,
            elements: 0,
            offset: 0,
            position: None,
            storage: Storage::Stored(DataSource::External),
        }
    }

    /// a descriptor taking its type, shape and size from `buffer`
    pub fn with_buffer<T: Into<String>>(name: T, buffer: Box<dyn FieldBuffer>) -> Self {
        let mut field = Self::new(name);
        field.components = buffer.components();
        field.shape = FieldShape::from_components(field.components);
        field.import_meta_data(&buffer.meta_data());
        field.storage = Storage::Stored(DataSource::Buffer(buffer));
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Scalar and Vector shapes fix the component count, Constant keeps the
    /// current one
    pub fn set_shape(&mut self, shape: FieldShape) {
        self.shape = shape;

        match shape {
            FieldShape::Scalar => self.components = 1,
            FieldShape::Vector => self.components = 3,
            FieldShape::Constant | FieldShape::Undefined => (),
        }
    }

    pub fn components(&self) -> u8 {
        self.components
    }

    pub fn set_components(&mut self, components: u8) {
        self.components = components;
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// the encoding requested for this field
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// the encoding actually used in the file. Derived fields are always
    /// written inline so that they never occupy room in the appended section.
    pub fn effective_encoding(&self) -> Encoding {
        match self.storage {
            Storage::Derived(_) => Encoding::Ascii,
            Storage::Stored(_) => self.encoding,
        }
    }

    /// true if the field owns a block in the appended section
    pub fn is_appended(&self) -> bool {
        self.effective_encoding() == Encoding::Appended
    }

    pub fn elements(&self) -> u64 {
        self.elements
    }

    pub fn set_elements(&mut self, elements: u64) {
        self.elements = elements;
    }

    /// number of individual values, `elements * components`
    pub fn value_count(&self) -> u64 {
        self.elements * self.components as u64
    }

    /// number of payload bytes, not counting the length prefix
    pub fn byte_size(&self) -> u64 {
        self.value_count() * self.data_type.size() as u64
    }

    /// offset of the length prefix relative to the `_` marker of the
    /// appended section
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// byte position of the first inline value in the text of the file,
    /// only valid during the pass that recorded it
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Option<usize>) {
        self.position = position;
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn set_storage(&mut self, storage: Storage) {
        self.storage = storage;
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.storage, Storage::Derived(_))
    }

    pub fn derived_rule(&self) -> Option<DerivedRule> {
        match self.storage {
            Storage::Derived(rule) => Some(rule),
            Storage::Stored(_) => None,
        }
    }

    /// the self describing buffer of the field, if there is one
    pub fn buffer(&self) -> Option<&dyn FieldBuffer> {
        match &self.storage {
            Storage::Stored(DataSource::Buffer(buffer)) => Some(buffer.as_ref()),
            _ => None,
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut (dyn FieldBuffer + 'static)> {
        match &mut self.storage {
            Storage::Stored(DataSource::Buffer(buffer)) => Some(buffer.as_mut()),
            _ => None,
        }
    }

    /// take the size and type reported by the owner of the values
    pub fn import_meta_data(&mut self, meta_data: &FieldMetaData) {
        self.elements = meta_data.elements;

        if meta_data.data_type != DataType::Undefined {
            self.data_type = meta_data.data_type;
        }
    }

    /// Merge the information parsed from a `DataArray` header line.
    ///
    /// The storage of the field is never touched. The shape of `connectivity`
    /// is left alone since its header always reports a single component.
    pub fn merge_header(&mut self, header: &DataArrayHeader) {
        self.data_type = header.data_type;
        self.encoding = header.encoding;

        if let Some(offset) = header.offset {
            self.offset = offset;
        }

        if self.name != "connectivity" {
            self.shape = FieldShape::from_components(header.components);
            self.components = header.components;
        }
    }
}

impl From<DataArrayHeader> for FieldDescriptor {
    fn from(header: DataArrayHeader) -> Self {
        let mut field = FieldDescriptor::new(header.name.clone());
        field.merge_header(&header);
        field
    }
}
