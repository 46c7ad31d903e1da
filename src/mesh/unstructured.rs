use crate::config::Config;
use crate::field::{DataSource, DerivedRule, FieldDescriptor, Storage};
use crate::file_name::FileName;
use crate::parse::{self, LineScanner};
use crate::payload::{PayloadReader, PayloadWriter};
use crate::registry::{FieldRegistry, Group};
use crate::traits::{FieldSource, Grid};
use crate::types::{DataType, ElementType, Encoding, FieldShape, HeaderType, Location};
use crate::utils;
use crate::vtk_file::VtkFile;
use crate::write_vtk;
use crate::Error;

use std::io::Write;
use std::path::PathBuf;

const POINTS: &str = "Points";
const OFFSETS: &str = "offsets";
const TYPES: &str = "types";
const CONNECTIVITY: &str = "connectivity";

/// An engine writing `.vtu` files
pub type VtkUnstructured = VtkFile<UnstructuredGrid>;

/// Dimensions of an unstructured grid.
///
/// The geometry of the grid is stored in four arrays: the point coordinates,
/// the running offsets of each cell into the connectivity, the element type
/// of each cell and the flat connectivity. When every cell has the same
/// element type the grid is homogeneous: offsets and types are generated
/// instead of stored, and the connectivity has one row per cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnstructuredGrid {
    cells: u64,
    points: u64,
    connectivity: u64,
    element_type: Option<ElementType>,
}

impl UnstructuredGrid {
    /// a grid whose cells are all of `element_type`
    pub fn homogeneous(element_type: ElementType) -> Self {
        Self {
            element_type: Some(element_type),
            ..Self::default()
        }
    }

    pub fn cells(&self) -> u64 {
        self.cells
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    /// total number of entries of the connectivity
    pub fn connectivity(&self) -> u64 {
        self.connectivity
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.element_type
    }

    /// vertex count of the homogeneous element type
    fn vertices(&self) -> Option<u64> {
        self.element_type
            .and_then(|element| element.vertex_count())
            .map(u64::from)
    }

    /// Values of a derived geometry array. Empty unless the grid is
    /// homogeneous.
    pub fn derived_values(&self, rule: DerivedRule) -> Vec<u64> {
        let (element_type, vertices) = match (self.element_type, self.vertices()) {
            (Some(element_type), Some(vertices)) => (element_type, vertices),
            _ => return Vec::new(),
        };

        match rule {
            DerivedRule::CellTypes => vec![element_type.code() as u64; self.cells as usize],
            DerivedRule::CellOffsets => (1..=self.cells).map(|cell| cell * vertices).collect(),
        }
    }

    /// Turn offsets and types into derived arrays and give the connectivity
    /// one row per cell.
    fn apply_homogeneous(&self, fields: &mut FieldRegistry) {
        let vertices = match self.vertices() {
            Some(vertices) => vertices as u8,
            None => return,
        };

        if let Some(offsets) = geometry_mut(fields, OFFSETS) {
            offsets.set_data_type(DataType::UInt64);
            offsets.set_storage(Storage::Derived(DerivedRule::CellOffsets));
        }

        if let Some(types) = geometry_mut(fields, TYPES) {
            types.set_data_type(DataType::UInt8);
            types.set_storage(Storage::Derived(DerivedRule::CellTypes));
        }

        if let Some(connectivity) = geometry_mut(fields, CONNECTIVITY) {
            connectivity.set_components(vertices);
            connectivity.set_shape(FieldShape::Constant);
        }
    }

    /// Push the dimensions of the grid into the geometry descriptors and into
    /// every data descriptor according to its location.
    fn propagate(&self, fields: &mut FieldRegistry) {
        let homogeneous = self.vertices().is_some();

        let ids = fields.group(Group::Geometry).to_vec();
        for id in ids {
            let field = match fields.get_mut(id) {
                Some(field) => field,
                None => continue,
            };

            let elements = match field.name() {
                POINTS => self.points,
                OFFSETS | TYPES => self.cells,
                CONNECTIVITY if homogeneous => self.cells,
                CONNECTIVITY => self.connectivity,
                _ => continue,
            };

            field.set_elements(elements);
        }

        let ids = fields.group(Group::Data).to_vec();
        for id in ids {
            if let Some(field) = fields.get_mut(id) {
                match field.location() {
                    Location::Point => field.set_elements(self.points),
                    Location::Cell => field.set_elements(self.cells),
                    Location::Undefined => (),
                }
            }
        }
    }

    /// Number of connectivity entries of a file whose connectivity size is
    /// not given by a homogeneous element type.
    fn calc_size_connectivity(&self, fields: &FieldRegistry, config: &Config, input: &[u8]) -> Option<u64> {
        let connectivity = fields.find_in(Group::Geometry, CONNECTIVITY).and_then(|id| fields.get(id))?;

        match connectivity.encoding() {
            Encoding::Appended => {
                let marker = parse::find_appended_marker(input)?;
                let start = marker + connectivity.offset() as usize;
                let length = utils::read_length_prefix(input.get(start..)?, config.header_type)?;
                let width = connectivity.data_type().size() as u64;

                if width == 0 {
                    None
                } else {
                    Some(length / width)
                }
            }
            Encoding::Ascii => connectivity
                .position()
                .map(|position| parse::count_ascii_tokens(input, position)),
            Encoding::Undefined => None,
        }
    }

    fn read_header_type(lines: &mut LineScanner<'_>, config: &mut Config) {
        let line = match lines.find_line("<VTKFile") {
            Some(line) => line,
            None => {
                log::warn!("no VTKFile element found, keeping header type {}", config.header_type);
                return;
            }
        };

        match parse::element_attribute(line, "VTKFile", "header_type") {
            Ok(Some(value)) => match value.parse::<HeaderType>() {
                Ok(header_type) => config.header_type = header_type,
                Err(e) => log::warn!("{e}, keeping header type {}", config.header_type),
            },
            Ok(None) => log::debug!("no header_type attribute, using {}", config.header_type),
            Err(e) => log::warn!("could not parse the VTKFile element: {e}"),
        }
    }

    fn read_piece(&mut self, lines: &mut LineScanner<'_>) {
        let line = match lines.find_line("<Piece") {
            Some(line) => line,
            None => {
                log::warn!("no Piece element found");
                return;
            }
        };

        let count = |key: &str| match parse::element_attribute(line, "Piece", key) {
            Ok(Some(value)) => match value.trim().parse::<u64>() {
                Ok(count) => Some(count),
                Err(_) => {
                    log::warn!("invalid {key} `{value}` in Piece element");
                    None
                }
            },
            Ok(None) => {
                log::warn!("Piece element has no {key} attribute");
                None
            }
            Err(e) => {
                log::warn!("could not parse the Piece element: {e}");
                None
            }
        };

        if let Some(points) = count("NumberOfPoints") {
            self.points = points;
        }

        if let Some(cells) = count("NumberOfCells") {
            self.cells = cells;
        }
    }

    /// merge the geometry headers found after the `section` opening tag
    fn read_geometry(lines: &mut LineScanner<'_>, fields: &mut FieldRegistry, section: &str, names: &[&str]) {
        let piece = lines.position();

        if lines.find_line(section).is_none() {
            log::warn!("no {section}> section found");
            lines.seek(piece);
            return;
        }

        let start = lines.position();

        for name in names {
            lines.seek(start);

            let field = match fields.find_in(Group::Geometry, name).and_then(|id| fields.get_mut(id)) {
                Some(field) => field,
                None => continue,
            };

            if !parse::read_data_array(lines, field) {
                log::warn!("{}", parse::ParseError::DataArrayNotFound(name.to_string()));
            }
        }

        lines.seek(piece);
    }

    fn write_geometry_section(fields: &FieldRegistry, section: &str, names: &[&str], out: &mut Vec<u8>) {
        let _ = writeln!(out, "      <{section}>");

        for name in names {
            if let Some(field) = fields.find_in(Group::Geometry, name).and_then(|id| fields.get(id)) {
                write_vtk::write_data_array(out, field);
            }
        }

        let _ = writeln!(out, "      </{section}>");
    }
}

fn geometry_mut<'a>(fields: &'a mut FieldRegistry, name: &str) -> Option<&'a mut FieldDescriptor> {
    let id = fields.find_in(Group::Geometry, name)?;
    fields.get_mut(id)
}

/// element count of the largest data array attached to `location`
fn largest_data_array(fields: &FieldRegistry, location: Location) -> u64 {
    fields
        .data_at(location)
        .into_iter()
        .filter_map(|id| fields.get(id))
        .map(|field| field.elements())
        .max()
        .unwrap_or(0)
}

impl Grid for UnstructuredGrid {
    const EXTENSION: &'static str = "vtu";

    fn init_geometry(&mut self, fields: &mut FieldRegistry, config: &Config) {
        let geometry = [
            (POINTS, DataType::Float64, FieldShape::Vector, Location::Point),
            (OFFSETS, DataType::Int32, FieldShape::Scalar, Location::Cell),
            (TYPES, DataType::Int32, FieldShape::Scalar, Location::Cell),
            (CONNECTIVITY, DataType::Int32, FieldShape::Scalar, Location::Cell),
        ];

        for (name, data_type, shape, location) in geometry {
            let mut field = FieldDescriptor::new(name);
            field.set_data_type(data_type);
            field.set_shape(shape);
            field.set_location(location);
            field.set_encoding(config.geometry_encoding);
            fields.insert(Group::Geometry, field);
        }

        self.apply_homogeneous(fields);
        self.propagate(fields);
    }

    fn element_count(&self, location: Location) -> u64 {
        match location {
            Location::Point => self.points,
            Location::Cell => self.cells,
            Location::Undefined => 0,
        }
    }

    fn set_missing_global_data(&mut self, fields: &mut FieldRegistry, source: &dyn FieldSource) {
        let elements = |name: &str| {
            fields
                .find_in(Group::Geometry, name)
                .and_then(|id| fields.get(id))
                .map(|field| field.elements())
                .unwrap_or(0)
        };

        let mut cells = elements(OFFSETS).max(elements(TYPES));
        let mut points = elements(POINTS);
        let connectivity = elements(CONNECTIVITY);

        if cells == 0 {
            cells = source
                .element_count(Location::Cell)
                .unwrap_or_else(|| largest_data_array(fields, Location::Cell));
        }

        if points == 0 {
            points = source
                .element_count(Location::Point)
                .unwrap_or_else(|| largest_data_array(fields, Location::Point));
        }

        self.cells = cells;
        self.points = points;
        self.connectivity = match self.vertices() {
            Some(vertices) => cells * vertices,
            None => connectivity,
        };

        log::trace!(
            "grid has {} points, {} cells and {} connectivity entries",
            self.points,
            self.cells,
            self.connectivity
        );

        self.propagate(fields);
    }

    fn write_meta_data(&self, fields: &FieldRegistry, config: &Config, out: &mut Vec<u8>) {
        let _ = writeln!(out, r#"<?xml version="1.0"?>"#);
        let _ = writeln!(
            out,
            r#"<VTKFile type="UnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="{}">"#,
            config.header_type
        );
        let _ = writeln!(out, "  <UnstructuredGrid>");
        let _ = writeln!(
            out,
            r#"    <Piece  NumberOfPoints="{}" NumberOfCells="{}">"#,
            self.points, self.cells
        );

        write_vtk::write_data_header(out, fields, Location::Point, false);
        write_vtk::write_data_header(out, fields, Location::Cell, false);

        Self::write_geometry_section(fields, "Points", &[POINTS], out);
        Self::write_geometry_section(fields, "Cells", &[OFFSETS, TYPES, CONNECTIVITY], out);

        let _ = writeln!(out, "    </Piece>");
        let _ = writeln!(out, "  </UnstructuredGrid>");
        write_vtk::write_appended_shell(out);
        let _ = writeln!(out, "</VTKFile>");
    }

    fn read_meta_data(&mut self, fields: &mut FieldRegistry, config: &mut Config, input: &[u8]) -> Vec<String> {
        let mut lines = LineScanner::new(input);

        Self::read_header_type(&mut lines, config);
        self.read_piece(&mut lines);

        let piece = lines.position();
        let found = parse::read_data_header(&mut lines, fields);

        lines.seek(piece);
        Self::read_geometry(&mut lines, fields, "<Points", &[POINTS]);
        Self::read_geometry(&mut lines, fields, "<Cells", &[OFFSETS, TYPES, CONNECTIVITY]);

        self.connectivity = match self.vertices() {
            Some(vertices) => self.cells * vertices,
            None => match self.calc_size_connectivity(fields, config, input) {
                Some(size) => size,
                None => {
                    log::warn!("could not determine the size of the connectivity");
                    0
                }
            },
        };

        self.propagate(fields);
        found
    }

    fn write_field_data(
        &self,
        field: &FieldDescriptor,
        source: &dyn FieldSource,
        sink: &mut PayloadWriter,
    ) -> Result<(), Error> {
        match field.storage() {
            Storage::Stored(DataSource::External) => source.flush(field.name(), sink),
            Storage::Stored(DataSource::Buffer(buffer)) => buffer.flush(sink),
            Storage::Derived(rule) => sink.write_converted(self.derived_values(*rule)),
        }
    }

    fn read_field_data(
        &self,
        field: &mut FieldDescriptor,
        source: &mut dyn FieldSource,
        reader: &mut PayloadReader,
    ) -> Result<(), Error> {
        if field.is_derived() {
            return Ok(());
        }

        match field.buffer_mut() {
            Some(buffer) => buffer.absorb(reader),
            None => source.absorb(field.name(), reader),
        }
    }

    fn write_collection(&self, fields: &FieldRegistry, file_name: &FileName, procs: u32, out: &mut Vec<u8>) {
        let _ = writeln!(out, r#"<?xml version="1.0"?>"#);
        let _ = writeln!(
            out,
            r#"<VTKFile type="PUnstructuredGrid" version="0.1" byte_order="LittleEndian">"#
        );
        let _ = writeln!(out, r#"  <PUnstructuredGrid GhostLevel="0">"#);

        write_vtk::write_data_header(out, fields, Location::Point, true);
        write_vtk::write_data_header(out, fields, Location::Cell, true);

        let _ = writeln!(out, "      <PPoints>");
        if let Some(points) = fields.find_in(Group::Geometry, POINTS).and_then(|id| fields.get(id)) {
            write_vtk::write_pdata_array(out, points);
        }
        let _ = writeln!(out, "      </PPoints>");

        for rank in 0..procs {
            let source = file_name.with_block(rank).file_name(Self::EXTENSION);
            let _ = writeln!(out, r#"    <Piece  Source="{source}"/>"#);
        }

        let _ = writeln!(out, "  </PUnstructuredGrid>");
        let _ = writeln!(out, "</VTKFile>");
    }
}

impl VtkFile<UnstructuredGrid> {
    /// an engine for a grid of mixed element types
    pub fn new<P: Into<PathBuf>, T: Into<String>>(directory: P, name: T) -> Self {
        Self::with_grid(UnstructuredGrid::default(), directory, name)
    }

    /// an engine for a grid whose cells are all of `element_type`
    pub fn homogeneous<P: Into<PathBuf>, T: Into<String>>(
        directory: P,
        name: T,
        element_type: ElementType,
    ) -> Self {
        let mut vtk = Self::new(directory, name);
        vtk.set_element_type(element_type);
        vtk
    }

    /// Declare every cell to be of `element_type`. Element types without a
    /// fixed vertex count are ignored with a warning.
    pub fn set_element_type(&mut self, element_type: ElementType) {
        if element_type.vertex_count().is_none() {
            log::warn!("{element_type:?} has no fixed vertex count and cannot be used for a homogeneous grid");
            return;
        }

        self.grid.element_type = Some(element_type);
        self.grid.connectivity = self.grid.cells * self.grid.vertices().unwrap_or(0);
        self.grid.apply_homogeneous(&mut self.fields);
        self.grid.propagate(&mut self.fields);
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.grid.element_type
    }

    /// numeric types of the four geometry arrays
    pub fn set_geom_types(
        &mut self,
        points: DataType,
        offsets: DataType,
        types: DataType,
        connectivity: DataType,
    ) {
        let types = [
            (POINTS, points),
            (OFFSETS, offsets),
            (TYPES, types),
            (CONNECTIVITY, connectivity),
        ];

        for (name, data_type) in types {
            if let Some(field) = self
                .fields
                .find_in(Group::Geometry, name)
                .and_then(|id| self.fields.get_mut(id))
            {
                field.set_data_type(data_type);
            }
        }
    }

    /// Set the dimensions of the grid. The connectivity size of a homogeneous
    /// grid is derived from its element type and `connectivity` is ignored.
    pub fn set_dimensions(&mut self, cells: u64, points: u64, connectivity: u64) {
        self.grid.cells = cells;
        self.grid.points = points;
        self.grid.connectivity = self
            .grid
            .vertices()
            .map(|vertices| cells * vertices)
            .unwrap_or(connectivity);
        self.grid.propagate(&mut self.fields);
    }

    /// set the dimensions of a grid whose cells are all of `element_type`
    pub fn set_homogeneous_dimensions(&mut self, cells: u64, points: u64, element_type: ElementType) {
        self.set_element_type(element_type);
        let connectivity = cells * self.grid.vertices().unwrap_or(0);
        self.set_dimensions(cells, points, connectivity);
    }

    /// total number of connectivity entries
    pub fn connectivity_size(&self) -> u64 {
        self.grid.connectivity
    }

    pub fn cell_count(&self) -> u64 {
        self.grid.cells
    }

    pub fn point_count(&self) -> u64 {
        self.grid.points
    }

    /// the generated values of the derived geometry array called `name`
    pub fn derived_values(&self, name: &str) -> Option<Vec<u64>> {
        let rule = self
            .fields
            .find_in(Group::Geometry, name)
            .and_then(|id| self.fields.get(id))?
            .derived_rule()?;

        Some(self.grid.derived_values(rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_defaults() {
        let vtk = VtkUnstructured::new("out", "grid");

        assert_eq!(vtk.fields().group(Group::Geometry).len(), 4);

        let points = vtk.field(POINTS).unwrap();
        assert_eq!(points.data_type(), DataType::Float64);
        assert_eq!(points.shape(), FieldShape::Vector);
        assert_eq!(points.location(), Location::Point);

        for name in [OFFSETS, TYPES, CONNECTIVITY] {
            let field = vtk.field(name).unwrap();
            assert_eq!(field.location(), Location::Cell);
            assert!(!field.is_derived());
        }
    }

    #[test]
    fn homogeneous_derivation() {
        let mut vtk = VtkUnstructured::new("out", "grid");
        vtk.set_homogeneous_dimensions(4, 6, ElementType::Triangle);

        assert_eq!(vtk.connectivity_size(), 12);
        assert_eq!(vtk.derived_values(OFFSETS), Some(vec![3, 6, 9, 12]));
        assert_eq!(vtk.derived_values(TYPES), Some(vec![5; 4]));
        assert_eq!(vtk.derived_values(CONNECTIVITY), None);

        let connectivity = vtk.field(CONNECTIVITY).unwrap();
        assert_eq!(connectivity.shape(), FieldShape::Constant);
        assert_eq!(connectivity.components(), 3);
        assert_eq!(connectivity.elements(), 4);
        assert_eq!(connectivity.value_count(), 12);
    }

    #[test]
    fn homogeneous_connectivity_is_derived() {
        let mut vtk = VtkUnstructured::homogeneous("out", "grid", ElementType::Triangle);
        vtk.set_dimensions(4, 6, 0);

        assert_eq!(vtk.connectivity_size(), 12);
        assert_eq!(vtk.field(CONNECTIVITY).unwrap().value_count(), 12);

        let mut mixed = VtkUnstructured::new("out", "grid");
        mixed.set_dimensions(4, 6, 13);
        assert_eq!(mixed.connectivity_size(), 13);
    }

    #[test]
    fn polygons_are_not_homogeneous() {
        let mut vtk = VtkUnstructured::new("out", "grid");
        vtk.set_element_type(ElementType::Polygon);
        assert_eq!(vtk.element_type(), None);
        assert!(!vtk.field(OFFSETS).unwrap().is_derived());
    }

    #[test]
    fn dimensions_reach_data_arrays() {
        let mut vtk = VtkUnstructured::new("out", "grid");
        vtk.add_data("p", FieldShape::Scalar, Location::Point);
        vtk.add_data("id", FieldShape::Scalar, Location::Cell);
        vtk.set_dimensions(2, 5, 7);

        assert_eq!(vtk.field("p").unwrap().elements(), 5);
        assert_eq!(vtk.field("id").unwrap().elements(), 2);
        assert_eq!(vtk.field(CONNECTIVITY).unwrap().elements(), 7);

        // declared after the dimensions
        vtk.add_data("u", FieldShape::Vector, Location::Point);
        assert_eq!(vtk.field("u").unwrap().value_count(), 15);
    }

    #[test]
    fn shell_layout() {
        let mut vtk = VtkUnstructured::new("out", "grid");
        vtk.set_dimensions(1, 3, 3);

        let mut out = Vec::new();
        vtk.grid().write_meta_data(vtk.fields(), vtk.config(), &mut out);
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("<?xml version=\"1.0\"?>\n<VTKFile type=\"UnstructuredGrid\""));
        assert!(text.contains(r#"header_type="UInt32""#));
        assert!(text.contains(r#"<Piece  NumberOfPoints="3" NumberOfCells="1">"#));

        let points = text.find(r#"Name="Points""#).unwrap();
        let offsets = text.find(r#"Name="offsets""#).unwrap();
        let connectivity = text.find(r#"Name="connectivity""#).unwrap();
        assert!(points < offsets && offsets < connectivity);

        assert!(text.ends_with("<AppendedData encoding=\"raw\">\n_\n  </AppendedData>\n</VTKFile>\n"));
    }

    #[test]
    fn missing_dimensions_from_source() {
        struct Counts;

        impl FieldSource for Counts {
            fn element_count(&self, location: Location) -> Option<u64> {
                match location {
                    Location::Point => Some(8),
                    _ => Some(1),
                }
            }

            fn flush(&self, name: &str, _sink: &mut PayloadWriter) -> Result<(), Error> {
                Err(Error::FieldNotFound(name.into()))
            }

            fn absorb(&mut self, name: &str, _source: &mut PayloadReader) -> Result<(), Error> {
                Err(Error::FieldNotFound(name.into()))
            }
        }

        let mut vtk = VtkUnstructured::homogeneous("out", "grid", ElementType::Hexahedron);
        let grid = &mut vtk.grid;
        grid.set_missing_global_data(&mut vtk.fields, &Counts);

        assert_eq!(vtk.cell_count(), 1);
        assert_eq!(vtk.point_count(), 8);
        assert_eq!(vtk.connectivity_size(), 8);
    }
}
