//! Text fragments of the xml shell of a file.
//!
//! The shell is written with empty `DataArray` elements. Inline values and
//! the appended blocks are filled in afterwards by the engine, which locates
//! the header lines written here by name.

use crate::field::FieldDescriptor;
use crate::registry::FieldRegistry;
use crate::types::{Encoding, FieldShape, Location};

use std::io::Write;

const ARRAY_INDENT: &str = "        ";
const SECTION_INDENT: &str = "      ";

/// Components written in the header of `field`. Connectivity is always stored
/// flat, whatever stride the descriptor uses internally.
fn header_components(field: &FieldDescriptor) -> u8 {
    if field.name() == "connectivity" {
        1
    } else {
        field.components()
    }
}

/// Single line header of a `DataArray`. The `offset` attribute is only
/// present for appended arrays.
pub(crate) fn data_array_header(field: &FieldDescriptor) -> String {
    let encoding = field.effective_encoding();

    let mut header = format!(
        r#"<DataArray type="{}" Name="{}" NumberOfComponents="{}" format="{}""#,
        field.data_type(),
        field.name(),
        header_components(field),
        encoding,
    );

    if encoding == Encoding::Appended {
        header.push_str(&format!(r#" offset="{}""#, field.offset()));
    }

    header.push_str(" >");
    header
}

/// Single line header of a `PDataArray` in a collection file
pub(crate) fn pdata_array_header(field: &FieldDescriptor) -> String {
    format!(
        r#"<PDataArray type="{}" Name="{}" NumberOfComponents="{}" >"#,
        field.data_type(),
        field.name(),
        header_components(field),
    )
}

/// write an empty `DataArray` element for `field`
pub(crate) fn write_data_array(out: &mut Vec<u8>, field: &FieldDescriptor) {
    // writing to a `Vec` cannot fail
    let _ = writeln!(out, "{ARRAY_INDENT}{}", data_array_header(field));
    let _ = writeln!(out, "{ARRAY_INDENT}</DataArray>");
}

pub(crate) fn write_pdata_array(out: &mut Vec<u8>, field: &FieldDescriptor) {
    let _ = writeln!(out, "{ARRAY_INDENT}{}", pdata_array_header(field));
    let _ = writeln!(out, "{ARRAY_INDENT}</PDataArray>");
}

/// `Scalars` and `Vectors` attributes listing the active arrays of a section
fn section_attributes<'a, I>(fields: I) -> String
where
    I: Iterator<Item = &'a FieldDescriptor>,
{
    let mut scalars = Vec::new();
    let mut vectors = Vec::new();

    for field in fields {
        match field.shape() {
            FieldShape::Scalar => scalars.push(field.name()),
            FieldShape::Vector => vectors.push(field.name()),
            FieldShape::Constant | FieldShape::Undefined => (),
        }
    }

    let mut attributes = String::new();

    if !scalars.is_empty() {
        attributes.push_str(&format!(r#" Scalars="{}""#, scalars.join(" ")));
    }

    if !vectors.is_empty() {
        attributes.push_str(&format!(r#" Vectors="{}""#, vectors.join(" ")));
    }

    attributes
}

/// Write the `PointData` or `CellData` section of a piece, or its `P`
/// prefixed counterpart for a collection file.
pub(crate) fn write_data_header(
    out: &mut Vec<u8>,
    fields: &FieldRegistry,
    location: Location,
    collection: bool,
) {
    let prefix = if collection { "P" } else { "" };
    let section = format!("{prefix}{location}Data");

    let located: Vec<&FieldDescriptor> = fields
        .data_at(location)
        .into_iter()
        .filter_map(|id| fields.get(id))
        .collect();

    let _ = writeln!(
        out,
        "{SECTION_INDENT}<{section}{} >",
        section_attributes(located.iter().copied())
    );

    for field in located {
        if collection {
            write_pdata_array(out, field);
        } else {
            write_data_array(out, field);
        }
    }

    let _ = writeln!(out, "{SECTION_INDENT}</{section}>");
}

/// Empty appended section. Appended blocks are inserted right after the `_`.
pub(crate) fn write_appended_shell(out: &mut Vec<u8>) {
    out.extend_from_slice(b"  <AppendedData encoding=\"raw\">\n_\n  </AppendedData>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Group;
    use crate::types::DataType;

    fn field(name: &str, shape: FieldShape, location: Location, encoding: Encoding) -> FieldDescriptor {
        let mut field = FieldDescriptor::new(name);
        field.set_data_type(DataType::Float64);
        field.set_shape(shape);
        field.set_location(location);
        field.set_encoding(encoding);
        field
    }

    #[test]
    fn headers() {
        let mut u = field("u", FieldShape::Vector, Location::Point, Encoding::Appended);
        u.set_offset(64);
        assert_eq!(
            data_array_header(&u),
            r#"<DataArray type="Float64" Name="u" NumberOfComponents="3" format="appended" offset="64" >"#
        );
        assert_eq!(
            pdata_array_header(&u),
            r#"<PDataArray type="Float64" Name="u" NumberOfComponents="3" >"#
        );

        let p = field("p", FieldShape::Scalar, Location::Point, Encoding::Ascii);
        assert_eq!(
            data_array_header(&p),
            r#"<DataArray type="Float64" Name="p" NumberOfComponents="1" format="ascii" >"#
        );

        let mut connectivity = field("connectivity", FieldShape::Scalar, Location::Cell, Encoding::Ascii);
        connectivity.set_components(4);
        connectivity.set_shape(FieldShape::Constant);
        assert!(data_array_header(&connectivity).contains(r#"NumberOfComponents="1""#));
    }

    #[test]
    fn headers_parse_back() {
        let mut u = field("u", FieldShape::Vector, Location::Cell, Encoding::Appended);
        u.set_offset(12);

        let header = crate::parse::parse_dataarray_header(&data_array_header(&u)).unwrap();
        assert_eq!(header.name, "u");
        assert_eq!(header.components, 3);
        assert_eq!(header.offset, Some(12));
    }

    #[test]
    fn sections() {
        let mut fields = FieldRegistry::new();
        fields.insert(Group::Data, field("p", FieldShape::Scalar, Location::Point, Encoding::Ascii));
        fields.insert(Group::Data, field("u", FieldShape::Vector, Location::Point, Encoding::Ascii));
        fields.insert(Group::Data, field("rho", FieldShape::Scalar, Location::Point, Encoding::Ascii));
        fields.insert(Group::Data, field("id", FieldShape::Scalar, Location::Cell, Encoding::Ascii));

        let mut out = Vec::new();
        write_data_header(&mut out, &fields, Location::Point, false);
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(r#"      <PointData Scalars="p rho" Vectors="u" >"#));
        assert_eq!(text.matches("<DataArray").count(), 3);
        assert!(text.ends_with("</PointData>\n"));

        let mut out = Vec::new();
        write_data_header(&mut out, &fields, Location::Cell, true);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"<PCellData Scalars="id" >"#));
        assert!(text.contains("</PDataArray>"));
    }
}
