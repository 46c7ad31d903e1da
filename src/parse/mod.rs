//! reading and parsing the text section of xml VTK files
//!
//! The text of a file is never parsed as a whole document. Instead it is
//! scanned line by line and only the lines that matter (the `VTKFile` and
//! `Piece` elements and the `DataArray` headers) are handed to `quick_xml`.
//! This keeps the scanner independent of the raw bytes stored after the
//! `_` marker of the appended section.

mod error;
mod event_summary;

pub use error::*;
use event_summary::EventSummary;

use crate::field::FieldDescriptor;
use crate::registry::{FieldRegistry, Group};
use crate::types::{parse_or_undefined, DataType, Encoding, Location};
use crate::utils;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Everything a `DataArray` header line says about a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArrayHeader {
    pub name: String,
    pub data_type: DataType,
    pub components: u8,
    pub encoding: Encoding,
    /// only present for appended arrays
    pub offset: Option<u64>,
}

/// Parse a single `DataArray` header line.
///
/// `type`, `Name` and `format` are required, `NumberOfComponents` defaults to
/// one and `offset` is required for appended arrays. Type or format strings
/// that are not recognized parse to the `Undefined` variants.
pub fn parse_dataarray_header(line: &str) -> Result<DataArrayHeader, HeaderLine> {
    const ELEMENT: &str = "DataArray";

    let start = read_start_element(line)?;

    if start.name().as_ref() != ELEMENT.as_bytes() {
        return Err(UnexpectedElement::new(ELEMENT, EventSummary::start(&start)).into());
    }

    let type_ = required_attribute(&start, ELEMENT, "type")?;
    let name = required_attribute(&start, ELEMENT, "Name")?;
    let format = required_attribute(&start, ELEMENT, "format")?;

    let components = match attribute_value(&start, ELEMENT, "NumberOfComponents")? {
        Some(value) => parse_number::<u8>(&value, ELEMENT, "NumberOfComponents")?,
        None => 1,
    };

    let (data_type, known_type) = parse_or_undefined::<DataType>(type_.trim());
    if !known_type {
        log::warn!("DataArray `{name}` has unknown type `{type_}`");
    }

    let (encoding, known_format) = parse_or_undefined::<Encoding>(format.trim());
    if !known_format {
        log::warn!("DataArray `{name}` has unknown format `{format}`");
    }

    let offset = if encoding == Encoding::Appended {
        let value = required_attribute(&start, ELEMENT, "offset")?;
        Some(parse_number::<u64>(&value, ELEMENT, "offset")?)
    } else {
        None
    };

    Ok(DataArrayHeader {
        name,
        data_type,
        components,
        encoding,
        offset,
    })
}

/// Value of attribute `key` of the first element on `line`, which must be an
/// `element` element
pub(crate) fn element_attribute(
    line: &str,
    element: &str,
    key: &str,
) -> Result<Option<String>, HeaderLine> {
    let start = read_start_element(line)?;

    if start.name().as_ref() != element.as_bytes() {
        return Err(UnexpectedElement::new(element, EventSummary::start(&start)).into());
    }

    attribute_value(&start, element, key)
}

/// the first start (or empty) element of a line of text
fn read_start_element(line: &str) -> Result<BytesStart<'_>, HeaderLine> {
    let mut reader = Reader::from_str(line.trim());
    reader.trim_text(true);

    loop {
        let event = reader.read_event().map_err(MalformedXml::from)?;

        match event {
            Event::Start(start) | Event::Empty(start) => return Ok(start),
            Event::Decl(_) | Event::Comment(_) => continue,
            other => {
                return Err(UnexpectedElement::new("start element", EventSummary::new(&other)).into())
            }
        }
    }
}

fn attribute_value(
    start: &BytesStart<'_>,
    element: &str,
    key: &str,
) -> Result<Option<String>, HeaderLine> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(MalformedAttribute::from)?;

        if attribute.key.as_ref() == key.as_bytes() {
            let value = std::str::from_utf8(&attribute.value).map_err(|_| {
                InvalidAttributeValue::new(
                    element.into(),
                    key.into(),
                    ParsedNameOrBytes::new(&attribute.value),
                )
            })?;

            return Ok(Some(value.to_string()));
        }
    }

    Ok(None)
}

fn required_attribute(start: &BytesStart<'_>, element: &str, key: &str) -> Result<String, HeaderLine> {
    attribute_value(start, element, key)?
        .ok_or_else(|| MissingAttribute::new(element.into(), key.into()).into())
}

fn parse_number<T: std::str::FromStr>(value: &str, element: &str, key: &str) -> Result<T, HeaderLine> {
    value.trim().parse::<T>().map_err(|_| {
        InvalidAttributeValue::new(element.into(), key.into(), ParsedNameOrBytes::from(value)).into()
    })
}

/// Line oriented cursor over the bytes of a file
#[derive(Debug, Clone)]
pub(crate) struct LineScanner<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> LineScanner<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// byte position of the start of the next line
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn seek(&mut self, position: usize) {
        self.position = position.min(self.input.len());
    }

    /// the next line without its terminator
    pub(crate) fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.position >= self.input.len() {
            return None;
        }

        let rest = &self.input[self.position..];

        let (line, advance) = match rest.iter().position(|b| *b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };

        self.position += advance;

        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// advance to the first line containing `needle` and return it as text
    pub(crate) fn find_line(&mut self, needle: &str) -> Option<&'a str> {
        while let Some(line) = self.next_line() {
            if utils::contains_bytes(line, needle.as_bytes()) {
                if let Ok(text) = std::str::from_utf8(line) {
                    return Some(text);
                }
            }
        }

        None
    }
}

/// Position of the first byte after the `_` marker of the appended section
pub(crate) fn find_appended_marker(input: &[u8]) -> Option<usize> {
    let tag = utils::find_bytes(input, b"<AppendedData")?;
    let tag_end = tag + input[tag..].iter().position(|b| *b == b'>')?;
    let marker = tag_end + input[tag_end..].iter().position(|b| *b == b'_')?;
    Some(marker + 1)
}

/// Collect the `DataArray` headers of the `PointData` and `CellData`
/// sections of a file.
///
/// Headers whose name matches an existing data descriptor are merged into it,
/// anything else becomes a new descriptor in the data group. Lines that fail
/// to parse are skipped with a warning. Scanning stops at the end of the
/// piece.
///
/// Returns the names of the arrays found in the file. Declared arrays missing
/// from it keep their descriptor, only their stream position is cleared.
pub(crate) fn read_data_header(lines: &mut LineScanner<'_>, fields: &mut FieldRegistry) -> Vec<String> {
    let mut section = None;
    let mut found = Vec::new();

    while let Some(line) = lines.next_line() {
        if utils::contains_bytes(line, b"</Piece") {
            break;
        }

        if utils::contains_bytes(line, b"<PointData") {
            section = Some(Location::Point);
        } else if utils::contains_bytes(line, b"<CellData") {
            section = Some(Location::Cell);
        } else if utils::contains_bytes(line, b"</PointData")
            || utils::contains_bytes(line, b"</CellData")
            || utils::contains_bytes(line, b"<Points")
            || utils::contains_bytes(line, b"<Cells")
        {
            section = None;
        }

        let location = match section {
            Some(location) => location,
            None => continue,
        };

        if !utils::contains_bytes(line, b"<DataArray") {
            continue;
        }

        let header = match std::str::from_utf8(line) {
            Ok(text) => parse_dataarray_header(text),
            Err(_) => {
                log::warn!("skipping a DataArray header in {location}Data that is not valid UTF-8");
                continue;
            }
        };

        match header {
            Ok(header) => {
                found.push(header.name.clone());
                merge_discovered(fields, header, location, lines.position());
            }
            Err(e) => log::warn!("skipping a DataArray in {location}Data: {e}"),
        }
    }

    let ids = fields.group(Group::Data).to_vec();
    for id in ids {
        if let Some(field) = fields.get_mut(id) {
            if !found.iter().any(|name| name == field.name()) {
                log::warn!("{}, it is not read", ParseError::DataArrayNotFound(field.name().into()));
                field.set_position(None);
            }
        }
    }

    found
}

fn merge_discovered(
    fields: &mut FieldRegistry,
    header: DataArrayHeader,
    location: Location,
    position: usize,
) {
    let position = (header.encoding == Encoding::Ascii).then_some(position);

    let existing = fields
        .find_in(Group::Data, &header.name)
        .and_then(|id| fields.get_mut(id));

    match existing {
        Some(field) => {
            field.merge_header(&header);
            field.set_location(location);
            field.set_position(position);
        }
        None => {
            let mut field = FieldDescriptor::from(header);
            field.set_location(location);
            field.set_position(position);
            fields.insert(Group::Data, field);
        }
    }
}

/// Advance to the header line of the array called `name` and parse it.
///
/// Lines mentioning `name` that do not parse, or whose `Name` attribute is
/// a different name, are passed over. The scanner is left at the start of
/// the line following the header.
pub(crate) fn find_header(lines: &mut LineScanner<'_>, name: &str) -> Option<DataArrayHeader> {
    while let Some(line) = lines.next_line() {
        if !utils::contains_bytes(line, b"<DataArray")
            || !utils::contains_bytes(line, name.as_bytes())
        {
            continue;
        }

        let header = match std::str::from_utf8(line).map(parse_dataarray_header) {
            Ok(Ok(header)) => header,
            Ok(Err(e)) => {
                log::warn!("skipping a malformed DataArray header while looking for `{name}`: {e}");
                continue;
            }
            Err(_) => continue,
        };

        if header.name == name {
            return Some(header);
        }
    }

    None
}

/// Advance to the header line of `field` and merge it into the descriptor.
///
/// Returns `false` if the end of the input is reached without finding it.
pub(crate) fn read_data_array(lines: &mut LineScanner<'_>, field: &mut FieldDescriptor) -> bool {
    match find_header(lines, field.name()) {
        Some(header) => {
            let position = (header.encoding == Encoding::Ascii).then_some(lines.position());
            field.merge_header(&header);
            field.set_position(position);
            true
        }
        None => false,
    }
}

/// number of whitespace separated values between `position` and the closing
/// tag of the `DataArray` they belong to
pub(crate) fn count_ascii_tokens(input: &[u8], position: usize) -> u64 {
    let rest = input.get(position..).unwrap_or_default();
    let end = utils::find_bytes(rest, b"</DataArray").unwrap_or(rest.len());

    rest[..end]
        .split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldShape;

    #[test]
    fn appended_header() {
        let line = r#"        <DataArray type="Float64" Name="Points" NumberOfComponents="3" format="appended" offset="120" >"#;
        let header = parse_dataarray_header(line).unwrap();

        assert_eq!(header.name, "Points");
        assert_eq!(header.data_type, DataType::Float64);
        assert_eq!(header.components, 3);
        assert_eq!(header.encoding, Encoding::Appended);
        assert_eq!(header.offset, Some(120));
    }

    #[test]
    fn ascii_header_defaults() {
        let line = r#"<DataArray type="UInt8" Name="types" format="ascii">"#;
        let header = parse_dataarray_header(line).unwrap();

        assert_eq!(header.components, 1);
        assert_eq!(header.encoding, Encoding::Ascii);
        assert_eq!(header.offset, None);
    }

    #[test]
    fn unknown_strings_are_undefined() {
        let line = r#"<DataArray type="Float128" Name="x" format="binary"/>"#;
        let header = parse_dataarray_header(line).unwrap();

        assert_eq!(header.data_type, DataType::Undefined);
        assert_eq!(header.encoding, Encoding::Undefined);
    }

    #[test]
    fn missing_attributes() {
        let no_format = r#"<DataArray type="Float32" Name="rho" >"#;
        assert!(matches!(
            parse_dataarray_header(no_format),
            Err(HeaderLine::MissingAttribute(_))
        ));

        let no_offset = r#"<DataArray type="Float32" Name="rho" format="appended">"#;
        assert!(matches!(
            parse_dataarray_header(no_offset),
            Err(HeaderLine::MissingAttribute(_))
        ));

        let bad_components = r#"<DataArray type="Float32" Name="rho" NumberOfComponents="x" format="ascii">"#;
        assert!(matches!(
            parse_dataarray_header(bad_components),
            Err(HeaderLine::InvalidAttributeValue(_))
        ));

        assert!(matches!(
            parse_dataarray_header("<Points>"),
            Err(HeaderLine::UnexpectedElement(_))
        ));
    }

    #[test]
    fn piece_attributes() {
        let line = r#"    <Piece  NumberOfPoints="8" NumberOfCells="1">"#;
        assert_eq!(
            element_attribute(line, "Piece", "NumberOfCells").unwrap(),
            Some("1".to_string())
        );
        assert_eq!(element_attribute(line, "Piece", "Missing").unwrap(), None);
        assert!(element_attribute(line, "VTKFile", "type").is_err());
    }

    #[test]
    fn lines_and_marker() {
        let input = b"first\r\nsecond\n  <AppendedData encoding=\"raw\">\n_\x01\x02";
        let mut lines = LineScanner::new(input);

        assert_eq!(lines.next_line(), Some(&b"first"[..]));
        assert_eq!(lines.position(), 7);
        assert_eq!(lines.find_line("AppendedData"), Some("  <AppendedData encoding=\"raw\">"));

        let marker = find_appended_marker(input).unwrap();
        assert_eq!(&input[marker..], b"\x01\x02");

        assert_eq!(find_appended_marker(b"<VTKFile>"), None);
    }

    #[test]
    fn data_header_sections() {
        let text = r#"    <Piece  NumberOfPoints="4" NumberOfCells="1">
      <PointData Scalars="p" >
        <DataArray type="Float32" Name="p" NumberOfComponents="1" format="ascii" >
1 2 3 4
        </DataArray>
        <DataArray type="Float32" Name="broken" NumberOfComponents="1" >
        </DataArray>
      </PointData>
      <CellData Vectors="u" >
        <DataArray type="Float64" Name="u" NumberOfComponents="3" format="appended" offset="0" >
        </DataArray>
      </CellData>
      <Points>
        <DataArray type="Float64" Name="Points" NumberOfComponents="3" format="appended" offset="24" >
        </DataArray>
      </Points>
    </Piece>
"#;
        let mut fields = FieldRegistry::new();
        let mut existing = FieldDescriptor::new("u");
        existing.set_location(Location::Point);
        fields.insert(Group::Data, existing);

        let mut absent = FieldDescriptor::new("absent");
        absent.set_encoding(Encoding::Appended);
        fields.insert(Group::Data, absent);

        let mut lines = LineScanner::new(text.as_bytes());
        let found = read_data_header(&mut lines, &mut fields);
        assert_eq!(found, vec!["p".to_string(), "u".to_string()]);

        assert_eq!(fields.group(Group::Data).len(), 3);
        assert!(fields.by_name("broken").is_none());
        assert_eq!(fields.by_name("absent").unwrap().encoding(), Encoding::Appended);
        assert!(fields.by_name("Points").is_none());

        let p = fields.by_name("p").unwrap();
        assert_eq!(p.location(), Location::Point);
        assert_eq!(p.shape(), FieldShape::Scalar);
        let position = p.position().unwrap();
        assert_eq!(count_ascii_tokens(text.as_bytes(), position), 4);

        let u = fields.by_name("u").unwrap();
        assert_eq!(u.location(), Location::Cell);
        assert_eq!(u.shape(), FieldShape::Vector);
        assert_eq!(u.position(), None);
    }

    #[test]
    fn data_array_by_exact_name() {
        let text = r#"<DataArray type="Int32" Name="connectivity_extra" format="ascii" >
</DataArray>
<DataArray type="Int64" Name="connectivity" format="appended" offset="48" >
</DataArray>
"#;
        let mut field = FieldDescriptor::new("connectivity");
        field.set_components(4);
        field.set_shape(FieldShape::Constant);

        let mut lines = LineScanner::new(text.as_bytes());
        assert!(read_data_array(&mut lines, &mut field));
        assert_eq!(field.data_type(), DataType::Int64);
        assert_eq!(field.offset(), 48);
        assert_eq!(field.components(), 4);

        assert!(!read_data_array(&mut lines, &mut field));
    }

    #[test]
    fn tokens_on_one_line() {
        let text = b"<DataArray>1 2 3</DataArray>";
        assert_eq!(count_ascii_tokens(text, 11), 3);
        assert_eq!(count_ascii_tokens(text, 100), 0);
    }
}
