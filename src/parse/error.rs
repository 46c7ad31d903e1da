use crate::prelude::*;

use super::event_summary::EventSummary;

use quick_xml::name::QName;

/// An error caused from parsing the text section of a vtk file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Error parsing DataArray header line: {0}")]
    HeaderLine(#[from] HeaderLine),
    #[error("could not find the `_` marker of the <AppendedData> section")]
    AppendedMarker,
    #[error("DataArray `{0}` not found")]
    DataArrayNotFound(String),
    #[error("payload of `{0}` ended before all of its values were read")]
    Truncated(String),
    #[error("could not parse ascii value `{token}` of DataArray `{name}`")]
    AsciiValue { name: String, token: String },
}

#[derive(Debug, thiserror::Error, From)]
pub enum HeaderLine {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    InvalidAttributeValue(InvalidAttributeValue),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(From, Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(From, Display, Debug, Constructor)]
#[display(fmt = "attribute `{attribute_name}` in {element_name} element has invalid value {actual_value}")]
pub struct InvalidAttributeValue {
    element_name: String,
    attribute_name: String,
    actual_value: ParsedNameOrBytes,
}

#[derive(From, Display, Debug, Clone, PartialEq)]
pub enum ParsedNameOrBytes {
    #[display(fmt = "{_0}")]
    Utf8(String),
    #[display(fmt = "{_0:?} (cannot convert to UTF8 string)")]
    Bytes(Vec<u8>),
}

impl ParsedNameOrBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        let vec = Vec::from(bytes);
        match String::from_utf8(vec) {
            Ok(string) => Self::Utf8(string),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }
}

impl<'a> From<QName<'a>> for ParsedNameOrBytes {
    fn from(x: QName) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<&'a str> for ParsedNameOrBytes {
    fn from(x: &str) -> Self {
        Self::Utf8(x.into())
    }
}
