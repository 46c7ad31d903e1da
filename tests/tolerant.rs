mod common;

use common::Geometry;

use vtk_xml::{Encoding, Location, VtkUnstructured};

fn encode(encoding: Encoding) -> Vec<u8> {
    let mut vtk = VtkUnstructured::new(common::temp_dir("tolerant"), "broken");
    vtk.set_codex(encoding);
    vtk.set_dimensions(2, 4, 6);
    vtk.add_data_buffer("p", Location::Point, vec![1.0f32, 2.0, 3.0, 4.0]);
    vtk.add_data_buffer("id", Location::Cell, vec![7u8, 9]);

    vtk.encode(&Geometry::two_triangles())
}

fn replace(bytes: &[u8], from: &str, to: &str) -> Vec<u8> {
    let start = bytes
        .windows(from.len())
        .position(|window| window == from.as_bytes())
        .unwrap();

    let mut out = bytes[..start].to_vec();
    out.extend_from_slice(to.as_bytes());
    out.extend_from_slice(&bytes[start + from.len()..]);
    out
}

fn decode(bytes: &[u8]) -> (VtkUnstructured, Geometry) {
    let mut vtk = VtkUnstructured::new(common::temp_dir("tolerant"), "broken");
    vtk.add_data_buffer("p", Location::Point, Vec::<f32>::new());
    vtk.add_data_buffer("id", Location::Cell, Vec::<u8>::new());

    let mut geometry = Geometry::default();
    vtk.decode(bytes, &mut geometry);
    (vtk, geometry)
}

#[test]
fn header_without_format_is_skipped() {
    let bytes = encode(Encoding::Appended);
    let bytes = replace(&bytes, r#"Name="p" NumberOfComponents="1" format="appended""#, r#"Name="p" NumberOfComponents="1""#);

    let (mut vtk, geometry) = decode(&bytes);

    assert_eq!(vtk.field_buffer::<Vec<f32>>("p"), Some(&Vec::new()));
    assert_eq!(vtk.field_buffer::<Vec<u8>>("id"), Some(&vec![7, 9]));
    assert_eq!(geometry, Geometry::two_triangles());

    // the declaration survives, so the same engine writes a valid file again
    let p = vtk.field("p").unwrap();
    assert_eq!(p.encoding(), Encoding::Appended);
    assert_eq!(p.location(), Location::Point);

    let rewritten = vtk.encode(&geometry);
    let header = common::headers(&rewritten)
        .into_iter()
        .find(|header| header.name == "p")
        .unwrap();
    assert_eq!(header.encoding, Encoding::Appended);
}

#[test]
fn unknown_type_is_not_read() {
    let bytes = encode(Encoding::Appended);
    let bytes = replace(&bytes, r#"type="UInt8" Name="id""#, r#"type="Complex" Name="id""#);

    let (vtk, geometry) = decode(&bytes);

    assert_eq!(vtk.field("id").unwrap().data_type(), vtk_xml::DataType::Undefined);
    assert_eq!(vtk.field_buffer::<Vec<u8>>("id"), Some(&Vec::new()));
    assert_eq!(vtk.field_buffer::<Vec<f32>>("p"), Some(&vec![1.0, 2.0, 3.0, 4.0]));
    assert_eq!(geometry, Geometry::two_triangles());
}

#[test]
fn invalid_ascii_value() {
    let bytes = encode(Encoding::Ascii);
    assert_eq!(common::inline_values(&bytes, "id"), "7 9");
    let bytes = replace(&bytes, "7 9\n", "7 x\n");

    let (vtk, geometry) = decode(&bytes);

    assert_eq!(vtk.field_buffer::<Vec<u8>>("id"), Some(&Vec::new()));
    assert_eq!(vtk.field_buffer::<Vec<f32>>("p"), Some(&vec![1.0, 2.0, 3.0, 4.0]));
    assert_eq!(geometry, Geometry::two_triangles());
}

#[test]
fn truncated_appended_section() {
    let bytes = encode(Encoding::Appended);
    let cut = common::marker(&bytes) + 10;

    let (vtk, geometry) = decode(&bytes[..cut]);

    assert_eq!(vtk.cell_count(), 2);
    assert_eq!(vtk.point_count(), 4);
    assert_eq!(vtk.field_buffer::<Vec<f32>>("p"), Some(&Vec::new()));
    assert!(geometry.points.is_empty());
    assert!(geometry.connectivity.is_empty());
}

#[test]
fn not_a_vtk_file() {
    let (vtk, geometry) = decode(b"this is not xml at all\n");

    assert_eq!(vtk.cell_count(), 0);
    assert_eq!(vtk.point_count(), 0);
    assert_eq!(geometry, Geometry::default());
}
