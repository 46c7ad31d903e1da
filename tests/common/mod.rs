#![allow(dead_code)]

use std::path::PathBuf;

use vtk_xml::parse::{parse_dataarray_header, DataArrayHeader};
use vtk_xml::{Error, FieldBuffer, FieldMetaData, FieldSource, PayloadReader, PayloadWriter, Vector};

/// Geometry of a grid, moved through the source interface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub points: Vector<f64>,
    pub offsets: Vec<i32>,
    pub types: Vec<i32>,
    pub connectivity: Vec<i32>,
}

impl Geometry {
    /// two triangles sharing an edge: 2 cells, 4 points, 6 connectivity entries
    pub fn two_triangles() -> Self {
        Self {
            points: Vector::new(vec![
                [0., 0., 0.],
                [1., 0., 0.],
                [0., 1., 0.],
                [1., 1., 0.],
            ]),
            offsets: vec![3, 6],
            types: vec![5, 5],
            connectivity: vec![0, 1, 2, 1, 3, 2],
        }
    }

    /// `cells` triangles in a strip, without offsets and types
    pub fn strip(cells: usize) -> Self {
        let points = (0..cells + 2)
            .map(|i| [(i / 2) as f64, (i % 2) as f64, 0.])
            .collect();

        let connectivity = (0..cells)
            .flat_map(|cell| {
                let cell = cell as i32;
                [cell, cell + 1, cell + 2]
            })
            .collect();

        Self {
            points: Vector::new(points),
            offsets: Vec::new(),
            types: Vec::new(),
            connectivity,
        }
    }

    fn buffer(&self, name: &str) -> Option<&dyn FieldBuffer> {
        match name {
            "Points" => Some(&self.points as &dyn FieldBuffer),
            "offsets" => Some(&self.offsets as &dyn FieldBuffer),
            "types" => Some(&self.types as &dyn FieldBuffer),
            "connectivity" => Some(&self.connectivity as &dyn FieldBuffer),
            _ => None,
        }
    }

    fn buffer_mut(&mut self, name: &str) -> Option<&mut dyn FieldBuffer> {
        match name {
            "Points" => Some(&mut self.points as &mut dyn FieldBuffer),
            "offsets" => Some(&mut self.offsets as &mut dyn FieldBuffer),
            "types" => Some(&mut self.types as &mut dyn FieldBuffer),
            "connectivity" => Some(&mut self.connectivity as &mut dyn FieldBuffer),
            _ => None,
        }
    }
}

impl FieldSource for Geometry {
    fn field_metadata(&self, name: &str) -> Option<FieldMetaData> {
        self.buffer(name).map(|buffer| buffer.meta_data())
    }

    fn flush(&self, name: &str, sink: &mut PayloadWriter) -> Result<(), Error> {
        match self.buffer(name) {
            Some(buffer) => buffer.flush(sink),
            None => Err(Error::FieldNotFound(name.into())),
        }
    }

    fn absorb(&mut self, name: &str, source: &mut PayloadReader) -> Result<(), Error> {
        match self.buffer_mut(name) {
            Some(buffer) => buffer.absorb(source),
            None => Err(Error::FieldNotFound(name.into())),
        }
    }
}

/// a fresh directory for the files of one test
pub fn temp_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("vtk-xml-tests").join(test);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// position of the first byte after the `_` marker
pub fn marker(bytes: &[u8]) -> usize {
    let tag = bytes
        .windows(b"<AppendedData".len())
        .position(|window| window == b"<AppendedData")
        .unwrap();

    tag + bytes[tag..].iter().position(|b| *b == b'_').unwrap() + 1
}

/// the raw blocks of the appended section
pub fn appended_blob(bytes: &[u8]) -> &[u8] {
    let footer = b"\n  </AppendedData>\n</VTKFile>\n";
    assert!(bytes.ends_with(footer));
    &bytes[marker(bytes)..bytes.len() - footer.len()]
}

/// the text in front of the appended section
pub fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes[..marker(bytes)].to_vec()).unwrap()
}

/// every `DataArray` header of the text section, in file order
pub fn headers(bytes: &[u8]) -> Vec<DataArrayHeader> {
    text(bytes)
        .lines()
        .filter(|line| line.contains("<DataArray"))
        .map(|line| parse_dataarray_header(line).unwrap())
        .collect()
}

/// the inline values written after the header of `name`
pub fn inline_values(bytes: &[u8], name: &str) -> String {
    let text = text(bytes);
    let header = format!(r#"Name="{name}""#);

    let mut lines = text.lines().skip_while(|line| !line.contains(&header));
    lines.next().unwrap();
    lines.next().unwrap().trim().to_string()
}
