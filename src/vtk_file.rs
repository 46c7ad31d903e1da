//! The grid independent part of reading and writing a file.
//!
//! A write runs through the following steps:
//!
//! 1. missing sizes and types are requested from the buffers and the
//!    [`FieldSource`], then the grid fills in its own dimensions
//! 2. offsets of the appended blocks are computed from scratch
//! 3. the grid writes the text shell with empty arrays
//! 4. inline values are inserted after their header lines
//! 5. appended blocks are inserted after the `_` marker of the shell
//!
//! The whole file is built in memory and written with a single call, so a
//! failing write never leaves a half edited file behind. Reading parses the
//! shell first and then reads every stored array from its offset (appended)
//! or from the position recorded while parsing (ascii).

use crate::array::FieldBuffer;
use crate::config::Config;
use crate::field::FieldDescriptor;
use crate::file_name::FileName;
use crate::parse::{self, LineScanner, ParseError};
use crate::payload::{PayloadReader, PayloadWriter};
use crate::registry::{FieldId, FieldRegistry, Group};
use crate::traits::{FieldSource, Grid};
use crate::types::{DataType, Encoding, FieldShape, HeaderType, Location};
use crate::utils;
use crate::Error;

use std::path::PathBuf;

/// A file of grid kind `G` together with the descriptors of its arrays
#[derive(Debug)]
pub struct VtkFile<G> {
    pub(crate) grid: G,
    pub(crate) fields: FieldRegistry,
    pub(crate) config: Config,
    pub(crate) file_name: FileName,
    procs: u32,
    rank: u32,
}

impl<G: Grid> VtkFile<G> {
    /// a serial engine for `grid`, writing `directory/name.<extension>`
    pub fn with_grid<P: Into<PathBuf>, T: Into<String>>(mut grid: G, directory: P, name: T) -> Self {
        let config = Config::default();
        let mut fields = FieldRegistry::new();
        grid.init_geometry(&mut fields, &config);

        Self {
            grid,
            fields,
            config,
            file_name: FileName::new(directory, name),
            procs: 1,
            rank: 0,
        }
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    pub fn file_name_mut(&mut self) -> &mut FileName {
        &mut self.file_name
    }

    /// path the next call to `write` will write to
    pub fn path(&self) -> PathBuf {
        self.file_name.path(G::EXTENSION)
    }

    /// path of the collection file written by rank 0 of a parallel run
    pub fn collection_path(&self) -> PathBuf {
        self.file_name.collection_path(G::EXTENSION)
    }

    pub fn procs(&self) -> u32 {
        self.procs
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Declare a data array whose values are moved by the [`FieldSource`].
    ///
    /// The array gets the current data encoding and the current number of
    /// points or cells of the grid. Declaring a name twice returns the key of
    /// the first declaration.
    pub fn add_data(&mut self, name: &str, shape: FieldShape, location: Location) -> FieldId {
        let mut field = FieldDescriptor::new(name);
        field.set_shape(shape);
        self.insert_data(field, location)
    }

    /// like [`add_data`](Self::add_data), also declaring the numeric type
    pub fn add_data_typed(
        &mut self,
        name: &str,
        shape: FieldShape,
        location: Location,
        data_type: DataType,
    ) -> FieldId {
        let mut field = FieldDescriptor::new(name);
        field.set_shape(shape);
        field.set_data_type(data_type);
        self.insert_data(field, location)
    }

    /// Declare a data array carrying its own values.
    ///
    /// Type, shape and element count are taken from the buffer. After a read
    /// the buffer holds the values of the file and can be retrieved with
    /// [`field_buffer`](Self::field_buffer).
    pub fn add_data_buffer<B: FieldBuffer + 'static>(
        &mut self,
        name: &str,
        location: Location,
        buffer: B,
    ) -> FieldId {
        let field = FieldDescriptor::with_buffer(name, Box::new(buffer));
        self.insert_data(field, location)
    }

    fn insert_data(&mut self, mut field: FieldDescriptor, location: Location) -> FieldId {
        if let Some(existing) = self.fields.find_in(Group::Data, field.name()) {
            log::debug!("data array `{}` is already declared", field.name());
            return existing;
        }

        field.set_location(location);
        field.set_encoding(self.config.data_encoding);

        if field.buffer().is_none() {
            field.set_elements(self.grid.element_count(location));
        }

        self.fields.insert(Group::Data, field)
    }

    /// remove a data array, warning if no array has that name
    pub fn remove_data(&mut self, name: &str) -> Option<FieldDescriptor> {
        let removed = self.fields.remove_data(name);

        if removed.is_none() {
            log::warn!("cannot remove data array `{name}`: {}", Error::FieldNotFound(name.into()));
        }

        removed
    }

    /// the descriptor called `name`, data arrays first
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.by_name(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        self.fields.by_name_mut(name)
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.find(name)
    }

    /// the buffer attached to `name`, if it is a `B`
    pub fn field_buffer<B: FieldBuffer + 'static>(&self, name: &str) -> Option<&B> {
        self.fields
            .by_name(name)?
            .buffer()?
            .as_any()
            .downcast_ref::<B>()
    }

    pub fn field_buffer_mut<B: FieldBuffer + 'static>(&mut self, name: &str) -> Option<&mut B> {
        self.fields
            .by_name_mut(name)?
            .buffer_mut()?
            .as_any_mut()
            .downcast_mut::<B>()
    }

    /// set the encoding of every stored array
    pub fn set_codex(&mut self, encoding: Encoding) {
        self.set_geom_codex(encoding);
        self.set_data_codex(encoding);
    }

    /// set the encoding of the geometry arrays
    pub fn set_geom_codex(&mut self, encoding: Encoding) {
        self.config.geometry_encoding = encoding;
        self.reencode(Group::Geometry, encoding);
    }

    /// set the encoding of the declared data arrays and of those declared later
    pub fn set_data_codex(&mut self, encoding: Encoding) {
        self.config.data_encoding = encoding;
        self.reencode(Group::Data, encoding);
    }

    fn reencode(&mut self, group: Group, encoding: Encoding) {
        let ids = self.fields.group(group).to_vec();

        for id in ids {
            if let Some(field) = self.fields.get_mut(id) {
                field.set_encoding(encoding);
            }
        }
    }

    /// Set the width of the length prefixes from its name in the file,
    /// `UInt32` or `UInt64`. Any other value is ignored with a warning.
    pub fn set_header_type(&mut self, header_type: &str) {
        match header_type.parse::<HeaderType>() {
            Ok(header_type) => self.config.header_type = header_type,
            Err(e) => log::warn!(
                "{e}, keeping header type {}",
                self.config.header_type
            ),
        }
    }

    /// Split the output over `procs` blocks, this engine writing block `rank`.
    ///
    /// Invalid combinations are ignored with a warning.
    pub fn set_parallel(&mut self, procs: u32, rank: u32) {
        if procs < 1 || rank >= procs {
            log::warn!("invalid parallel setup: rank {rank} of {procs} processes, ignoring it");
            return;
        }

        self.procs = procs;
        self.rank = rank;

        let block = if procs > 1 { Some(rank) } else { None };
        self.file_name.set_block(block);
    }

    /// number the written files, starting at `first`
    pub fn set_counter(&mut self, first: u32) {
        self.file_name.set_counter(first);
    }

    /// Build the complete contents of a file in memory.
    pub fn encode(&mut self, source: &dyn FieldSource) -> Vec<u8> {
        let config = self.config;

        self.get_missing_meta_data(source);
        let appended_size = self.calc_appended_offsets(&config);
        log::trace!("appended section holds {appended_size} bytes");

        let mut out = Vec::new();
        self.grid.write_meta_data(&self.fields, &config, &mut out);
        self.write_data(source, &config, &mut out);

        out
    }

    /// Write the file of this engine, the collection file when this is rank 0
    /// of a parallel run, and advance the file counter.
    pub fn write(&mut self, source: &dyn FieldSource) -> Result<(), Error> {
        let path = self.path();
        let contents = self.encode(source);

        if let Some(directory) = path.parent() {
            if !directory.as_os_str().is_empty() {
                std::fs::create_dir_all(directory)?;
            }
        }

        std::fs::write(&path, contents)?;
        log::debug!("wrote {}", path.display());

        if self.procs > 1 && self.rank == 0 {
            self.write_collection()?;
        }

        self.file_name.advance();

        Ok(())
    }

    fn write_collection(&self) -> Result<(), Error> {
        let path = self.collection_path();

        let mut out = Vec::new();
        self.grid
            .write_collection(&self.fields, &self.file_name, self.procs, &mut out);

        std::fs::write(&path, out)?;
        log::debug!("wrote collection file {}", path.display());

        Ok(())
    }

    /// Read the contents of a file from memory.
    pub fn decode(&mut self, input: &[u8], source: &mut dyn FieldSource) {
        let mut config = self.config;
        let found = self.grid.read_meta_data(&mut self.fields, &mut config, input);
        self.config = config;

        self.read_data(input, source, &config, &found);
    }

    /// Read the file at [`path`](Self::path).
    pub fn read(&mut self, source: &mut dyn FieldSource) -> Result<(), Error> {
        let path = self.path();
        let input = std::fs::read(&path)?;
        log::debug!("read {} bytes from {}", input.len(), path.display());

        self.decode(&input, source);

        Ok(())
    }

    /// Import the sizes and types reported by buffers and by the source, then
    /// let the grid resolve its dimensions.
    fn get_missing_meta_data(&mut self, source: &dyn FieldSource) {
        let ids: Vec<FieldId> = self.fields.iter().map(|(id, _)| id).collect();

        for id in ids {
            let field = match self.fields.get_mut(id) {
                Some(field) if !field.is_derived() => field,
                _ => continue,
            };

            let meta_data = match field.buffer() {
                Some(buffer) => Some(buffer.meta_data()),
                None => source.field_metadata(field.name()),
            };

            if let Some(meta_data) = meta_data {
                field.import_meta_data(&meta_data);
            }
        }

        self.grid.set_missing_global_data(&mut self.fields, source);
    }

    /// Assign the offset of every appended array, in file order. Returns the
    /// total size of the appended section.
    pub(crate) fn calc_appended_offsets(&mut self, config: &Config) -> u64 {
        let mut offset = 0;

        for id in self.fields.file_order() {
            if let Some(field) = self.fields.get_mut(id) {
                if field.is_appended() {
                    field.set_offset(offset);
                    offset += config.header_size() + field.byte_size();
                }
            }
        }

        offset
    }

    fn write_data(&self, source: &dyn FieldSource, config: &Config, out: &mut Vec<u8>) {
        let order = self.fields.file_order();

        self.write_inline(&order, source, out);
        self.write_appended(&order, source, config, out);
    }

    /// Insert the values of every ascii array after its header line.
    fn write_inline(&self, order: &[FieldId], source: &dyn FieldSource, out: &mut Vec<u8>) {
        // start of the text not yet searched, headers appear in file order
        let mut cursor = 0;

        for id in order {
            let field = match self.fields.get(*id) {
                Some(field) => field,
                None => continue,
            };

            match field.effective_encoding() {
                Encoding::Ascii => (),
                Encoding::Appended => continue,
                Encoding::Undefined => {
                    log::warn!("data array `{}` has no encoding, its values are not written", field.name());
                    continue;
                }
            }

            let insert_at = {
                let mut lines = LineScanner::new(out.as_slice());
                lines.seek(cursor);

                match parse::find_header(&mut lines, field.name()) {
                    Some(_) => lines.position(),
                    None => {
                        log::warn!("{}", ParseError::DataArrayNotFound(field.name().into()));
                        continue;
                    }
                }
            };

            let tail = out.split_off(insert_at);

            {
                let mut sink = PayloadWriter::new(field.name(), Encoding::Ascii, field.data_type(), out);
                self.flush_field(field, source, &mut sink);
            }

            out.push(b'\n');
            cursor = out.len();
            out.extend_from_slice(&tail);
        }
    }

    /// Insert the length prefixed block of every appended array after the `_`
    /// marker.
    fn write_appended(
        &self,
        order: &[FieldId],
        source: &dyn FieldSource,
        config: &Config,
        out: &mut Vec<u8>,
    ) {
        let marker = match parse::find_appended_marker(out.as_slice()) {
            Some(marker) => marker,
            None => {
                log::warn!("{}", ParseError::AppendedMarker);
                return;
            }
        };

        let tail = out.split_off(marker);

        for id in order {
            let field = match self.fields.get(*id) {
                Some(field) if field.is_appended() => field,
                _ => continue,
            };

            let expected = field.byte_size();
            utils::write_length_prefix(out, config.header_type, expected);
            let start = out.len();

            {
                let mut sink = PayloadWriter::new(field.name(), Encoding::Appended, field.data_type(), out);
                self.flush_field(field, source, &mut sink);
            }

            let written = (out.len() - start) as u64;

            // later offsets were computed from the declared size
            if written != expected {
                log::warn!(
                    "data array `{}` produced {written} bytes instead of {expected}, resizing its block",
                    field.name()
                );
                out.resize(start + expected as usize, 0);
            }
        }

        out.extend_from_slice(&tail);
    }

    fn flush_field(&self, field: &FieldDescriptor, source: &dyn FieldSource, sink: &mut PayloadWriter) {
        if let Err(e) = self.grid.write_field_data(field, source, sink) {
            log::warn!("could not write data array `{}`: {e}", field.name());
        }

        let written = sink.values_written() as u64;
        if written != field.value_count() && sink.encoding() == Encoding::Ascii {
            log::warn!(
                "data array `{}` wrote {written} values, {} were declared",
                field.name(),
                field.value_count()
            );
        }
    }

    /// Read every stored array, appended arrays first. Data arrays not in
    /// `found` are absent from the file and are skipped.
    fn read_data(&mut self, input: &[u8], source: &mut dyn FieldSource, config: &Config, found: &[String]) {
        let order: Vec<FieldId> = self
            .fields
            .file_order()
            .into_iter()
            .filter(|id| {
                let in_data = self.fields.group(Group::Data).contains(id);
                let present = self
                    .fields
                    .get(*id)
                    .map(|field| found.iter().any(|name| name == field.name()))
                    .unwrap_or(false);

                !in_data || present
            })
            .collect();
        let marker = parse::find_appended_marker(input);

        for id in &order {
            let field = match self.fields.get_mut(*id) {
                Some(field) if field.is_appended() => field,
                _ => continue,
            };

            let marker = match marker {
                Some(marker) => marker,
                None => {
                    log::warn!("cannot read `{}`: {}", field.name(), ParseError::AppendedMarker);
                    continue;
                }
            };

            let start = marker + field.offset() as usize;
            let block = input.get(start..).unwrap_or_default();

            match utils::read_length_prefix(block, config.header_type) {
                Some(length) if length != field.byte_size() => log::warn!(
                    "block of `{}` declares {length} bytes, {} are expected",
                    field.name(),
                    field.byte_size()
                ),
                Some(_) => (),
                None => {
                    log::warn!("{}", ParseError::Truncated(field.name().into()));
                    continue;
                }
            }

            let payload = &block[config.header_size() as usize..];
            let mut reader = PayloadReader::new(field, Encoding::Appended, payload);

            if let Err(e) = self.grid.read_field_data(field, source, &mut reader) {
                log::warn!("could not read data array `{}`: {e}", field.name());
            }
        }

        for id in &order {
            let field = match self.fields.get_mut(*id) {
                Some(field) if !field.is_derived() && field.encoding() == Encoding::Ascii => field,
                _ => continue,
            };

            let position = match field.position() {
                Some(position) => position,
                None => {
                    log::warn!("{}", ParseError::DataArrayNotFound(field.name().into()));
                    continue;
                }
            };

            let payload = input.get(position..).unwrap_or_default();
            let mut reader = PayloadReader::new(field, Encoding::Ascii, payload);

            if let Err(e) = self.grid.read_field_data(field, source, &mut reader) {
                log::warn!("could not read data array `{}`: {e}", field.name());
            }

            // positions shift with the next edit of the text
            field.set_position(None);
        }
    }
}
