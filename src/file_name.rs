//! Naming of the files produced by an engine.
//!
//! A file name is made of a directory, a base name, an optional block suffix
//! (`.bNNNN`, one per rank in parallel runs), an optional counter suffix
//! (`.NNNN`, one per step of a time series) and an extension:
//!
//! ```text
//! output/flow.b0002.0015.vtu
//! ```
//!
//! The collection file of a parallel run drops the block suffix and uses the
//! `P` prefixed extension (`output/flow.0015.pvtu`).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    directory: PathBuf,
    name: String,
    block: Option<u32>,
    counter: Option<u32>,
}

impl FileName {
    pub fn new<P: Into<PathBuf>, T: Into<String>>(directory: P, name: T) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            block: None,
            counter: None,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block(&self) -> Option<u32> {
        self.block
    }

    pub fn set_block(&mut self, block: Option<u32>) {
        self.block = block;
    }

    pub fn counter(&self) -> Option<u32> {
        self.counter
    }

    /// start a time series at `first`; every subsequent write advances it
    pub fn set_counter(&mut self, first: u32) {
        self.counter = Some(first);
    }

    /// stop numbering the written files
    pub fn clear_counter(&mut self) {
        self.counter = None;
    }

    /// move to the next step of the series, if a series is active
    pub fn advance(&mut self) {
        if let Some(counter) = self.counter.as_mut() {
            *counter += 1;
        }
    }

    /// the file name without its directory
    pub fn file_name(&self, extension: &str) -> String {
        let mut file_name = self.name.clone();

        if let Some(block) = self.block {
            file_name.push_str(&format!(".b{block:04}"));
        }

        if let Some(counter) = self.counter {
            file_name.push_str(&format!(".{counter:04}"));
        }

        file_name.push('.');
        file_name.push_str(extension);
        file_name
    }

    pub fn path(&self, extension: &str) -> PathBuf {
        self.directory.join(self.file_name(extension))
    }

    /// the same name written by another block of a parallel run
    pub fn with_block(&self, block: u32) -> Self {
        Self {
            block: Some(block),
            ..self.clone()
        }
    }

    /// path of the collection file referencing every block
    pub fn collection_path(&self, extension: &str) -> PathBuf {
        let collection = Self {
            block: None,
            ..self.clone()
        };

        collection.path(&format!("p{extension}"))
    }
}
