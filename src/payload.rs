//! Byte channels handed to buffers and collaborators.
//!
//! A [`PayloadWriter`] is created for every field that is written and a
//! [`PayloadReader`] for every field that is read. Both know the declared
//! encoding and numeric type of the field, so the code producing or consuming
//! values never has to care whether they end up as text or as raw bytes.

use crate::prelude::*;
use crate::utils::with_numeric;

use num_traits::{NumCast, ToPrimitive};

/// Output sink for the values of a single field
pub struct PayloadWriter<'a> {
    name: &'a str,
    encoding: Encoding,
    data_type: DataType,
    out: &'a mut Vec<u8>,
    values: usize,
}

impl<'a> PayloadWriter<'a> {
    pub(crate) fn new(
        name: &'a str,
        encoding: Encoding,
        data_type: DataType,
        out: &'a mut Vec<u8>,
    ) -> Self {
        Self {
            name,
            encoding,
            data_type,
            out,
            values: 0,
        }
    }

    /// name of the field being written
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// the numeric type every value must have
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// number of individual values written so far
    pub fn values_written(&self) -> usize {
        self.values
    }

    /// write a slice of values whose type matches the declared data type
    pub fn write<NUM: Numeric>(&mut self, values: &[NUM]) -> Result<(), Error> {
        self.check_type(NUM::DATA_TYPE)?;

        for value in values {
            self.push(*value);
        }

        Ok(())
    }

    /// write values of any primitive type, converting each one to the declared
    /// data type
    pub fn write_converted<T, I>(&mut self, values: I) -> Result<(), Error>
    where
        T: ToPrimitive,
        I: IntoIterator<Item = T>,
    {
        with_numeric!(self.data_type, N => self.write_cast::<N, T, I>(values), undefined => {
            Err(self.mismatch(DataType::Undefined))
        })
    }

    fn write_cast<N, T, I>(&mut self, values: I) -> Result<(), Error>
    where
        N: Numeric,
        T: ToPrimitive,
        I: IntoIterator<Item = T>,
    {
        for value in values {
            let converted = <N as NumCast>::from(value).ok_or_else(|| Error::ValueOutOfRange {
                name: self.name.to_string(),
                data_type: self.data_type,
            })?;
            self.push(converted);
        }

        Ok(())
    }

    fn push<NUM: Numeric>(&mut self, value: NUM) {
        match self.encoding {
            Encoding::Ascii => {
                if self.values > 0 {
                    self.out.push(b' ');
                }
                value.write_ascii(self.out);
            }
            Encoding::Appended | Encoding::Undefined => value.extend_le_bytes(self.out),
        }

        self.values += 1;
    }

    fn check_type(&self, actual: DataType) -> Result<(), Error> {
        if actual == self.data_type {
            Ok(())
        } else {
            Err(self.mismatch(actual))
        }
    }

    fn mismatch(&self, actual: DataType) -> Error {
        Error::TypeMismatch {
            name: self.name.to_string(),
            declared: self.data_type,
            actual,
        }
    }
}

/// Input source for the values of a single field
pub struct PayloadReader<'a> {
    name: String,
    encoding: Encoding,
    data_type: DataType,
    components: u8,
    expected: usize,
    input: &'a [u8],
    position: usize,
}

impl<'a> PayloadReader<'a> {
    /// `input` must start at the first value of the field
    pub(crate) fn new(field: &FieldDescriptor, encoding: Encoding, input: &'a [u8]) -> Self {
        Self {
            name: field.name().to_string(),
            encoding,
            data_type: field.data_type(),
            components: field.components(),
            expected: field.value_count() as usize,
            input,
            position: 0,
        }
    }

    /// name of the field being read
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// numeric type of the values in the file
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// components per element declared for the field
    pub fn components(&self) -> u8 {
        self.components
    }

    /// number of individual values the descriptor says the field holds
    pub fn value_count(&self) -> usize {
        self.expected
    }

    /// read `count` values whose type matches the declared data type
    pub fn read<NUM: Numeric>(&mut self, count: usize) -> Result<Vec<NUM>, Error> {
        if NUM::DATA_TYPE != self.data_type {
            return Err(Error::TypeMismatch {
                name: self.name.to_string(),
                declared: self.data_type,
                actual: NUM::DATA_TYPE,
            });
        }

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.next_value::<NUM>()?);
        }

        Ok(out)
    }

    /// read every value of the field
    pub fn read_all<NUM: Numeric>(&mut self) -> Result<Vec<NUM>, Error> {
        self.read(self.expected)
    }

    /// read `count` values stored as the declared data type and convert them to `T`
    pub fn read_converted<T: NumCast>(&mut self, count: usize) -> Result<Vec<T>, Error> {
        with_numeric!(self.data_type, N => self.read_cast::<N, T>(count), undefined => {
            Err(Error::TypeMismatch {
                name: self.name.to_string(),
                declared: DataType::Undefined,
                actual: DataType::Undefined,
            })
        })
    }

    fn read_cast<N: Numeric, T: NumCast>(&mut self, count: usize) -> Result<Vec<T>, Error> {
        let mut out = Vec::with_capacity(count);

        for _ in 0..count {
            let value = self.next_value::<N>()?;
            let converted = T::from(value).ok_or_else(|| Error::ValueOutOfRange {
                name: self.name.to_string(),
                data_type: self.data_type,
            })?;
            out.push(converted);
        }

        Ok(out)
    }

    fn next_value<NUM: Numeric>(&mut self) -> Result<NUM, Error> {
        match self.encoding {
            Encoding::Ascii => {
                let token = self
                    .next_token()
                    .ok_or_else(|| ParseError::Truncated(self.name.clone()))?;

                std::str::from_utf8(token)
                    .ok()
                    .and_then(|text| text.parse::<NUM>().ok())
                    .ok_or_else(|| {
                        ParseError::AsciiValue {
                            name: self.name.clone(),
                            token: String::from_utf8_lossy(token).into_owned(),
                        }
                        .into()
                    })
            }
            Encoding::Appended | Encoding::Undefined => {
                let end = self.position + NUM::SIZE;
                let bytes = self
                    .input
                    .get(self.position..end)
                    .ok_or_else(|| ParseError::Truncated(self.name.clone()))?;
                self.position = end;

                Ok(NUM::from_le_slice(bytes))
            }
        }
    }

    /// next whitespace separated token, stopping at the start of an xml tag
    fn next_token(&mut self) -> Option<&'a [u8]> {
        let input = self.input;

        while self.position < input.len() && input[self.position].is_ascii_whitespace() {
            self.position += 1;
        }

        let start = self.position;

        while self.position < input.len()
            && !input[self.position].is_ascii_whitespace()
            && input[self.position] != b'<'
        {
            self.position += 1;
        }

        if self.position == start {
            None
        } else {
            Some(&input[start..self.position])
        }
    }
}
