use super::components_sizing::{aligned, ConstByteSizing};
use super::fragment::{prepared_size, Fragment, PrepareContext};
use super::with_header::check_written;
use super::write_util;
use crate::components::{Entry, EntryKind, Value};
use crate::error::{Error, Result};
use std::io::Write;

pub(in crate::writer) struct ValueWriter<'a> {
    value: &'a Value,
    string_index: Option<u32>, // only for `Value::Text`
}

impl<'a> ValueWriter<'a> {
    pub fn new(value: &'a Value) -> Self {
        ValueWriter {
            value,
            string_index: None,
        }
    }

    fn data(&self) -> Result<u32> {
        match self.value {
            Value::Integer { data, .. } => Ok(*data),
            Value::Reference(reference) => Ok(reference.packed()),
            Value::Text(_) => self.string_index.ok_or(Error::NotPrepared("string value")),
        }
    }
}

impl Fragment for ValueWriter<'_> {
    fn prepare(&mut self, context: &mut PrepareContext<'_>) -> Result<()> {
        if let Value::Text(text) = self.value {
            self.string_index = Some(context.append_global_string(text)?);
        }
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(Value::SIZE)
    }

    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = write_util::write_u16(output, Value::SIZE)?;
        written += write_util::write_u8(output, 0)?;
        written += write_util::write_u8(output, self.value.data_type())?;
        written += write_util::write_u32(output, self.data()?)?;
        Ok(written)
    }
}

/// Writes one entry of a type: the entry header, then either one value or,
/// for map entries, the parent, the count and every `(name, value)` pair
pub(in crate::writer) struct EntryWriter<'a> {
    entry: &'a Entry,
    values: Vec<ValueWriter<'a>>,
    key_index: Option<u32>,
    size: Option<usize>,
}

impl<'a> EntryWriter<'a> {
    const NAME: &'static str = "entry";
    const SIMPLE_HEADER_SIZE: usize = 2 + 2 + 4; // size + flags + key
    const MAP_HEADER_SIZE: usize = Self::SIMPLE_HEADER_SIZE + 4 + 4; // + parent + count

    pub fn new(entry: &'a Entry) -> Self {
        let values = match &entry.kind {
            EntryKind::Simple(value) => vec![ValueWriter::new(value)],
            EntryKind::Map { values, .. } => values
                .iter()
                .map(|(_, value)| ValueWriter::new(value))
                .collect(),
        };
        EntryWriter {
            entry,
            values,
            key_index: None,
            size: None,
        }
    }

    pub fn id(&self) -> u16 {
        self.entry.id
    }

    fn header_size(&self) -> usize {
        if self.entry.is_complex() {
            Self::MAP_HEADER_SIZE
        } else {
            Self::SIMPLE_HEADER_SIZE
        }
    }

    fn measure(&self) -> Result<usize> {
        let names = match &self.entry.kind {
            EntryKind::Simple(_) => 0,
            EntryKind::Map { values, .. } => values.len() * 4,
        };
        let values = self
            .values
            .iter()
            .map(|value| value.size())
            .sum::<Result<usize>>()?;
        aligned(Self::NAME, self.header_size() + names + values)
    }
}

impl Fragment for EntryWriter<'_> {
    fn prepare(&mut self, context: &mut PrepareContext<'_>) -> Result<()> {
        self.key_index = Some(context.key_index(&self.entry.key, self.entry.public)?);
        for value in &mut self.values {
            value.prepare(context)?;
        }
        self.size = Some(self.measure()?);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        prepared_size(Self::NAME, self.size)
    }

    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        let size = self.size()?;
        let key_index = self.key_index.ok_or(Error::NotPrepared(Self::NAME))?;
        let mut written = write_util::write_u16(output, self.header_size())?;
        written += write_util::write_u16(output, self.entry.flags())?;
        written += write_util::write_u32(output, key_index)?;
        match &self.entry.kind {
            EntryKind::Simple(_) => {
                for value in &self.values {
                    written += value.write(output)?;
                }
            }
            EntryKind::Map { parent, values } => {
                written += write_util::write_u32(output, *parent)?;
                written += write_util::write_u32(output, values.len())?;
                for ((name, _), value) in values.iter().zip(&self.values) {
                    written += write_util::write_u32(output, *name)?;
                    written += value.write(output)?;
                }
            }
        }
        check_written(Self::NAME, size, written)?;
        Ok(written)
    }
}
