use super::components_sizing::ConstByteSizing;
use super::components_writing::ArscSerializable;
use super::entry_writer::EntryWriter;
use super::fragment::{prepared_size, Fragment, PrepareContext};
use super::with_header::WithHeader;
use super::write_util;
use crate::components::{Config, Header, PackageChunk, ResourceType, Type, TypeSpec};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::io::Write;
use tracing::trace;

pub(in crate::writer) struct TypeSpecWriter<'a> {
    spec: &'a TypeSpec,
    size: Option<usize>,
}

impl<'a> TypeSpecWriter<'a> {
    pub fn new(spec: &'a TypeSpec) -> Self {
        TypeSpecWriter { spec, size: None }
    }
}

impl WithHeader for TypeSpecWriter<'_> {
    const RESOURCE_TYPE: ResourceType = ResourceType::TableTypeSpec;
    const HEADER_SIZE: u16 = Header::SIZE as u16 + 1 + 1 + 2 + 4; // + id + res0 + res1 + entry_count
    const NAME: &'static str = "type spec";

    fn body_size(&self) -> Result<usize> {
        Ok(self.spec.flags.len() * 4)
    }

    fn write_header_extension<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = write_util::write_u8(output, self.spec.id)?;
        written += write_util::write_u8(output, 0)?; // res0
        written += write_util::write_u16(output, 0)?; // res1
        written += write_util::write_u32(output, self.spec.flags.len())?;
        Ok(written)
    }

    fn write_body<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = 0;
        for flags in &self.spec.flags {
            written += write_util::write_u32(output, *flags)?;
        }
        Ok(written)
    }
}

impl Fragment for TypeSpecWriter<'_> {
    fn prepare(&mut self, _context: &mut PrepareContext<'_>) -> Result<()> {
        self.size = Some(self.measure()?);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        prepared_size(Self::NAME, self.size)
    }

    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        self.write_chunk(self.size()?, output)
    }
}

/// Writes one configuration of a type.
///
/// The offset table is laid out by ascending entry id while the entries follow
/// in insertion order. The two only agree when entries were added in id order;
/// keeping them in that order is up to the caller.
pub(in crate::writer) struct TypeWriter<'a> {
    r#type: &'a Type,
    entries: Vec<EntryWriter<'a>>,
    entry_count: usize, // max entry id + 1, 0 without entries
    size: Option<usize>,
}

impl<'a> TypeWriter<'a> {
    pub fn new(r#type: &'a Type) -> Self {
        TypeWriter {
            r#type,
            entries: r#type.entries.iter().map(EntryWriter::new).collect(),
            entry_count: 0,
            size: None,
        }
    }

    fn count_entries(&self) -> Result<usize> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.id()) {
                return Err(Error::DuplicateEntry {
                    type_id: self.r#type.id,
                    entry_id: entry.id(),
                });
            }
        }
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.id() as usize + 1)
            .max()
            .unwrap_or(0))
    }

    /// One slot per id: the running offset of the entry in ascending id order, or -1
    fn entry_offsets(&self) -> Result<Vec<u32>> {
        let mut by_id = vec![None; self.entry_count];
        for entry in &self.entries {
            by_id[entry.id() as usize] = Some(entry);
        }
        let mut offsets = Vec::with_capacity(self.entry_count);
        let mut offset = 0;
        for slot in by_id {
            match slot {
                Some(entry) => {
                    offsets.push(u32::try_from(offset).map_err(|_| Error::Overflow {
                        target: "u32",
                        value: offset.to_string(),
                    })?);
                    offset += entry.size()?;
                }
                None => offsets.push(u32::MAX),
            }
        }
        Ok(offsets)
    }
}

impl WithHeader for TypeWriter<'_> {
    const RESOURCE_TYPE: ResourceType = ResourceType::TableType;
    // header + id + res0 + res1 + entry_count + entries_start + config
    const HEADER_SIZE: u16 = (Header::SIZE + 1 + 1 + 2 + 4 + 4 + Config::SIZE) as u16;
    const NAME: &'static str = "type";

    fn body_size(&self) -> Result<usize> {
        let entries = self
            .entries
            .iter()
            .map(|entry| entry.size())
            .sum::<Result<usize>>()?;
        Ok(self.entry_count * 4 + entries)
    }

    fn write_header_extension<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = write_util::write_u8(output, self.r#type.id)?;
        written += write_util::write_u8(output, 0)?; // res0
        written += write_util::write_u16(output, 0)?; // res1
        written += write_util::write_u32(output, self.entry_count)?;
        written += write_util::write_u32(
            output,
            Self::HEADER_SIZE as usize + self.entry_count * 4,
        )?; // entries_start
        written += self.r#type.config.write(output)?;
        Ok(written)
    }

    fn write_body<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = 0;
        for offset in self.entry_offsets()? {
            written += write_util::write_u32(output, offset)?;
        }
        for entry in &self.entries {
            written += entry.write(output)?;
        }
        Ok(written)
    }
}

impl Fragment for TypeWriter<'_> {
    fn prepare(&mut self, context: &mut PrepareContext<'_>) -> Result<()> {
        self.entry_count = self.count_entries()?;
        for entry in &mut self.entries {
            entry.prepare(context)?;
        }
        self.size = Some(self.measure()?);
        trace!(
            type_id = self.r#type.id,
            entries = self.entries.len(),
            entry_count = self.entry_count,
            "Prepared type"
        );
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        prepared_size(Self::NAME, self.size)
    }

    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        self.write_chunk(self.size()?, output)
    }
}

/// The chunks that may follow the pools of a package
pub(in crate::writer) enum PackageChunkWriter<'a> {
    TypeSpec(TypeSpecWriter<'a>),
    Type(TypeWriter<'a>),
}

impl<'a> PackageChunkWriter<'a> {
    pub fn new(chunk: &'a PackageChunk) -> Self {
        match chunk {
            PackageChunk::TypeSpec(spec) => PackageChunkWriter::TypeSpec(TypeSpecWriter::new(spec)),
            PackageChunk::Type(r#type) => PackageChunkWriter::Type(TypeWriter::new(r#type)),
        }
    }
}

impl Fragment for PackageChunkWriter<'_> {
    fn prepare(&mut self, context: &mut PrepareContext<'_>) -> Result<()> {
        match self {
            PackageChunkWriter::TypeSpec(writer) => writer.prepare(context),
            PackageChunkWriter::Type(writer) => writer.prepare(context),
        }
    }

    fn size(&self) -> Result<usize> {
        match self {
            PackageChunkWriter::TypeSpec(writer) => writer.size(),
            PackageChunkWriter::Type(writer) => writer.size(),
        }
    }

    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        match self {
            PackageChunkWriter::TypeSpec(writer) => writer.write(output),
            PackageChunkWriter::Type(writer) => writer.write(output),
        }
    }
}
