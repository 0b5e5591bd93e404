use super::components_sizing::{padding, ConstByteSizing};
use super::fragment::Fragment;
use super::with_header::WithHeader;
use super::write_util;
use crate::components::{Header, ResourceType};
use crate::error::{Error, Result};
use std::io::Write;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum StringEncoding {
    Utf8,
    Utf16,
}

/// Accumulates strings into an encoded blob.
///
/// Strings are not deduplicated: every [`append_string`](Self::append_string)
/// returns the next index, even for text that is already in the pool.
#[derive(Debug)]
pub struct StringPoolBuilder {
    encoding: StringEncoding,
    offsets: Vec<u32>,
    data: Vec<u8>,
}

impl StringPoolBuilder {
    const UTF8_LENGTH_LIMIT: usize = 0x7FFF;
    const UTF16_LENGTH_LIMIT: usize = 0x7FFF_FFFF;

    pub fn new(encoding: StringEncoding) -> Self {
        StringPoolBuilder {
            encoding,
            offsets: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn utf8() -> Self {
        Self::new(StringEncoding::Utf8)
    }

    pub fn utf16() -> Self {
        Self::new(StringEncoding::Utf16)
    }

    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Encode `string` at the end of the pool and return its index
    pub fn append_string(&mut self, string: &str) -> Result<u32> {
        let index = u32::try_from(self.offsets.len()).map_err(|_| Error::Overflow {
            target: "u32",
            value: self.offsets.len().to_string(),
        })?;
        let offset = u32::try_from(self.data.len()).map_err(|_| Error::Overflow {
            target: "u32",
            value: self.data.len().to_string(),
        })?;
        let utf16_length = string.encode_utf16().count();
        match self.encoding {
            StringEncoding::Utf8 => {
                let utf8_length = Self::utf8_length_prefix(utf16_length)?;
                let byte_length = Self::utf8_length_prefix(string.len())?;
                self.data.extend_from_slice(&utf8_length);
                self.data.extend_from_slice(&byte_length);
                self.data.extend_from_slice(string.as_bytes());
                self.data.push(0);
            }
            StringEncoding::Utf16 => {
                let length = Self::utf16_length_prefix(utf16_length)?;
                self.data.extend_from_slice(&length);
                for unit in string.encode_utf16() {
                    self.data.extend_from_slice(&unit.to_le_bytes());
                }
                self.data.extend_from_slice(&[0, 0]);
            }
        }
        self.offsets.push(offset);
        Ok(index)
    }

    /// One byte below 0x80, otherwise two bytes, high byte first, with the top bit set
    fn utf8_length_prefix(length: usize) -> Result<Vec<u8>> {
        if length > Self::UTF8_LENGTH_LIMIT {
            return Err(Error::StringTooLong {
                length,
                limit: Self::UTF8_LENGTH_LIMIT,
            });
        }
        Ok(if length >= 0x80 {
            vec![((length >> 8) & 0x7F) as u8 | 0x80, (length & 0xFF) as u8]
        } else {
            vec![length as u8]
        })
    }

    /// One code unit below 0x8000, otherwise two, high unit first, with the top bit set
    fn utf16_length_prefix(length: usize) -> Result<Vec<u8>> {
        if length > Self::UTF16_LENGTH_LIMIT {
            return Err(Error::StringTooLong {
                length,
                limit: Self::UTF16_LENGTH_LIMIT,
            });
        }
        let mut prefix = Vec::with_capacity(4);
        if length >= 0x8000 {
            let high = ((length >> 16) & 0x7FFF) as u16 | 0x8000;
            prefix.extend_from_slice(&high.to_le_bytes());
        }
        prefix.extend_from_slice(&((length & 0xFFFF) as u16).to_le_bytes());
        Ok(prefix)
    }

    /// Freeze the pool. No string can be added afterwards.
    pub fn build(self) -> StringPool {
        let flags = match self.encoding {
            StringEncoding::Utf8 => StringPool::UTF8_FLAG,
            StringEncoding::Utf16 => 0,
        };
        StringPool {
            offsets: self.offsets,
            data: self.data,
            flags,
        }
    }
}

/// An encoded, immutable string pool chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPool {
    offsets: Vec<u32>,
    data: Vec<u8>,
    flags: u32,
}

impl StringPool {
    pub const FLAG_SORTED: u32 = 0x00000001;
    pub const UTF8_FLAG: u32 = 0x00000100;

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Byte offset of every string inside [`data`](Self::data)
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// The encoded strings, without alignment padding
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn use_utf8(&self) -> bool {
        self.flags & StringPool::UTF8_FLAG != 0
    }

    /// Total chunk size in bytes
    pub fn chunk_size(&self) -> Result<usize> {
        self.measure()
    }

    /// Write the pool as a standalone chunk
    pub fn write_to<W: Write>(&self, output: &mut W) -> Result<usize> {
        Fragment::write(self, output)
    }
}

impl WithHeader for StringPool {
    const RESOURCE_TYPE: ResourceType = ResourceType::StringPool;
    // header + string_count + style_count + flags + string_offset + style_offset
    const HEADER_SIZE: u16 = Header::SIZE as u16 + 5 * 4;
    const NAME: &'static str = "string pool";

    fn body_size(&self) -> Result<usize> {
        Ok(self.offsets.len() * 4 + self.data.len() + padding(self.data.len()))
    }

    fn write_header_extension<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = write_util::write_u32(output, self.offsets.len())?;
        written += write_util::write_u32(output, 0)?; // style_count
        written += write_util::write_u32(output, self.flags)?;
        written += write_util::write_u32(
            output,
            Self::HEADER_SIZE as usize + self.offsets.len() * 4,
        )?; // string_offset
        written += write_util::write_u32(output, 0)?; // style_offset
        Ok(written)
    }

    fn write_body<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = 0;
        for offset in &self.offsets {
            written += write_util::write_u32(output, *offset)?;
        }
        written += write_util::write_bytes(output, &self.data)?;
        written += write_util::write_zeros(output, padding(self.data.len()))?;
        Ok(written)
    }
}

impl Fragment for StringPool {
    fn size(&self) -> Result<usize> {
        self.measure()
    }

    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        self.write_chunk(self.size()?, output)
    }
}
