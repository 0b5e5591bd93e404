use super::components_sizing::aligned;
use super::components_writing::ArscSerializable;
use crate::components::{Header, ResourceType};
use crate::error::{Error, Result};
use std::io::Write;

/// A trait for objects that are chunks (with header).
/// It handles the header generation and checks that every chunk
/// writes exactly as many bytes as it announces
pub(in crate::writer) trait WithHeader {
    /// The `resource_type` attribute in generated header object
    const RESOURCE_TYPE: ResourceType;
    /// The `header_size` attribute in generated header object
    const HEADER_SIZE: u16;
    /// Name used in error messages
    const NAME: &'static str;

    /// Bytes following the header
    fn body_size(&self) -> Result<usize>;

    /// Header fields following the common 8-byte chunk header
    fn write_header_extension<W: Write>(&self, output: &mut W) -> Result<usize>;

    fn write_body<W: Write>(&self, output: &mut W) -> Result<usize>;

    /// Compute the total chunk size, rejecting unaligned results
    fn measure(&self) -> Result<usize> {
        aligned(Self::NAME, Self::HEADER_SIZE as usize + self.body_size()?)
    }

    /// Generate a header
    fn header(&self, size: usize) -> Header {
        Header {
            resource_type: Self::RESOURCE_TYPE,
            header_size: Self::HEADER_SIZE,
            size: size as u64,
        }
    }

    /// Write header then body, `size` being the total announced in the header
    fn write_chunk<W: Write>(&self, size: usize, output: &mut W) -> Result<usize> {
        let mut written = self.header(size).write(output)?;
        written += self.write_header_extension(output)?;
        check_written(Self::NAME, Self::HEADER_SIZE as usize, written)?;
        written += self.write_body(output)?;
        check_written(Self::NAME, size, written)?;
        Ok(written)
    }
}

pub(in crate::writer) fn check_written(
    fragment: &'static str,
    declared: usize,
    written: usize,
) -> Result<()> {
    if declared != written {
        return Err(Error::SizeMismatch {
            fragment,
            declared,
            written,
        });
    }
    Ok(())
}
