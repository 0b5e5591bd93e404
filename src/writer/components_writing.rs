use super::components_sizing::ConstByteSizing;
use super::write_util;
use crate::components::{Config, Header};
use crate::error::Result;
use std::io::Write;

/// Model parts whose bytes do not depend on anything computed during prepare
pub(in crate::writer) trait ArscSerializable {
    fn write<W: Write>(&self, output: &mut W) -> Result<usize>;
}

impl ArscSerializable for Header {
    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = write_util::write_u16(output, self.resource_type as u16)?;
        written += write_util::write_u16(output, self.header_size)?;
        written += write_util::write_u32(output, self.size)?;
        Ok(written)
    }
}

impl ArscSerializable for Config {
    fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = write_util::write_u32(output, Config::SIZE)?;
        written += write_util::write_u32(output, self.imsi)?;
        written += write_util::write_bytes(output, &self.language)?;
        written += write_util::write_bytes(output, &self.region)?;
        written += write_util::write_u32(output, self.screen_type)?;
        written += write_util::write_u32(output, self.input)?;
        written += write_util::write_u32(output, self.screen_size)?;
        written += write_util::write_u16(output, self.sdk_version)?;
        written += write_util::write_u16(output, self.minor_version)?;
        written += write_util::write_u32(output, self.screen_config)?;
        written += write_util::write_u32(output, self.screen_size_dp)?;
        Ok(written)
    }
}
