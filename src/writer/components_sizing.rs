use crate::components::{Config, Header, Value};
use crate::error::{Error, Result};

/// A trait for objects that have constant sizes
/// when being written out in arsc format
pub(in crate::writer) trait ConstByteSizing {
    /// The number of bytes required to write out this type
    const SIZE: usize;
}

impl ConstByteSizing for Header {
    const SIZE: usize = 2 + 2 + 4; // type + header_size + size
}

impl ConstByteSizing for Value {
    const SIZE: usize = 2 + 1 + 1 + 4; // size + zero + type + data
}

impl ConstByteSizing for Config {
    // size + imsi + language + region + screen_type + input + screen_size
    // + sdk_version + minor_version + screen_config + screen_size_dp
    const SIZE: usize = 4 + 4 + 2 + 2 + 4 + 4 + 4 + 2 + 2 + 4 + 4;
}

/// Calculate the padding size for a given size
///
/// # Argument:
/// * size - the size needs to be padded
/// # Returns:
/// the padding size with respect to 4
pub(crate) fn padding(size: usize) -> usize {
    (4 - size % 4) % 4
}

/// Accept `size` as the final size of `fragment` only if it is 4-byte aligned
pub(in crate::writer) fn aligned(fragment: &'static str, size: usize) -> Result<usize> {
    if size % 4 != 0 {
        return Err(Error::Misaligned { fragment, size });
    }
    Ok(size)
}
