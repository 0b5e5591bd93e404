use crate::error::{Error, Result};
use paste::paste;
use std::fmt::Debug;
use std::io::Write;

macro_rules! write_num {
    ($num_type: ty) => {
        paste! {
        pub fn [<write_ $num_type>]<W: Write, I: TryInto<$num_type> + Copy + Debug>(writer: &mut W, data: I) -> Result<usize> {
            let bytes = <I as TryInto<$num_type>>::try_into(data)
                .map_err(|_| Error::Overflow {
                    target: stringify!($num_type),
                    value: format!("{data:?}"),
                })?
                .to_le_bytes();
            writer.write_all(&bytes)?;
            Ok(bytes.len())
        }
        }
    };
}

write_num!(u8);
write_num!(u16);
write_num!(u32);

pub fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<usize> {
    writer.write_all(bytes)?;
    Ok(bytes.len())
}

pub fn write_zeros<W: Write>(writer: &mut W, count: usize) -> Result<usize> {
    write_bytes(writer, &vec![0; count])
}

pub fn write_string_utf16<W: Write>(writer: &mut W, string: &str) -> Result<usize> {
    let mut written = 0;
    for char in string.encode_utf16() {
        written += write_u16(writer, char)?;
    }
    Ok(written)
}
