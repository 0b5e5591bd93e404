use super::table_writer::TableWriter;
use crate::components::Table;
use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Serialize `table` into `output` and return the number of bytes written.
///
/// Every size and offset is computed before the first byte reaches `output`,
/// so invalid input (an over-long package name, an unknown key, ...) fails
/// without writing anything. A failing sink, on the other hand, can leave
/// part of the table behind; those bytes are not a usable table.
pub fn write_to<W: Write>(table: &Table, output: &mut W) -> Result<usize> {
    debug!(packages = table.packages.len(), "Preparing resource table");
    let mut root = TableWriter::new(table);
    root.prepare()?;
    debug!(
        size = root.size()?,
        global_strings = root.global_string_count(),
        "Writing resource table"
    );
    root.write(output)
}

/// Serialize `table` into memory
pub fn to_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    write_to(table, &mut output)?;
    Ok(output)
}

/// Serialize `table` into the file at `path`.
///
/// The table is serialized in memory first, so nothing is created at `path`
/// when serialization fails.
pub fn write<P: AsRef<Path>>(table: &Table, path: P) -> Result<usize> {
    let bytes = to_bytes(table)?;
    std::fs::write(path, &bytes)?;
    Ok(bytes.len())
}
