mod components_sizing;
mod components_writing;
mod entry_writer;
mod fragment;
mod string_pool;
mod table_writer;
mod type_writer;
mod with_header;
mod write_util;
mod writing;

pub use string_pool::{StringEncoding, StringPool, StringPoolBuilder};
pub use writing::{to_bytes, write, write_to};
