use thiserror::Error;

/// Errors produced while preparing or writing a resource table.
///
/// Writing is all-or-nothing: once any of these is returned, the bytes already
/// handed to the sink are not a valid (partial) table and should be discarded.
#[derive(Error, Debug)]
pub enum Error {
    /// The sink rejected a write.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A package name does not fit the 128 UTF-16 code units of the package header.
    #[error("package name {name:?} is {length} UTF-16 code units long, at most 128 fit")]
    PackageNameTooLong {
        /// The offending name
        name: String,
        /// Its length in UTF-16 code units
        length: usize,
    },

    /// A computed byte size is not a multiple of 4.
    #[error("{fragment} has size {size}, which is not 4-byte aligned")]
    Misaligned {
        /// The fragment whose size was computed
        fragment: &'static str,
        /// The computed size
        size: usize,
    },

    /// The bytes emitted for a fragment differ from the size it declared.
    #[error("{fragment} declared {declared} bytes but wrote {written}")]
    SizeMismatch {
        /// The fragment being written
        fragment: &'static str,
        /// The size announced before writing
        declared: usize,
        /// The number of bytes actually emitted
        written: usize,
    },

    /// A size or write was requested before the fragment was prepared.
    #[error("{0} was used before being prepared")]
    NotPrepared(&'static str),

    /// An entry key is missing from the key partition of its visibility.
    #[error("key {key:?} is not in the package key pool (public: {public})")]
    UnresolvedKey {
        /// The key text
        key: String,
        /// Visibility of the entry that referenced it
        public: bool,
    },

    /// A string is too long for the length prefix of its pool encoding.
    #[error("string length {length} exceeds the encodable limit {limit}")]
    StringTooLong {
        /// Length that had to be encoded
        length: usize,
        /// Largest length the encoding can express
        limit: usize,
    },

    /// A number does not fit the field it is written into.
    #[error("{value} does not fit into {target}")]
    Overflow {
        /// Name of the target field type
        target: &'static str,
        /// The rejected value
        value: String,
    },

    /// Type spec ids start at 1, since `id - 1` indexes the type name pool.
    #[error("type spec {0:?} has id 0")]
    InvalidTypeSpecId(String),

    /// Two entries of one type share an id.
    #[error("type {type_id:#04x} contains entry id {entry_id:#06x} more than once")]
    DuplicateEntry {
        /// Id of the type holding the entries
        type_id: u8,
        /// The repeated entry id
        entry_id: u16,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
