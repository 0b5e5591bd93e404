use super::string_pool::StringPoolBuilder;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Write;

/// A writer over one node of the model.
///
/// `prepare` runs exactly once, before anything else, and fixes every piece of
/// derived state (string pool indices, sizes). `size` and `write` only read that
/// state; calling them on an unprepared fragment is an [`Error::NotPrepared`].
pub(in crate::writer) trait Fragment {
    fn prepare(&mut self, _context: &mut PrepareContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Total number of bytes `write` emits. Always a multiple of 4.
    fn size(&self) -> Result<usize>;

    fn write<W: Write>(&self, output: &mut W) -> Result<usize>;
}

/// What descendants of the table may touch while being prepared: the session's
/// global string pool, append only, and the key indices of the enclosing package.
pub(in crate::writer) struct PrepareContext<'p> {
    global_pool: &'p mut StringPoolBuilder,
    keys: Option<&'p KeyIndex>,
}

impl<'p> PrepareContext<'p> {
    pub fn new(global_pool: &'p mut StringPoolBuilder) -> Self {
        PrepareContext {
            global_pool,
            keys: None,
        }
    }

    pub fn append_global_string(&mut self, text: &str) -> Result<u32> {
        self.global_pool.append_string(text)
    }

    /// A context for the children of one package
    pub fn with_keys<'s>(&'s mut self, keys: &'s KeyIndex) -> PrepareContext<'s> {
        PrepareContext {
            global_pool: &mut *self.global_pool,
            keys: Some(keys),
        }
    }

    pub fn key_index(&self, key: &str, public: bool) -> Result<u32> {
        self.keys
            .and_then(|keys| keys.get(key, public))
            .ok_or_else(|| Error::UnresolvedKey {
                key: key.to_owned(),
                public,
            })
    }
}

/// Positions of a package's keys in its key pool, one map per visibility
#[derive(Debug, Default)]
pub(in crate::writer) struct KeyIndex {
    public: HashMap<String, u32>,
    private: HashMap<String, u32>,
}

impl KeyIndex {
    pub fn insert(&mut self, key: &str, public: bool, index: u32) {
        self.partition_mut(public).insert(key.to_owned(), index);
    }

    pub fn get(&self, key: &str, public: bool) -> Option<u32> {
        let partition = if public { &self.public } else { &self.private };
        partition.get(key).copied()
    }

    pub fn public_count(&self) -> usize {
        self.public.len()
    }

    pub fn private_count(&self) -> usize {
        self.private.len()
    }

    fn partition_mut(&mut self, public: bool) -> &mut HashMap<String, u32> {
        if public {
            &mut self.public
        } else {
            &mut self.private
        }
    }
}

/// The size fixed by `prepare`, or the error explaining why there is none yet
pub(in crate::writer) fn prepared_size(fragment: &'static str, size: Option<usize>) -> Result<usize> {
    size.ok_or(Error::NotPrepared(fragment))
}
