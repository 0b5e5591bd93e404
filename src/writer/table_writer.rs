use super::components_sizing::ConstByteSizing;
use super::fragment::{prepared_size, Fragment, KeyIndex, PrepareContext};
use super::string_pool::{StringPool, StringPoolBuilder};
use super::type_writer::PackageChunkWriter;
use super::with_header::WithHeader;
use super::write_util;
use crate::components::{Header, Package, PackageChunk, ResourceType, Table};
use crate::error::{Error, Result};
use std::io::Write;
use tracing::trace;

/// Pools of a package, built while it is prepared
struct PackagePools {
    type_names: StringPool,
    key_names: StringPool,
    keys: KeyIndex,
}

pub(in crate::writer) struct PackageWriter<'a> {
    package: &'a Package,
    chunks: Vec<PackageChunkWriter<'a>>,
    pools: Option<PackagePools>,
    size: Option<usize>,
}

impl<'a> PackageWriter<'a> {
    const NAME_LENGTH: usize = 128; // in UTF-16 code units

    pub fn new(package: &'a Package) -> Self {
        PackageWriter {
            package,
            chunks: package.chunks.iter().map(PackageChunkWriter::new).collect(),
            pools: None,
            size: None,
        }
    }

    fn check_name(&self) -> Result<()> {
        let length = self.package.name.encode_utf16().count();
        if length > Self::NAME_LENGTH {
            return Err(Error::PackageNameTooLong {
                name: self.package.name.clone(),
                length,
            });
        }
        Ok(())
    }

    /// Public keys first, then private ones, each deduplicated within its own partition
    fn build_key_pool(&self) -> Result<(StringPool, KeyIndex)> {
        let entries = self
            .package
            .chunks
            .iter()
            .filter_map(|chunk| match chunk {
                PackageChunk::Type(r#type) => Some(r#type.entries.iter()),
                PackageChunk::TypeSpec(_) => None,
            })
            .flatten();
        let mut builder = StringPoolBuilder::utf8();
        let mut keys = KeyIndex::default();
        for public in [true, false] {
            for entry in entries.clone().filter(|entry| entry.public == public) {
                if keys.get(&entry.key, public).is_none() {
                    keys.insert(&entry.key, public, builder.append_string(&entry.key)?);
                }
            }
        }
        Ok((builder.build(), keys))
    }

    /// Index `id - 1` holds the name of type spec `id`, gaps stay empty
    fn build_type_name_pool(&self) -> Result<StringPool> {
        let specs = self
            .package
            .chunks
            .iter()
            .filter_map(|chunk| match chunk {
                PackageChunk::TypeSpec(spec) => Some(spec),
                PackageChunk::Type(_) => None,
            })
            .collect::<Vec<_>>();
        let type_count = specs.iter().map(|spec| spec.id as usize).max().unwrap_or(0);
        let mut names = vec![""; type_count];
        for spec in specs {
            if spec.id == 0 {
                return Err(Error::InvalidTypeSpecId(spec.name.clone()));
            }
            names[spec.id as usize - 1] = spec.name.as_str();
        }
        let mut builder = StringPoolBuilder::utf16();
        for name in names {
            builder.append_string(name)?;
        }
        Ok(builder.build())
    }

    fn pools(&self) -> Result<&PackagePools> {
        self.pools.as_ref().ok_or(Error::NotPrepared(Self::NAME))
    }
}

impl WithHeader for PackageWriter<'_> {
    const RESOURCE_TYPE: ResourceType = ResourceType::TablePackage;
    // header + id + name + type_strings + last_public_type + key_strings
    // + last_public_key + type_id_offset
    const HEADER_SIZE: u16 = (Header::SIZE + 4 + Self::NAME_LENGTH * 2 + 5 * 4) as u16;
    const NAME: &'static str = "package";

    fn body_size(&self) -> Result<usize> {
        let pools = self.pools()?;
        let chunks = self
            .chunks
            .iter()
            .map(|chunk| chunk.size())
            .sum::<Result<usize>>()?;
        Ok(pools.type_names.size()? + pools.key_names.size()? + chunks)
    }

    fn write_header_extension<W: Write>(&self, output: &mut W) -> Result<usize> {
        let pools = self.pools()?;
        let last_public = pools.keys.public_count();
        let name_length = self.package.name.encode_utf16().count();
        let mut written = write_util::write_u32(output, self.package.id)?;
        written += write_util::write_string_utf16(output, &self.package.name)?;
        written += write_util::write_zeros(output, (Self::NAME_LENGTH - name_length) * 2)?;
        written += write_util::write_u32(output, Self::HEADER_SIZE)?; // type_strings
        written += write_util::write_u32(output, last_public)?; // last_public_type
        written += write_util::write_u32(
            output,
            Self::HEADER_SIZE as usize + pools.type_names.size()?,
        )?; // key_strings
        written += write_util::write_u32(output, last_public)?; // last_public_key
        written += write_util::write_u32(output, 0)?; // type_id_offset
        Ok(written)
    }

    fn write_body<W: Write>(&self, output: &mut W) -> Result<usize> {
        let pools = self.pools()?;
        let mut written = pools.type_names.write(output)?;
        written += pools.key_names.write(output)?;
        for chunk in &self.chunks {
            written += chunk.write(output)?;
        }
        Ok(written)
    }
}

impl Fragment for PackageWriter<'_> {
    fn prepare(&mut self, context: &mut PrepareContext<'_>) -> Result<()> {
        self.check_name()?;
        let (key_names, keys) = self.build_key_pool()?;
        let type_names = self.build_type_name_pool()?;
        trace!(
            id = self.package.id,
            name = %self.package.name,
            public_keys = keys.public_count(),
            private_keys = keys.private_count(),
            type_names = type_names.len(),
            "Prepared package pools"
        );

        let mut package_context = context.with_keys(&keys);
        for chunk in &mut self.chunks {
            chunk.prepare(&mut package_context)?;
        }
        self.pools = Some(PackagePools {
            type_names,
            key_names,
            keys,
        });
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

/// The root writer. It owns the global string pool of one write session:
/// the pool is created when preparing starts, filled by the text values of
/// every package and frozen once they are all prepared.
pub(in crate::writer) struct TableWriter<'a> {
    packages: Vec<PackageWriter<'a>>,
    global_string_pool: Option<StringPool>,
    size: Option<usize>,
}

impl<'a> TableWriter<'a> {
    pub fn new(table: &'a Table) -> Self {
        TableWriter {
            packages: table.packages.iter().map(PackageWriter::new).collect(),
            global_string_pool: None,
            size: None,
        }
    }

    pub fn prepare(&mut self) -> Result<()> {
        let mut global_pool = StringPoolBuilder::utf8();
        let mut context = PrepareContext::new(&mut global_pool);
        for package in &mut self.packages {
            package.prepare(&mut context)?;
        }
        self.global_string_pool = Some(global_pool.build());
        self.size = Some(self.measure()?);
        Ok(())
    }

    pub fn global_string_count(&self) -> usize {
        self.global_string_pool
            .as_ref()
            .map(StringPool::len)
            .unwrap_or(0)
    }

    pub fn size(&self) -> Result<usize> {
        prepared_size(Self::NAME, self.size)
    }

    pub fn write<W: Write>(&self, output: &mut W) -> Result<usize> {
        self.write_chunk(self.size()?, output)
    }

    fn global_string_pool(&self) -> Result<&StringPool> {
        self.global_string_pool
            .as_ref()
            .ok_or(Error::NotPrepared(Self::NAME))
    }
}

impl WithHeader for TableWriter<'_> {
    const RESOURCE_TYPE: ResourceType = ResourceType::Table;
    const HEADER_SIZE: u16 = Header::SIZE as u16 + 4; // + package_count
    const NAME: &'static str = "table";

    fn body_size(&self) -> Result<usize> {
        let packages = self
            .packages
            .iter()
            .map(|package| package.size())
            .sum::<Result<usize>>()?;
        Ok(self.global_string_pool()?.size()? + packages)
    }

    fn write_header_extension<W: Write>(&self, output: &mut W) -> Result<usize> {
        write_util::write_u32(output, self.packages.len())
    }

    fn write_body<W: Write>(&self, output: &mut W) -> Result<usize> {
        let mut written = self.global_string_pool()?.write(output)?;
        for package in &self.packages {
            written += package.write(output)?;
        }
        Ok(written)
    }
}
