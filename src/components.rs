#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Header {
    pub resource_type: ResourceType,
    pub header_size: u16,
    pub size: u64,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ResourceType {
    StringPool = 0x0001,
    Table = 0x0002,
    TablePackage = 0x0200,
    TableType = 0x0201,
    TableTypeSpec = 0x0202,
}

/// The root of a resource table: an ordered list of packages.
///
/// The global string pool is not part of the model. It is rebuilt on every
/// write from the [`Value::Text`] values found in the packages.
#[derive(Debug, Default, Clone)]
pub struct Table {
    pub packages: Vec<Package>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    pub fn with_packages(packages: Vec<Package>) -> Self {
        Table { packages }
    }

    pub fn add_package(&mut self, package: Package) -> &mut Self {
        self.packages.push(package);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: u8,
    pub name: String, // at most 128 UTF-16 code units
    pub chunks: Vec<PackageChunk>,
}

impl Package {
    pub fn new<S: Into<String>>(id: u8, name: S) -> Self {
        Package {
            id,
            name: name.into(),
            chunks: Vec::new(),
        }
    }

    pub fn add_type_spec(&mut self, spec: TypeSpec) -> &mut Self {
        self.chunks.push(PackageChunk::TypeSpec(spec));
        self
    }

    pub fn add_type(&mut self, r#type: Type) -> &mut Self {
        self.chunks.push(PackageChunk::Type(r#type));
        self
    }

    /// Reference to entry `entry_id` of `spec`'s type inside this package
    pub fn reference(&self, spec: &TypeSpec, entry_id: u16) -> ResourceRef {
        ResourceRef::new(self.id, spec.id, entry_id)
    }
}

/// Type specs and types are kept in one list because they are written
/// interleaved, in the order the caller added them.
#[derive(Debug, Clone)]
pub enum PackageChunk {
    TypeSpec(TypeSpec),
    Type(Type),
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub id: u8, // id - 1 is the index to the package type names
    pub name: String,
    pub flags: Vec<u32>,
}

impl TypeSpec {
    pub const SPEC_PUBLIC: u32 = 0x40000000;

    pub fn new<S: Into<String>>(id: u8, name: S, flags: Vec<u32>) -> Self {
        TypeSpec {
            id,
            name: name.into(),
            flags,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Type {
    pub id: u8,
    pub config: Config,
    /// Entries in insertion order. Entry ids must be unique within the type.
    pub entries: Vec<Entry>,
}

impl Type {
    pub fn new(id: u8, config: Config) -> Self {
        Type {
            id,
            config,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: Entry) -> &mut Self {
        self.entries.push(entry);
        self
    }
}

/// The configuration a [`Type`] applies to.
///
/// Two-letter codes use [`Config::ANY`] for "no preference".
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Config {
    pub imsi: u32,
    pub language: [u8; 2],
    pub region: [u8; 2],
    pub screen_type: u32,
    pub input: u32,
    pub screen_size: u32,
    pub sdk_version: u16,
    pub minor_version: u16,
    pub screen_config: u32,
    pub screen_size_dp: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            imsi: 0,
            language: Config::ANY,
            region: Config::ANY,
            screen_type: 0,
            input: 0,
            screen_size: 0,
            sdk_version: 0,
            minor_version: 0,
            screen_config: 0,
            screen_size_dp: 0,
        }
    }
}

impl Config {
    pub const ANY: [u8; 2] = [0, 0];

    pub fn with_imsi(mut self, imsi: u32) -> Self {
        self.imsi = imsi;
        self
    }

    pub fn with_language(mut self, language: [u8; 2]) -> Self {
        self.language = language;
        self
    }

    pub fn with_region(mut self, region: [u8; 2]) -> Self {
        self.region = region;
        self
    }

    pub fn with_screen_type(mut self, screen_type: u32) -> Self {
        self.screen_type = screen_type;
        self
    }

    pub fn with_input(mut self, input: u32) -> Self {
        self.input = input;
        self
    }

    pub fn with_screen_size(mut self, screen_size: u32) -> Self {
        self.screen_size = screen_size;
        self
    }

    pub fn with_sdk_version(mut self, sdk_version: u16) -> Self {
        self.sdk_version = sdk_version;
        self
    }

    pub fn with_minor_version(mut self, minor_version: u16) -> Self {
        self.minor_version = minor_version;
        self
    }

    pub fn with_screen_config(mut self, screen_config: u32) -> Self {
        self.screen_config = screen_config;
        self
    }

    pub fn with_screen_size_dp(mut self, screen_size_dp: u32) -> Self {
        self.screen_size_dp = screen_size_dp;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: u16,
    pub key: String, // resolved against the key partition matching `public`
    pub public: bool,
    pub kind: EntryKind,
}

#[derive(Debug, Clone)]
pub enum EntryKind {
    Simple(Value),
    Map {
        parent: u32,
        values: Vec<(u32, Value)>,
    },
}

impl Entry {
    pub const FLAG_COMPLEX: u16 = 0x0001;
    pub const FLAG_PUBLIC: u16 = 0x0002;

    /// A private entry holding a single value
    pub fn new<S: Into<String>>(id: u16, key: S, value: Value) -> Self {
        Entry {
            id,
            key: key.into(),
            public: false,
            kind: EntryKind::Simple(value),
        }
    }

    /// A private map entry with no values yet
    pub fn map<S: Into<String>>(id: u16, key: S, parent: u32) -> Self {
        Entry {
            id,
            key: key.into(),
            public: false,
            kind: EntryKind::Map {
                parent,
                values: Vec::new(),
            },
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_parent(mut self, parent: ResourceRef) -> Self {
        if let EntryKind::Map { parent: current, .. } = &mut self.kind {
            *current = parent.packed();
        }
        self
    }

    /// Appends a `(name, value)` pair to a map entry. Ignored for simple entries.
    pub fn add_value(&mut self, name: u32, value: Value) -> &mut Self {
        if let EntryKind::Map { values, .. } = &mut self.kind {
            values.push((name, value));
        }
        self
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, EntryKind::Map { .. })
    }

    pub fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.is_complex() {
            flags |= Entry::FLAG_COMPLEX;
        }
        if self.public {
            flags |= Entry::FLAG_PUBLIC;
        }
        flags
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct ResourceRef {
    pub package_id: u8,
    pub type_id: u8,
    pub entry_id: u16,
}

impl ResourceRef {
    pub fn new(package_id: u8, type_id: u8, entry_id: u16) -> Self {
        ResourceRef {
            package_id,
            type_id,
            entry_id,
        }
    }

    /// `0xPPTTEEEE`
    pub fn packed(&self) -> u32 {
        (self.package_id as u32) << 24 | (self.type_id as u32) << 16 | self.entry_id as u32
    }
}

impl From<ResourceRef> for u32 {
    fn from(reference: ResourceRef) -> Self {
        reference.packed()
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Value {
    Integer { data_type: u8, data: u32 },
    Reference(ResourceRef),
    Text(String), // stored in the global string pool
}

impl Value {
    pub const TYPE_NULL: u8 = 0x00;
    pub const TYPE_REFERENCE: u8 = 0x01;
    pub const TYPE_ATTRIBUTE: u8 = 0x02;
    pub const TYPE_STRING: u8 = 0x03;
    pub const TYPE_FLOAT: u8 = 0x04;
    pub const TYPE_DIMENSION: u8 = 0x05;
    pub const TYPE_FRACTION: u8 = 0x06;
    pub const TYPE_INT_DEC: u8 = 0x10;
    pub const TYPE_INT_HEX: u8 = 0x11;
    pub const TYPE_INT_BOOLEAN: u8 = 0x12;
    pub const TYPE_INT_COLOR_ARGB8: u8 = 0x1c;
    pub const TYPE_INT_COLOR_RGB8: u8 = 0x1d;
    pub const TYPE_INT_COLOR_ARGB4: u8 = 0x1e;
    pub const TYPE_INT_COLOR_RGB4: u8 = 0x1f;

    pub fn integer(data_type: u8, data: u32) -> Self {
        Value::Integer { data_type, data }
    }

    pub fn boolean(value: bool) -> Self {
        Value::integer(Value::TYPE_INT_BOOLEAN, if value { u32::MAX } else { 0 })
    }

    pub fn reference(reference: ResourceRef) -> Self {
        Value::Reference(reference)
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Value::Text(text.into())
    }

    pub fn data_type(&self) -> u8 {
        match self {
            Value::Integer { data_type, .. } => *data_type,
            Value::Reference(_) => Value::TYPE_REFERENCE,
            Value::Text(_) => Value::TYPE_STRING,
        }
    }
}
