use arsc_writer::{
    to_bytes, write, write_to, Config, Entry, Error, Package, ResourceRef, Table, Type, TypeSpec,
    Value,
};
use std::io::{self, Write};

const TABLE: u16 = 0x0002;
const STRING_POOL: u16 = 0x0001;
const PACKAGE: u16 = 0x0200;
const TYPE: u16 = 0x0201;
const TYPE_SPEC: u16 = 0x0202;

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[derive(Debug, Clone, Copy)]
struct Chunk<'b> {
    kind: u16,
    header_size: usize,
    bytes: &'b [u8], // the whole chunk, header included
}

impl<'b> Chunk<'b> {
    fn at(bytes: &'b [u8], start: usize) -> Self {
        let size = u32_at(bytes, start + 4) as usize;
        Chunk {
            kind: u16_at(bytes, start),
            header_size: u16_at(bytes, start + 2) as usize,
            bytes: &bytes[start..start + size],
        }
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Chunks laid out back to back in `[from, size)`
    fn children_from(&self, from: usize) -> Vec<Chunk<'b>> {
        let mut children = vec![];
        let mut position = from;
        while position < self.size() {
            let child = Chunk::at(self.bytes, position);
            position += child.size();
            children.push(child);
        }
        assert_eq!(position, self.size(), "children overrun their parent");
        children
    }

    fn children(&self) -> Vec<Chunk<'b>> {
        self.children_from(self.header_size)
    }
}

fn read_utf8_length(bytes: &[u8], position: &mut usize) -> usize {
    let first = bytes[*position] as usize;
    *position += 1;
    if first & 0x80 == 0 {
        return first;
    }
    let second = bytes[*position] as usize;
    *position += 1;
    ((first & 0x7F) << 8) | second
}

fn pool_strings(pool: Chunk) -> Vec<String> {
    assert_eq!(pool.kind, STRING_POOL);
    let bytes = pool.bytes;
    let count = u32_at(bytes, 8) as usize;
    let utf8 = u32_at(bytes, 16) & 0x100 != 0;
    let strings_start = u32_at(bytes, 20) as usize;
    (0..count)
        .map(|index| {
            let mut position = strings_start + u32_at(bytes, 28 + index * 4) as usize;
            if utf8 {
                let _utf16_length = read_utf8_length(bytes, &mut position);
                let length = read_utf8_length(bytes, &mut position);
                String::from_utf8(bytes[position..position + length].to_vec()).unwrap()
            } else {
                let length = u16_at(bytes, position) as usize;
                let units = (0..length)
                    .map(|unit| u16_at(bytes, position + 2 + unit * 2))
                    .collect::<Vec<_>>();
                String::from_utf16(&units).unwrap()
            }
        })
        .collect()
}

/// The type chunk of a single-package table, after the pools and the type spec
fn first_type(bytes: &[u8]) -> Vec<u8> {
    let table = Chunk::at(bytes, 0);
    let package = table.children()[1];
    let chunk = package
        .children()
        .into_iter()
        .find(|chunk| chunk.kind == TYPE)
        .expect("no type chunk");
    chunk.bytes.to_vec()
}

fn type_offsets(chunk: &[u8]) -> Vec<u32> {
    let count = u32_at(chunk, 12) as usize;
    let header_size = u16_at(chunk, 2) as usize;
    (0..count)
        .map(|slot| u32_at(chunk, header_size + slot * 4))
        .collect()
}

fn single_type_table(entries: Vec<Entry>) -> Table {
    let mut r#type = Type::new(1, Config::default());
    for entry in entries {
        r#type.add_entry(entry);
    }
    let mut package = Package::new(0x7F, "com.example.app");
    package.add_type_spec(TypeSpec::new(1, "string", vec![0; 8]));
    package.add_type(r#type);
    let mut table = Table::new();
    table.add_package(package);
    table
}

fn sample_table() -> Table {
    let mut app = Package::new(0x7F, "com.example.app");
    let strings = TypeSpec::new(1, "string", vec![0, TypeSpec::SPEC_PUBLIC]);
    let styles = TypeSpec::new(3, "style", vec![0]);
    let title = app.reference(&strings, 1);

    let mut default_strings = Type::new(1, Config::default());
    default_strings
        .add_entry(Entry::new(0, "app_name", Value::text("Example")))
        .add_entry(Entry::new(1, "title", Value::text("T\u{ed}tulo \u{1F600}")).public());
    let mut french = Type::new(1, Config::default().with_language(*b"fr").with_region(*b"CA"));
    french.add_entry(Entry::new(1, "title", Value::text("Titre")).public());

    let mut theme = Entry::map(0, "Theme", 0).with_parent(ResourceRef::new(0x01, 0x0e, 0x0001));
    theme
        .add_value(0x0101_0036, Value::integer(Value::TYPE_INT_COLOR_ARGB8, 0xFF00_FF00))
        .add_value(0x0101_0098, Value::reference(title))
        .add_value(0x0101_0099, Value::text("caption"));
    let mut themes = Type::new(3, Config::default().with_sdk_version(21));
    themes.add_entry(theme);

    app.add_type_spec(strings)
        .add_type(default_strings)
        .add_type(french)
        .add_type_spec(styles)
        .add_type(themes);

    let mut library = Package::new(0x02, "com.example.library");
    let mut bools = Type::new(1, Config::default());
    bools.add_entry(Entry::new(4, "enabled", Value::boolean(true)));
    library
        .add_type_spec(TypeSpec::new(1, "bool", vec![0; 5]))
        .add_type(bools);

    Table::with_packages(vec![app, library])
}

#[test]
fn empty_table_is_header_and_empty_pool() {
    let bytes = to_bytes(&Table::new()).unwrap();
    #[rustfmt::skip]
    let expected = vec![
        0x02, 0x00, 0x0C, 0x00, 40, 0, 0, 0, // table header
        0, 0, 0, 0, // package count
        0x01, 0x00, 0x1C, 0x00, 28, 0, 0, 0, // pool header
        0, 0, 0, 0, // string count
        0, 0, 0, 0, // style count
        0x00, 0x01, 0x00, 0x00, // utf-8
        28, 0, 0, 0, // strings start
        0, 0, 0, 0, // styles start
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn every_chunk_declares_what_it_writes() {
    fn check(chunk: Chunk) {
        assert_eq!(chunk.size() % 4, 0, "{chunk:?}");
        assert_eq!(chunk.header_size % 4, 0, "{chunk:?}");
        match chunk.kind {
            TABLE | PACKAGE => chunk.children().into_iter().for_each(check),
            STRING_POOL | TYPE | TYPE_SPEC => {}
            kind => panic!("unexpected chunk type {kind:#x}"),
        }
    }

    let bytes = to_bytes(&sample_table()).unwrap();
    let table = Chunk::at(&bytes, 0);
    assert_eq!(table.kind, TABLE);
    assert_eq!(table.size(), bytes.len());
    assert_eq!(u32_at(&bytes, 8), 2);
    check(table);

    let kinds = table.children().iter().map(|chunk| chunk.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![STRING_POOL, PACKAGE, PACKAGE]);
    let app = table.children()[1];
    let kinds = app.children().iter().map(|chunk| chunk.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![STRING_POOL, STRING_POOL, TYPE_SPEC, TYPE, TYPE, TYPE_SPEC, TYPE]
    );
}

#[test]
fn write_to_reports_bytes_written() {
    let table = sample_table();
    let mut output = vec![];
    let written = write_to(&table, &mut output).unwrap();
    assert_eq!(written, output.len());
    assert_eq!(output, to_bytes(&table).unwrap());
}

#[test]
fn text_values_fill_the_global_pool_in_visit_order() {
    let bytes = to_bytes(&sample_table()).unwrap();
    let global = Chunk::at(&bytes, 0).children()[0];
    assert_eq!(
        pool_strings(global),
        vec!["Example", "T\u{ed}tulo \u{1F600}", "Titre", "caption"]
    );
}

#[test]
fn duplicate_text_is_not_shared() {
    let bytes = to_bytes(&single_type_table(vec![
        Entry::new(0, "first", Value::text("same")),
        Entry::new(1, "second", Value::text("same")),
    ]))
    .unwrap();
    let global = Chunk::at(&bytes, 0).children()[0];
    assert_eq!(pool_strings(global), vec!["same", "same"]);

    let chunk = first_type(&bytes);
    let entries_start = u32_at(&chunk, 16) as usize;
    assert_eq!(u32_at(&chunk, entries_start + 12), 0);
    assert_eq!(u32_at(&chunk, entries_start + 16 + 12), 1);
}

#[test]
fn reference_packs_package_type_and_entry() {
    let reference = ResourceRef::new(0x7F, 0x02, 0x0003);
    assert_eq!(reference.packed(), 0x7F02_0003);

    let bytes = to_bytes(&single_type_table(vec![Entry::new(
        0,
        "link",
        Value::reference(reference),
    )]))
    .unwrap();
    let chunk = first_type(&bytes);
    let value = u32_at(&chunk, 16) as usize + 8;
    assert_eq!(u16_at(&chunk, value), 8);
    assert_eq!(chunk[value + 2], 0);
    assert_eq!(chunk[value + 3], Value::TYPE_REFERENCE);
    assert_eq!(u32_at(&chunk, value + 4), 0x7F02_0003);
}

#[test]
fn offset_table_follows_ids_while_entries_keep_insertion_order() {
    let bytes = to_bytes(&single_type_table(vec![
        Entry::new(5, "five", Value::integer(Value::TYPE_INT_DEC, 1)),
        Entry::new(2, "two", Value::integer(Value::TYPE_INT_DEC, 2)),
    ]))
    .unwrap();
    let chunk = first_type(&bytes);

    assert_eq!(u32_at(&chunk, 12), 6);
    let header_size = u16_at(&chunk, 2) as usize;
    assert_eq!(header_size, 56);
    assert_eq!(u32_at(&chunk, 16) as usize, header_size + 6 * 4);

    let missing = u32::MAX;
    assert_eq!(
        type_offsets(&chunk),
        vec![missing, missing, 0, missing, missing, 16]
    );

    // entries are emitted as inserted: id 5 first, so slot 2 addresses it
    let entries_start = u32_at(&chunk, 16) as usize;
    assert_eq!(u32_at(&chunk, entries_start + 12), 1);
    assert_eq!(u32_at(&chunk, entries_start + 16 + 12), 2);
    assert_eq!(chunk.len(), entries_start + 32);
}

#[test]
fn type_without_entries_has_empty_offset_table() {
    let bytes = to_bytes(&single_type_table(vec![])).unwrap();
    let chunk = first_type(&bytes);
    assert_eq!(u32_at(&chunk, 12), 0);
    assert_eq!(u32_at(&chunk, 16), 56);
    assert_eq!(chunk.len(), 56);
}

#[test]
fn configuration_is_written_after_the_type_header() {
    let mut r#type = Type::new(
        1,
        Config::default()
            .with_language(*b"de")
            .with_region(*b"AT")
            .with_sdk_version(26)
            .with_screen_size_dp(0x0140_0258),
    );
    r#type.add_entry(Entry::new(0, "greeting", Value::text("Servus")));
    let mut package = Package::new(0x7F, "com.example.app");
    package.add_type_spec(TypeSpec::new(1, "string", vec![0])).add_type(r#type);
    let bytes = to_bytes(&Table::with_packages(vec![package])).unwrap();

    let chunk = first_type(&bytes);
    let config = &chunk[20..56];
    assert_eq!(u32_at(config, 0), 36);
    assert_eq!(&config[8..12], b"deAT");
    assert_eq!(u16_at(config, 24), 26);
    assert_eq!(u32_at(config, 32), 0x0140_0258);
}

#[test]
fn keys_resolve_within_their_visibility() {
    let bytes = to_bytes(&single_type_table(vec![
        Entry::new(0, "alpha", Value::integer(Value::TYPE_INT_DEC, 0)).public(),
        Entry::new(1, "shared", Value::integer(Value::TYPE_INT_DEC, 1)),
        Entry::new(2, "beta", Value::integer(Value::TYPE_INT_DEC, 2)).public(),
        Entry::new(3, "shared", Value::integer(Value::TYPE_INT_DEC, 3)).public(),
        Entry::new(4, "gamma", Value::integer(Value::TYPE_INT_DEC, 4)),
    ]))
    .unwrap();
    let table = Chunk::at(&bytes, 0);
    let package = table.children()[1];
    let keys = pool_strings(package.children()[1]);
    assert_eq!(keys, vec!["alpha", "beta", "shared", "shared", "gamma"]);

    // last_public_type and last_public_key
    assert_eq!(u32_at(package.bytes, 272), 3);
    assert_eq!(u32_at(package.bytes, 280), 3);

    let chunk = first_type(&bytes);
    let entries_start = u32_at(&chunk, 16) as usize;
    let entry_keys = (0..5)
        .map(|index| {
            let entry = entries_start + index * 16;
            let flags = u16_at(&chunk, entry + 2);
            (flags, u32_at(&chunk, entry + 4))
        })
        .collect::<Vec<_>>();
    assert_eq!(
        entry_keys,
        vec![
            (Entry::FLAG_PUBLIC, 0),
            (0, 3),
            (Entry::FLAG_PUBLIC, 1),
            (Entry::FLAG_PUBLIC, 2),
            (0, 4),
        ]
    );
    for (index, (_, key)) in entry_keys.iter().enumerate() {
        let expected = ["alpha", "shared", "beta", "shared", "gamma"][index];
        assert_eq!(keys[*key as usize], expected);
    }
}

#[test]
fn package_header_points_at_its_pools() {
    let bytes = to_bytes(&sample_table()).unwrap();
    let package = Chunk::at(&bytes, 0).children()[1];
    let header = package.bytes;
    assert_eq!(package.header_size, 288);
    assert_eq!(u32_at(header, 8), 0x7F);

    let name = (0..15).map(|unit| u16_at(header, 12 + unit * 2)).collect::<Vec<_>>();
    assert_eq!(String::from_utf16(&name).unwrap(), "com.example.app");
    assert!(header[12 + 30..12 + 256].iter().all(|byte| *byte == 0));

    let children = package.children();
    assert_eq!(u32_at(header, 268), 288);
    assert_eq!(u32_at(header, 276) as usize, 288 + children[0].size());
    assert_eq!(u32_at(header, 284), 0);
    assert_eq!(Chunk::at(header, 288).kind, STRING_POOL);
    assert_eq!(Chunk::at(header, u32_at(header, 276) as usize).kind, STRING_POOL);
}

#[test]
fn type_name_pool_is_indexed_by_spec_id() {
    let bytes = to_bytes(&sample_table()).unwrap();
    let package = Chunk::at(&bytes, 0).children()[1];
    let type_names = package.children()[0];
    assert_eq!(u32_at(type_names.bytes, 16) & 0x100, 0, "type names are UTF-16");
    assert_eq!(pool_strings(type_names), vec!["string", "", "style"]);
}

#[test]
fn type_spec_writes_its_flags() {
    let bytes = to_bytes(&sample_table()).unwrap();
    let package = Chunk::at(&bytes, 0).children()[1];
    let spec = package.children()[2];
    assert_eq!(spec.kind, TYPE_SPEC);
    assert_eq!(spec.header_size, 16);
    assert_eq!(spec.bytes[8], 1);
    assert_eq!(u32_at(spec.bytes, 12), 2);
    assert_eq!(u32_at(spec.bytes, 16), 0);
    assert_eq!(u32_at(spec.bytes, 20), TypeSpec::SPEC_PUBLIC);
    assert_eq!(spec.size(), 24);
}

#[test]
fn map_entry_writes_parent_and_pairs() {
    let bytes = to_bytes(&sample_table()).unwrap();
    let package = Chunk::at(&bytes, 0).children()[1];
    let themes = package.children()[6];
    assert_eq!(themes.kind, TYPE);
    assert_eq!(themes.bytes[8], 3);

    let entry = u32_at(themes.bytes, 16) as usize;
    let chunk = themes.bytes;
    assert_eq!(u16_at(chunk, entry), 16);
    assert_eq!(u16_at(chunk, entry + 2), Entry::FLAG_COMPLEX);
    assert_eq!(u32_at(chunk, entry + 8), 0x010e_0001);
    assert_eq!(u32_at(chunk, entry + 12), 3);

    let pairs = (0..3)
        .map(|index| {
            let pair = entry + 16 + index * 12;
            (u32_at(chunk, pair), chunk[pair + 7], u32_at(chunk, pair + 8))
        })
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![
            (0x0101_0036, Value::TYPE_INT_COLOR_ARGB8, 0xFF00_FF00),
            (0x0101_0098, Value::TYPE_REFERENCE, 0x7F01_0001),
            (0x0101_0099, Value::TYPE_STRING, 3),
        ]
    );
    assert_eq!(chunk.len(), entry + 16 + 3 * 12);
}

#[test]
fn package_name_of_128_units_fits() {
    let mut table = Table::new();
    table.add_package(Package::new(0x7F, "n".repeat(128)));
    let bytes = to_bytes(&table).unwrap();
    let package = Chunk::at(&bytes, 0).children()[1];
    assert_eq!(u16_at(package.bytes, 12 + 127 * 2), u16::from(b'n'));
    assert_eq!(u32_at(package.bytes, 268), 288);
}

#[test]
fn over_long_package_name_writes_nothing() {
    let mut table = Table::new();
    table.add_package(Package::new(0x7F, "n".repeat(129)));
    let mut output = vec![];
    let error = write_to(&table, &mut output).unwrap_err();
    assert!(matches!(error, Error::PackageNameTooLong { length: 129, .. }));
    assert!(output.is_empty());
}

#[test]
fn duplicate_entry_ids_are_rejected() {
    let error = to_bytes(&single_type_table(vec![
        Entry::new(3, "first", Value::boolean(false)),
        Entry::new(3, "second", Value::boolean(true)),
    ]))
    .unwrap_err();
    assert!(matches!(
        error,
        Error::DuplicateEntry {
            type_id: 1,
            entry_id: 3
        }
    ));
}

#[test]
fn type_spec_id_zero_is_rejected() {
    let mut package = Package::new(0x7F, "com.example.app");
    package.add_type_spec(TypeSpec::new(0, "broken", vec![]));
    let error = to_bytes(&Table::with_packages(vec![package])).unwrap_err();
    assert!(matches!(error, Error::InvalidTypeSpecId(name) if name == "broken"));
}

struct FailingSink {
    capacity: usize,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.capacity {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.capacity -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_failure_aborts_the_write() {
    let mut sink = FailingSink { capacity: 100 };
    let error = write_to(&sample_table(), &mut sink).unwrap_err();
    assert!(matches!(error, Error::Io(_)));
}

#[test]
fn write_stores_the_table_in_a_file() {
    let path = std::env::temp_dir().join(format!("arsc-writer-{}.arsc", std::process::id()));
    let table = sample_table();
    let written = write(&table, &path).unwrap();
    let stored = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(written, stored.len());
    assert_eq!(stored, to_bytes(&table).unwrap());
}
