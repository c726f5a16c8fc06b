mod common;

use std::collections::{BTreeMap, HashMap};

use tempfile::NamedTempFile;
use test_case::test_case;

use common::{TEST_MAP, handle, key_value_store};

use dbmap::{
    Collector, EnumStrategy, Error, FromRow, Handle, MappingOptions, Reflect, Row, RowMapper,
    SqlEnum, StatementContext, sql_object, sqlite::SqliteDriver,
};

/// Maps the `k` and `v` columns to an entry.
#[derive(Default)]
struct EntryMapper;

impl RowMapper<(String, String)> for EntryMapper {
    fn map(&self, row: &Row, ctx: &StatementContext) -> Result<(String, String), Error> {
        let key = ctx.map_column_by_name::<String>(row, "k")?;
        let value = ctx.map_column_by_name::<String>(row, "v")?;
        Ok((key, value))
    }
}

/// Builds a map from entries.
#[derive(Default)]
struct EntryCollector;

impl Collector for EntryCollector {
    type Item = (String, String);
    type Output = HashMap<String, String>;

    fn collect(&self, items: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        let mut result = HashMap::new();
        for (key, value) in items {
            result.insert(key, value);
        }
        result
    }
}

#[sql_object]
trait BiffDao {
    #[sql_query("SELECT k, v FROM kv")]
    #[mapper(EntryMapper)]
    #[collector(EntryCollector)]
    fn attrs(&self) -> Result<HashMap<String, String>, Error>;

    #[sql_query("SELECT k, v FROM kv")]
    fn sorted_attrs(&self) -> Result<BTreeMap<String, String>, Error>;

    #[sql_query("SELECT v FROM kv WHERE k = :key")]
    fn attr(&self, key: &str) -> Result<Option<String>, Error>;

    #[sql_query("SELECT COUNT(*) FROM kv")]
    fn count(&self) -> Result<u32, Error>;

    #[sql_update("DELETE FROM kv WHERE k = ?")]
    fn remove(&self, key: &str) -> Result<bool, Error>;
}

fn expected_map() -> HashMap<String, String> {
    TEST_MAP
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn sql_object_with_mapper_and_collector() -> anyhow::Result<()> {
    let handle = key_value_store()?;

    let attrs = handle.attach().attrs()?;

    assert_eq!(expected_map(), attrs);
    Ok(())
}

#[test]
fn fluent_with_mapper_and_collector() -> anyhow::Result<()> {
    let handle = key_value_store()?;

    let attrs = handle
        .create_query("SELECT k, v FROM kv")
        .map(EntryMapper)
        .collect_with(&EntryCollector)?;

    assert_eq!(expected_map(), attrs);
    Ok(())
}

#[test]
fn sql_object_return_shapes() -> anyhow::Result<()> {
    let handle = key_value_store()?;
    let dao = handle.attach();

    assert_eq!(4, dao.sorted_attrs()?.len());
    assert_eq!(Some("DeLorean".to_owned()), dao.attr("make")?);
    assert_eq!(None, dao.attr("color")?);
    assert_eq!(4, dao.count()?);
    assert!(dao.remove("speed")?);
    assert!(!dao.remove("speed")?);
    assert_eq!(3, dao.count()?);
    Ok(())
}

#[sql_object]
trait FileDao {
    #[sql_update("CREATE TABLE files (name TEXT, size INTEGER, content BLOB)")]
    fn create(&self) -> Result<(), Error>;

    #[sql_update("INSERT INTO files VALUES (:name, :size, :content)")]
    fn insert(&self, name: &str, size: i64, content: &[u8]) -> Result<(), Error>;

    #[sql_query("SELECT content FROM files WHERE name = ?")]
    fn content(&self, name: &str) -> Result<Vec<u8>, Error>;

    #[sql_query("SELECT SUM(size) FROM files")]
    fn total_size(&self) -> Result<Option<i64>, Error>;

    #[sql_query("SELECT MAX(name), MAX(size) FROM files")]
    fn largest(&self) -> Result<Option<(String, i64)>, Error>;
}

#[test]
fn sql_object_returns_blob_from_single_column() -> anyhow::Result<()> {
    let handle = handle();
    let files = handle.attach();
    files.create()?;
    files.insert("hello.bin", 2, &[1, 2])?;

    let content = files.content("hello.bin")?;

    assert_eq!(vec![1u8, 2], content);
    Ok(())
}

#[test]
fn sql_object_maps_null_aggregate_to_none() -> anyhow::Result<()> {
    let handle = handle();
    let files = handle.attach();
    files.create()?;

    assert_eq!(None, files.total_size()?);
    assert_eq!(None, files.largest()?);

    files.insert("a.txt", 3, b"abc")?;
    files.insert("b.txt", 1, b"b")?;

    assert_eq!(Some(4), files.total_size()?);
    assert_eq!(Some(("b.txt".to_owned(), 3)), files.largest()?);
    Ok(())
}

#[derive(Debug, PartialEq, SqlEnum)]
enum Planet {
    Mercury,
    Venus,
    Earth,
}

#[test_case("Venus", Some(Planet::Venus); "declared name")]
#[test_case("venus", None; "names are case sensitive")]
#[test_case("Pluto", None; "unknown name")]
fn enum_by_name(stored: &str, expected: Option<Planet>) {
    let handle = handle();

    let result = handle
        .create_query("SELECT ?")
        .bind(stored)
        .map_to::<Planet>()
        .one();

    match expected {
        Some(planet) => assert_eq!(planet, result.unwrap()),
        None => assert!(matches!(
            result,
            Err(Error::UnknownEnumName { value, .. }) if value == stored
        )),
    }
}

#[test]
fn enum_bound_by_name_and_read_back() -> anyhow::Result<()> {
    let handle = handle();
    handle.execute("CREATE TABLE home (planet TEXT)", ())?;
    handle.execute("INSERT INTO home VALUES (?)", (Planet::Earth,))?;

    let stored: String = handle.create_query("SELECT planet FROM home").map_to().one()?;
    let planet: Planet = handle.create_query("SELECT planet FROM home").map_to().one()?;

    assert_eq!("Earth", stored);
    assert_eq!(Planet::Earth, planet);
    Ok(())
}

#[test]
fn null_maps_to_none_for_optional_enum() -> anyhow::Result<()> {
    let handle = handle();

    let planet: Option<Planet> = handle.create_query("SELECT NULL").map_to().one()?;
    let missing = handle.create_query("SELECT NULL").map_to::<Planet>().one();

    assert_eq!(None, planet);
    assert!(matches!(missing, Err(Error::UnexpectedNull { .. })));
    Ok(())
}

#[test]
fn enum_by_ordinal() -> anyhow::Result<()> {
    let options = MappingOptions::default().enum_strategy(EnumStrategy::ByOrdinal);
    let handle = Handle::with_options(SqliteDriver::open_in_memory()?, options);

    let planet: Planet = handle.create_query("SELECT 1").map_to().one()?;
    let out_of_range = handle.create_query("SELECT 3").map_to::<Planet>().one();

    assert_eq!(Planet::Venus, planet);
    assert!(matches!(
        out_of_range,
        Err(Error::EnumOrdinalOutOfRange { ordinal: 3, .. })
    ));
    Ok(())
}

#[test]
fn registered_column_mapper_overrides_built_in() -> anyhow::Result<()> {
    let mut handle = key_value_store()?;
    handle.register_column_mapper::<String, _>(
        |row: &Row, col: u16, _: &StatementContext| -> Result<String, Error> {
            let text = row.get(col)?.as_text().unwrap_or_default();
            Ok(text.to_uppercase())
        },
    );

    let value: String = handle
        .create_query("SELECT v FROM kv WHERE k = 'make'")
        .map_to()
        .one()?;

    assert_eq!("DELOREAN", value);
    Ok(())
}

/// Distance in kilometres, stored as text with a unit suffix.
#[derive(Debug, PartialEq)]
struct Kilometres(u32);

impl Reflect for Kilometres {}

#[derive(Debug, PartialEq, FromRow)]
struct Orbit {
    planet: Planet,
    #[column(name = "distance")]
    radius: Kilometres,
    moons: Option<u8>,
}

#[test]
fn from_row_uses_registered_column_mappers() -> anyhow::Result<()> {
    let mut handle = handle();
    handle.register_column_mapper::<Kilometres, _>(
        |row: &Row, col: u16, ctx: &StatementContext| -> Result<Kilometres, Error> {
            let text = ctx.map_column::<String>(row, col)?;
            let digits = text.trim_end_matches(" km");
            digits
                .parse()
                .map(Kilometres)
                .map_err(|_| Error::custom(format!("Not a distance: {text}")))
        },
    );

    let orbit: Orbit = handle
        .create_query("SELECT 'Earth' AS PLANET, '149598023 km' AS DISTANCE, 1 AS MOONS")
        .map_to()
        .one()?;

    assert_eq!(
        Orbit {
            planet: Planet::Earth,
            radius: Kilometres(149_598_023),
            moons: Some(1),
        },
        orbit
    );
    Ok(())
}

#[test]
fn missing_column_is_reported_by_name() {
    let handle = handle();

    let result = handle
        .create_query("SELECT 'Earth' AS planet")
        .map_to::<Orbit>()
        .one();

    assert!(matches!(result, Err(Error::UnknownColumn { name }) if name == "distance"));
}

#[test]
fn driver_errors_propagate() {
    let handle = handle();

    let result = handle
        .create_query("SELECT * FROM does_not_exist")
        .map_to::<i64>()
        .list();

    assert!(matches!(result, Err(Error::Driver(_))));
}

#[test]
fn integer_out_of_range_for_target() {
    let handle = handle();

    let result = handle.create_query("SELECT 300").map_to::<u8>().one();

    assert!(matches!(result, Err(Error::ValueOutOfRange { .. })));
}

#[test]
fn persist_in_database_file() -> anyhow::Result<()> {
    let file = NamedTempFile::new()?;

    let writer = Handle::new(SqliteDriver::open(file.path())?);
    writer.execute("CREATE TABLE t (a INTEGER, b TEXT)", ())?;
    writer
        .create_update("INSERT INTO t VALUES (:a, :b)")
        .bind_named("b", "Hello")
        .bind_named("a", 42)
        .execute()?;
    drop(writer);

    let reader = Handle::new(SqliteDriver::open(file.path())?);
    let rows: Vec<(i32, String)> = reader.create_query("SELECT a, b FROM t").map_to().list()?;

    assert_eq!(vec![(42, "Hello".to_owned())], rows);
    Ok(())
}
