//! # dbmap
//!
//! Maps the rows of SQL result sets to Rust values and binds Rust values to statement parameters.
//! Executing statements is left to a [`Driver`]. An SQLite driver is provided behind the `sqlite`
//! feature.
//!
//! How a column or row is mapped to a type is decided by the mapper factories registered with
//! [`Mappers`]. Built-in factories cover primitives, `Option`, enums deriving [`SqlEnum`], tuples
//! and structs deriving [`FromRow`]. Applications register their own mappers to extend or override
//! them.
//!
//! Traits annotated with [`sql_object`] declare statements on their methods. Their implementation
//! is generated and available through [`Handle::attach`].
//!
//! ```
//! use dbmap::{Error, FromRow, Handle, SqlEnum, sqlite::SqliteDriver};
//!
//! #[derive(Debug, PartialEq, SqlEnum)]
//! enum Kind {
//!     Planet,
//!     Moon,
//! }
//!
//! #[derive(Debug, PartialEq, FromRow)]
//! struct Body {
//!     name: String,
//!     kind: Kind,
//!     #[column(name = "radius_km")]
//!     radius: Option<f64>,
//! }
//!
//! let handle = Handle::new(SqliteDriver::open_in_memory()?);
//! handle.execute("CREATE TABLE bodies (name TEXT, kind TEXT, radius_km REAL)", ())?;
//! handle.execute("INSERT INTO bodies VALUES (?, ?, ?)", ("Phobos", Kind::Moon, 11.1))?;
//!
//! let body: Body = handle
//!     .create_query("SELECT * FROM bodies WHERE kind = :kind")
//!     .bind_named("kind", Kind::Moon)
//!     .map_to()
//!     .one()?;
//! assert_eq!(Kind::Moon, body.kind);
//! assert_eq!(Some(11.1), body.radius);
//! # Ok::<(), Error>(())
//! ```

mod collector;
mod column_mapper;
mod context;
mod driver;
mod enums;
mod error;
mod handle;
mod mappers;
mod options;
mod row;
mod row_mapper;
mod sql_object;
mod statement;
mod value;

pub mod reflect;
pub mod sql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use self::{
    collector::{CollectInto, Collector, ListCollector, collect_results},
    column_mapper::{
        ColumnMapper, ColumnMapperFactory, Erased, ErasedColumnMapper,
        ExactTypeColumnMapperFactory, OptionalColumnMapper, OptionalColumnMapperFactory,
        PrimitivesColumnMapperFactory, TypedColumnMapper,
    },
    context::StatementContext,
    driver::Driver,
    enums::{
        EnumByNameColumnMapperFactory, EnumByNameMapper, EnumByOrdinalColumnMapperFactory,
        EnumByOrdinalMapper, EnumColumnMapperFactory, NamedEnum,
    },
    error::Error,
    handle::Handle,
    mappers::Mappers,
    options::{ColumnNameMatching, EnumStrategy, MappingOptions},
    reflect::{Reflect, TypeInfo, TypeKind},
    row::{ResultSet, Row, RowVec},
    row_mapper::{
        ErasedRowMapper, ExactTypeRowMapperFactory, FromRow, FromRowMapperFactory,
        OptionalRowMapper, OptionalRowMapperFactory, RowMapper, RowMapperFactory,
        SingleColumnMapper, SingleColumnMapperFactory, TypedRowMapper,
    },
    sql::{Arguments, IntoArguments},
    sql_object::{SqlObject, UpdateResult},
    statement::{MappedRows, Query, ResultIterable, Update},
    value::{ToValue, Value},
};

#[cfg(feature = "derive")]
pub use dbmap_derive::{FromRow, SqlEnum, sql_object};
