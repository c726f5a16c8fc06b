use std::{
    any::TypeId,
    cell::RefCell,
    collections::HashMap,
    sync::Arc,
};

use crate::{
    ErasedColumnMapper, Error, Mappers, MappingOptions, Reflect, Row, TypedRowMapper,
    reflect::downcast,
};

/// Passed to every mapper. Holds the statement being executed and the [`Mappers`] in effect for
/// it, so mappers can delegate to the mappers registered for other types.
pub struct StatementContext {
    raw_sql: String,
    rendered_sql: String,
    mappers: Mappers,
    /// Column mappers are resolved once per type and statement, rather than once per row.
    column_mappers: RefCell<HashMap<TypeId, Arc<dyn ErasedColumnMapper>>>,
}

impl StatementContext {
    /// * `raw_sql`: Statement text as written by the application.
    /// * `rendered_sql`: Statement text as passed to the driver, i.e. with named parameters
    ///   replaced by positional placeholders.
    pub fn new(raw_sql: String, rendered_sql: String, mappers: Mappers) -> Self {
        Self {
            raw_sql,
            rendered_sql,
            mappers,
            column_mappers: RefCell::new(HashMap::new()),
        }
    }

    /// Context without a statement. Useful to invoke mappers outside of statement execution,
    /// e.g. in tests.
    pub fn for_mappers(mappers: Mappers) -> Self {
        Self::new(String::new(), String::new(), mappers)
    }

    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }

    pub fn rendered_sql(&self) -> &str {
        &self.rendered_sql
    }

    pub fn mappers(&self) -> &Mappers {
        &self.mappers
    }

    pub fn options(&self) -> &MappingOptions {
        self.mappers.options()
    }

    /// Column mapper for `T` chosen by the [`Mappers`] registry.
    pub fn find_column_mapper<T: Reflect>(&self) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
        let id = TypeId::of::<T>();
        if let Some(mapper) = self.column_mappers.borrow().get(&id) {
            return Ok(mapper.clone());
        }
        let mapper = self.mappers.find_column_mapper(&T::type_info())?;
        self.column_mappers.borrow_mut().insert(id, mapper.clone());
        Ok(mapper)
    }

    /// Row mapper for `T` chosen by the [`Mappers`] registry. Unlike column mappers these are not
    /// cached, since a statement usually maps its rows to a single type.
    pub fn find_row_mapper<T: Reflect>(&self) -> Result<TypedRowMapper<T>, Error> {
        self.mappers.row_mapper::<T>()
    }

    /// Maps column `col` (starting at `1`) of `row` to `T`, using the column mapper registered for
    /// `T`.
    pub fn map_column<T: Reflect>(&self, row: &Row, col: u16) -> Result<T, Error> {
        let mapper = self.find_column_mapper::<T>()?;
        downcast(mapper.map_erased(row, col, self)?)
    }

    /// Like [`Self::map_column`], but identifies the column by name. Names are compared as
    /// configured in [`MappingOptions::column_name_matching`].
    pub fn map_column_by_name<T: Reflect>(&self, row: &Row, name: &str) -> Result<T, Error> {
        let col = row.find_column(name, self.options().column_names())?;
        self.map_column(row, col)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use crate::{
        ColumnMapperFactory, ColumnNameMatching, ErasedColumnMapper, Error, Mappers,
        MappingOptions, PrimitivesColumnMapperFactory, ResultSet, RowVec, Value,
        reflect::TypeInfo,
    };

    use super::StatementContext;

    #[test]
    fn column_mapper_is_resolved_once_per_statement() {
        struct CountingFactory(Arc<AtomicUsize>);

        impl ColumnMapperFactory for CountingFactory {
            fn accepts(&self, target: &TypeInfo, _mappers: &Mappers) -> bool {
                target.is::<i64>()
            }

            fn column_mapper_for(
                &self,
                target: &TypeInfo,
                _mappers: &Mappers,
            ) -> Result<Arc<dyn ErasedColumnMapper>, Error> {
                self.0.fetch_add(1, Ordering::SeqCst);
                PrimitivesColumnMapperFactory.column_mapper_for(target, &Mappers::default())
            }
        }

        let resolutions = Arc::new(AtomicUsize::new(0));
        let mut mappers = Mappers::default();
        mappers.register_column_mapper_factory(CountingFactory(resolutions.clone()));
        let ctx = StatementContext::for_mappers(mappers);
        let mut rows = RowVec::new(["n"]);
        rows.push(vec![Value::Integer(1)]);
        rows.push(vec![Value::Integer(2)]);

        let mut sum = 0;
        while let Some(row) = rows.next_row().unwrap() {
            sum += ctx.map_column::<i64>(&row, 1).unwrap();
        }

        assert_eq!(3, sum);
        assert_eq!(1, resolutions.load(Ordering::SeqCst));
    }

    #[test]
    fn map_column_by_name_respects_matching_option() {
        let mut rows = RowVec::new(["NAME"]);
        rows.push(vec![Value::Text("Zaphod".to_owned())]);
        let row = rows.next_row().unwrap().unwrap();

        let relaxed = StatementContext::for_mappers(Mappers::default());
        let exact = StatementContext::for_mappers(Mappers::new(
            MappingOptions::default().column_name_matching(ColumnNameMatching::Exact),
        ));

        assert_eq!("Zaphod", relaxed.map_column_by_name::<String>(&row, "name").unwrap());
        assert!(matches!(
            exact.map_column_by_name::<String>(&row, "name"),
            Err(Error::UnknownColumn { .. })
        ));
    }
}
