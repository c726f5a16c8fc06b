use std::marker::PhantomData;

use crate::Error;

/// Accumulates the mapped rows of a result set into a final result.
///
/// Any container implementing [`FromIterator`] can be used through [`CollectInto`], so custom
/// collectors are only needed for results which are not simply containers of rows.
///
/// ```
/// use std::collections::BTreeMap;
/// use dbmap::Collector;
///
/// /// Groups values by key.
/// #[derive(Default)]
/// struct GroupBy;
///
/// impl Collector for GroupBy {
///     type Item = (String, i64);
///     type Output = BTreeMap<String, Vec<i64>>;
///
///     fn collect(&self, items: impl Iterator<Item = (String, i64)>) -> Self::Output {
///         let mut groups = BTreeMap::<String, Vec<i64>>::new();
///         for (key, value) in items {
///             groups.entry(key).or_default().push(value);
///         }
///         groups
///     }
/// }
///
/// let rows = vec![("a".to_owned(), 1), ("b".to_owned(), 2), ("a".to_owned(), 3)];
/// let groups = GroupBy.collect(rows.into_iter());
/// assert_eq!(vec![1, 3], groups["a"]);
/// ```
pub trait Collector {
    /// Type of the mapped rows.
    type Item;
    type Output;

    fn collect(&self, items: impl Iterator<Item = Self::Item>) -> Self::Output;
}

/// Collects rows into any container implementing [`FromIterator`].
pub struct CollectInto<C, T> {
    _container: PhantomData<fn(T) -> C>,
}

impl<C, T> CollectInto<C, T> {
    pub fn new() -> Self {
        Self {
            _container: PhantomData,
        }
    }
}

impl<C, T> Default for CollectInto<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T> Collector for CollectInto<C, T>
where
    C: FromIterator<T>,
{
    type Item = T;
    type Output = C;

    fn collect(&self, items: impl Iterator<Item = T>) -> C {
        items.collect()
    }
}

/// Collects rows into a `Vec`.
pub type ListCollector<T> = CollectInto<Vec<T>, T>;

/// Feeds the successfully mapped rows to `collector`. Stops at the first error and returns it
/// instead of the output of the collector.
pub fn collect_results<C, I>(collector: &C, results: I) -> Result<C::Output, Error>
where
    C: Collector,
    I: Iterator<Item = Result<C::Item, Error>>,
{
    let mut error = None;
    let items = results.map_while(|result| match result {
        Ok(item) => Some(item),
        Err(e) => {
            error = Some(e);
            None
        }
    });
    let output = collector.collect(items);
    match error {
        Some(e) => Err(e),
        None => Ok(output),
    }
}
