//! Parameter binding: sequence allocation and the ordered value store.
//!
//! [`ParamBinder`] hands out `seq_<n>` placeholder names in strictly
//! increasing order and keeps the bound values by sequence number. One
//! binder is shared (via `Arc`) between a criteria and every nested child
//! built from it, so a whole builder tree draws from a single sequence.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio_postgres::types::ToSql;

pub(crate) const SEQ_PREFIX: &str = "seq_";

/// A clone-friendly bound value.
///
/// Wrapping in `Arc` lets predicates, the binder store and parameter
/// snapshots share one allocation per value.
#[derive(Clone)]
pub struct Param(std::sync::Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Wrap any `ToSql` value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(std::sync::Arc::new(value))
    }

    /// A bound SQL NULL.
    pub fn null() -> Self {
        Param::new(Option::<String>::None)
    }

    /// Borrow the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ToSql has Debug as a supertrait, so the wrapped value prints itself.
        fmt::Debug::fmt(&self.0, f)
    }
}

/// Declared bind type for one parameter, named after the Postgres type.
///
/// When present, the rendered placeholder carries an explicit cast
/// (`:seq_0::uuid`) and executors that bind by declared type can read the
/// hint back off the parameter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeHint(&'static str);

impl TypeHint {
    pub const SMALLINT: TypeHint = TypeHint("smallint");
    pub const INTEGER: TypeHint = TypeHint("integer");
    pub const BIGINT: TypeHint = TypeHint("bigint");
    pub const REAL: TypeHint = TypeHint("real");
    pub const DOUBLE_PRECISION: TypeHint = TypeHint("double precision");
    pub const NUMERIC: TypeHint = TypeHint("numeric");
    pub const BOOLEAN: TypeHint = TypeHint("boolean");
    pub const TEXT: TypeHint = TypeHint("text");
    pub const BYTEA: TypeHint = TypeHint("bytea");
    pub const DATE: TypeHint = TypeHint("date");
    pub const TIMESTAMPTZ: TypeHint = TypeHint("timestamptz");
    pub const UUID: TypeHint = TypeHint("uuid");
    pub const JSONB: TypeHint = TypeHint("jsonb");

    /// A hint for a type not covered by the associated constants.
    pub const fn new(type_name: &'static str) -> Self {
        TypeHint(type_name)
    }

    /// The Postgres type name this hint casts to.
    pub fn type_name(&self) -> &'static str {
        self.0
    }
}

/// One allocated placeholder: name, value and optional declared type.
#[derive(Debug, Clone)]
pub struct BoundParam {
    name: String,
    value: Param,
    hint: Option<TypeHint>,
}

impl BoundParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Param {
        &self.value
    }

    pub fn hint(&self) -> Option<TypeHint> {
        self.hint
    }
}

/// Ordered snapshot of the binder store, in sequence order.
///
/// This is the parameter half of a rendered fragment. Its `Debug` form
/// prints `{seq_0: "ACTIVE", seq_1: 18}`.
#[derive(Clone, Default)]
pub struct Params {
    entries: Vec<BoundParam>,
}

impl Params {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by placeholder name.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    /// Look up a declared type hint by placeholder name.
    pub fn hint(&self, name: &str) -> Option<TypeHint> {
        self.entries.iter().find(|e| e.name == name).and_then(|e| e.hint)
    }

    /// 0-based position of a placeholder name in sequence order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Iterate entries in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundParam> {
        self.entries.iter()
    }

    /// Placeholder names in sequence order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Values as positional references for tokio-postgres-style executors.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.entries.iter().map(|e| e.value.as_ref()).collect()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", entry.name, entry.value)?;
        }
        f.write_str("}")
    }
}

/// Allocates placeholder names and stores bound values.
///
/// The sequence counter is atomic and the store is mutex-guarded: a binder
/// can be shared across pooled worker contexts extending one criteria, and
/// no two `bind` calls ever return the same name.
#[derive(Debug, Default)]
pub struct ParamBinder {
    seq: AtomicUsize,
    store: Mutex<BTreeMap<usize, BoundParam>>,
}

impl ParamBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next `seq_<n>` name and store the value under it.
    ///
    /// Allocation cannot fail; SQL NULL is a legal value.
    pub fn bind(&self, value: Param, hint: Option<TypeHint>) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let name = format!("{SEQ_PREFIX}{n}");
        let entry = BoundParam {
            name: name.clone(),
            value,
            hint,
        };
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(n, entry);
        name
    }

    /// Number of values bound so far.
    pub fn len(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the store in sequence order.
    pub fn snapshot(&self) -> Params {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        Params {
            entries: store.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn bind_allocates_sequential_names() {
        let binder = ParamBinder::new();
        assert_eq!(binder.bind(Param::new(1_i32), None), "seq_0");
        assert_eq!(binder.bind(Param::new("x"), None), "seq_1");
        assert_eq!(binder.bind(Param::null(), None), "seq_2");
        assert_eq!(binder.len(), 3);
    }

    #[test]
    fn snapshot_preserves_sequence_order() {
        let binder = ParamBinder::new();
        binder.bind(Param::new("ACTIVE"), None);
        binder.bind(Param::new(18_i32), None);
        binder.bind(Param::new(30_i32), None);

        let params = binder.snapshot();
        let names: Vec<_> = params.names().collect();
        assert_eq!(names, vec!["seq_0", "seq_1", "seq_2"]);
        assert_eq!(format!("{:?}", params), r#"{seq_0: "ACTIVE", seq_1: 18, seq_2: 30}"#);
    }

    #[test]
    fn hint_is_kept_on_the_entry() {
        let binder = ParamBinder::new();
        let name = binder.bind(Param::new(7_i64), Some(TypeHint::BIGINT));
        let params = binder.snapshot();
        assert_eq!(params.hint(&name), Some(TypeHint::BIGINT));
        assert_eq!(params.hint("seq_99"), None);
    }

    #[test]
    fn index_of_follows_bind_order() {
        let binder = ParamBinder::new();
        binder.bind(Param::new(1_i32), None);
        binder.bind(Param::new(2_i32), None);
        let params = binder.snapshot();
        assert_eq!(params.index_of("seq_0"), Some(0));
        assert_eq!(params.index_of("seq_1"), Some(1));
        assert_eq!(params.index_of("seq_9"), None);
    }

    #[test]
    fn as_refs_matches_len() {
        let binder = ParamBinder::new();
        binder.bind(Param::new(1_i32), None);
        binder.bind(Param::new("two"), None);
        let params = binder.snapshot();
        assert_eq!(params.as_refs().len(), 2);
    }

    #[test]
    fn concurrent_binds_never_collide() {
        let binder = Arc::new(ParamBinder::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let binder = Arc::clone(&binder);
            handles.push(std::thread::spawn(move || {
                let mut names = Vec::new();
                for i in 0..50 {
                    names.push(binder.bind(Param::new(t * 50 + i), None));
                }
                names
            }));
        }

        let mut all: Vec<String> = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        assert_eq!(all.len(), 400);
        assert_eq!(binder.len(), 400);

        all.sort();
        all.dedup();
        assert_eq!(all.len(), 400, "duplicate placeholder names");
    }

    #[test]
    fn names_within_one_thread_strictly_increase() {
        let binder = ParamBinder::new();
        let a = binder.bind(Param::new(1_i32), None);
        let b = binder.bind(Param::new(2_i32), None);
        let na: usize = a[SEQ_PREFIX.len()..].parse().unwrap();
        let nb: usize = b[SEQ_PREFIX.len()..].parse().unwrap();
        assert!(nb > na);
    }
}
