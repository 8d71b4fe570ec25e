//! Per-clause fragment accumulators.
//!
//! Each storage collects raw elements and renders them into one clause body
//! on demand. The rendered text is cached on the storage and invalidated by
//! the next mutation. Predicate elements additionally memoize their own
//! rendered text, so a re-join after new elements arrive reuses the existing
//! placeholder names instead of binding the same values again.

use std::collections::HashSet;

use crate::dialect::{NullsOrder, OrderDirection};
use crate::ident::Ident;
use crate::meta::TableDef;
use crate::predicate::Predicate;
use crate::render::Renderer;

/// One accumulated predicate plus its memoized render result.
///
/// `rendered` stays `None` until a render pass touches the element; after
/// that it holds `Some(text)` or `Some(None)` for an element that
/// contributed nothing (an unresolved lenient target, an empty group).
#[derive(Debug, Clone)]
struct StoredPredicate {
    predicate: Predicate,
    rendered: Option<Option<String>>,
}

/// Connector-joined predicate accumulator backing conditions and HAVING.
#[derive(Debug, Clone, Default)]
pub(crate) struct PredicateStore {
    elements: Vec<StoredPredicate>,
    cache: Option<Option<String>>,
}

impl PredicateStore {
    pub(crate) fn add(&mut self, predicate: Predicate) {
        self.elements.push(StoredPredicate {
            predicate,
            rendered: None,
        });
        self.cache = None;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drain the accumulated predicates, e.g. to wrap them into a group.
    pub(crate) fn take_all(&mut self) -> Vec<Predicate> {
        self.cache = None;
        self.elements.drain(..).map(|e| e.predicate).collect()
    }

    /// Join every element that renders text, each prefixed by its own
    /// connector; the first emitted element drops its connector. `None`
    /// when nothing rendered.
    pub(crate) fn fragment(&mut self, r: &Renderer<'_>) -> Option<String> {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }
        let mut out = String::new();
        let mut emitted = false;
        for stored in &mut self.elements {
            if stored.rendered.is_none() {
                stored.rendered = Some(stored.predicate.render(r));
            }
            let Some(Some(text)) = &stored.rendered else {
                continue;
            };
            if emitted {
                out.push(' ');
                out.push_str(&stored.predicate.connector_or_default().to_string());
                out.push(' ');
            }
            out.push_str(text);
            emitted = true;
        }
        let joined = emitted.then_some(out);
        self.cache = Some(joined.clone());
        joined
    }
}

/// One explicit selection entry.
#[derive(Debug, Clone)]
pub(crate) enum SelectItem {
    /// Plain column, alias-qualified at render.
    Column(Ident),
    /// Trusted expression, emitted verbatim.
    Raw(String),
    /// Aggregate call: `FUNC(expr)` with an optional `AS alias`. Never
    /// alias-qualified.
    Aggregate {
        func: String,
        expr: String,
        alias: Option<Ident>,
    },
}

impl SelectItem {
    fn render(&self, r: &Renderer<'_>) -> String {
        match self {
            SelectItem::Column(column) => column.qualified(r.alias()),
            SelectItem::Raw(text) => text.clone(),
            SelectItem::Aggregate { func, expr, alias } => match alias {
                Some(a) => format!("{func}({expr}) AS {}", a.sql()),
                None => format!("{func}({expr})"),
            },
        }
    }
}

/// The SELECT list accumulator.
///
/// Explicit entries always win. Without any, the relation's metadata
/// columns expand in registration order minus the exclusion sets, and a
/// relation with no surviving columns falls back to `*`.
#[derive(Debug, Clone, Default)]
pub(crate) struct SelectStore {
    items: Vec<SelectItem>,
    excluded_properties: HashSet<String>,
    excluded_columns: HashSet<String>,
    cache: Option<String>,
}

impl SelectStore {
    pub(crate) fn add(&mut self, item: SelectItem) {
        self.items.push(item);
        self.cache = None;
    }

    pub(crate) fn exclude_property(&mut self, property: String) {
        self.excluded_properties.insert(property);
        self.cache = None;
    }

    pub(crate) fn exclude_column(&mut self, column: &Ident) {
        self.excluded_columns.insert(column.sql());
        self.cache = None;
    }

    pub(crate) fn fragment(&mut self, meta: &TableDef, r: &Renderer<'_>) -> String {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }
        let text = if self.items.is_empty() {
            let columns: Vec<String> = meta
                .columns()
                .iter()
                .filter(|c| !self.excluded_properties.contains(c.property()))
                .filter(|c| !self.excluded_columns.contains(&c.column().sql()))
                .map(|c| c.column().qualified(r.alias()))
                .collect();
            if columns.is_empty() {
                "*".to_string()
            } else {
                columns.join(", ")
            }
        } else {
            let rendered: Vec<String> = self.items.iter().map(|i| i.render(r)).collect();
            rendered.join(", ")
        };
        self.cache = Some(text.clone());
        text
    }
}

/// A clause-level column reference: validated column or trusted text.
#[derive(Debug, Clone)]
pub(crate) enum ColumnRef {
    Column(Ident),
    Expr(String),
}

impl ColumnRef {
    fn render(&self, r: &Renderer<'_>) -> String {
        match self {
            ColumnRef::Column(column) => column.qualified(r.alias()),
            ColumnRef::Expr(text) => text.clone(),
        }
    }
}

/// GROUP BY key accumulator.
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupStore {
    keys: Vec<ColumnRef>,
    cache: Option<Option<String>>,
}

impl GroupStore {
    pub(crate) fn add(&mut self, key: ColumnRef) {
        self.keys.push(key);
        self.cache = None;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn fragment(&mut self, r: &Renderer<'_>) -> Option<String> {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }
        let joined = (!self.keys.is_empty()).then(|| {
            self.keys
                .iter()
                .map(|k| k.render(r))
                .collect::<Vec<_>>()
                .join(", ")
        });
        self.cache = Some(joined.clone());
        joined
    }
}

/// One ORDER BY entry; rendering goes through the dialect so null
/// precedence stays a dialect concern.
#[derive(Debug, Clone)]
pub(crate) struct OrderSpec {
    pub(crate) item: ColumnRef,
    pub(crate) direction: OrderDirection,
    pub(crate) nulls: Option<NullsOrder>,
}

/// ORDER BY entry accumulator.
#[derive(Debug, Clone, Default)]
pub(crate) struct OrderStore {
    items: Vec<OrderSpec>,
    cache: Option<Option<String>>,
}

impl OrderStore {
    pub(crate) fn add(&mut self, spec: OrderSpec) {
        self.items.push(spec);
        self.cache = None;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn fragment(&mut self, r: &Renderer<'_>) -> Option<String> {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }
        let joined = (!self.items.is_empty()).then(|| {
            self.items
                .iter()
                .map(|spec| r.order_item(&spec.item.render(r), spec.direction, spec.nulls))
                .collect::<Vec<_>>()
                .join(", ")
        });
        self.cache = Some(joined.clone());
        joined
    }
}

/// Raw trailing text, trusted verbatim. Empty adds are dropped.
#[derive(Debug, Clone, Default)]
pub(crate) struct TailStore {
    parts: Vec<String>,
    cache: Option<Option<String>>,
}

impl TailStore {
    pub(crate) fn add(&mut self, raw: String) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
            self.cache = None;
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn fragment(&mut self) -> Option<String> {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }
        let joined = (!self.parts.is_empty()).then(|| self.parts.join(" "));
        self.cache = Some(joined.clone());
        joined
    }
}

/// Drop one leading `AND `/`OR ` keyword. Raw HAVING templates often carry
/// one out of habit; the clause keyword replaces it.
pub(crate) fn strip_leading_connector(text: &str) -> &str {
    let trimmed = text.trim_start();
    for keyword in ["AND ", "OR "] {
        if let Some(head) = trimmed.get(..keyword.len())
            && head.eq_ignore_ascii_case(keyword)
        {
            return trimmed[keyword.len()..].trim_start();
        }
    }
    trimmed
}
