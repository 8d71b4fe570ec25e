//! Placeholder rendering and the assembled output.
//!
//! [`Renderer`] is the borrowed context predicates render through: the
//! shared binder plus the façade's alias and dialect. [`RenderedFragment`]
//! is what callers get back, fragment text with `:seq_<n>` placeholders plus
//! the ordered parameter map, with a positional (`$<k>`) conversion for
//! executors that bind by position.

use tokio_postgres::types::ToSql;

use crate::binder::{Param, ParamBinder, Params, TypeHint};
use crate::dialect::{AnsiDialect, Dialect, NullsOrder, OrderDirection};

/// One renderable value slot: bind it, or embed pre-rendered text.
#[derive(Debug, Clone)]
pub enum BindRequest {
    /// Allocate a placeholder and store the value.
    Bind {
        value: Param,
        hint: Option<TypeHint>,
    },
    /// Embed the text verbatim, no binder interaction. Trusted like raw SQL.
    Literal(String),
}

impl BindRequest {
    /// Bind a value under the next placeholder name.
    pub fn bind<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        BindRequest::Bind {
            value: Param::new(value),
            hint: None,
        }
    }

    /// Bind a value with a declared type; the placeholder carries a cast.
    pub fn bind_hinted<T: ToSql + Send + Sync + 'static>(value: T, hint: TypeHint) -> Self {
        BindRequest::Bind {
            value: Param::new(value),
            hint: Some(hint),
        }
    }

    /// Embed a display rendering directly into the SQL text.
    pub fn literal(value: impl std::fmt::Display) -> Self {
        BindRequest::Literal(value.to_string())
    }
}

/// Borrowed rendering context handed down through storages to predicates.
pub struct Renderer<'a> {
    binder: &'a ParamBinder,
    alias: Option<&'a str>,
    dialect: Option<&'a dyn Dialect>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(
        binder: &'a ParamBinder,
        alias: Option<&'a str>,
        dialect: Option<&'a dyn Dialect>,
    ) -> Self {
        Self {
            binder,
            alias,
            dialect,
        }
    }

    fn dialect(&self) -> &dyn Dialect {
        self.dialect.unwrap_or(&AnsiDialect)
    }

    pub(crate) fn alias(&self) -> Option<&str> {
        self.alias
    }

    /// Bind a value and return its placeholder token (`:seq_3`, or
    /// `:seq_3::uuid` when a type is declared).
    pub(crate) fn placeholder(&self, value: Param, hint: Option<TypeHint>) -> String {
        let name = self.binder.bind(value, hint);
        match hint {
            Some(h) => format!(":{name}::{}", h.type_name()),
            None => format!(":{name}"),
        }
    }

    /// Render a bind request: placeholder for `Bind`, text for `Literal`.
    pub(crate) fn request(&self, req: &BindRequest) -> String {
        match req {
            BindRequest::Bind { value, hint } => self.placeholder(value.clone(), *hint),
            BindRequest::Literal(text) => text.clone(),
        }
    }

    pub(crate) fn fold_case(&self, expr: &str) -> String {
        self.dialect().fold_case(expr)
    }

    pub(crate) fn order_item(
        &self,
        column: &str,
        direction: OrderDirection,
        nulls: Option<NullsOrder>,
    ) -> String {
        self.dialect().order_item(column, direction, nulls)
    }
}

/// Final output of one assembly pass: fragment text plus ordered parameters.
#[derive(Debug, Clone)]
pub struct RenderedFragment {
    fragment: String,
    params: Params,
}

impl RenderedFragment {
    pub(crate) fn new(fragment: String, params: Params) -> Self {
        Self { fragment, params }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_parts(self) -> (String, Params) {
        (self.fragment, self.params)
    }

    /// Rewrite `:seq_<n>` placeholders to positional `$<k>` form and return
    /// the matching value slice.
    ///
    /// `$<k>` is the 1-based position of the name in the parameter map, so
    /// the rewrite stays correct even if clause emission reordered names.
    /// `::type` casts are left untouched; a `:name` that is not in the map
    /// is copied through verbatim.
    pub fn positional(&self) -> (String, Vec<&(dyn ToSql + Sync)>) {
        let src = &self.fragment;
        let mut out = String::with_capacity(src.len());
        let mut chars = src.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != ':' {
                out.push(c);
                continue;
            }
            // '::' is a cast, not a placeholder.
            if matches!(chars.peek(), Some(&(_, ':'))) {
                chars.next();
                out.push_str("::");
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while let Some(&(j, nc)) = chars.peek() {
                if nc.is_ascii_alphanumeric() || nc == '_' {
                    end = j + nc.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let name = &src[start..end];
            match self.params.index_of(name) {
                Some(idx) => {
                    out.push('$');
                    out.push_str(&(idx + 1).to_string());
                }
                None => {
                    out.push(':');
                    out.push_str(name);
                }
            }
        }

        (out, self.params.as_refs())
    }
}
