//! The fluent assembly façade.
//!
//! A [`Criteria`] wraps one relation's metadata plus a shared parameter
//! binder and accumulates predicates, selections, grouping, ordering and
//! trailing text. Nothing binds until the first render, so placeholder
//! numbering follows the rendered text left to right no matter in which
//! order the clauses were populated, and repeated renders reuse the
//! placeholders they already allocated.

use std::fmt;
use std::sync::Arc;

use tokio_postgres::types::ToSql;

use crate::binder::{Param, ParamBinder, Params};
use crate::clause::{ColumnRef, OrderSpec, SelectItem};
use crate::dialect::{Dialect, NullsOrder, OrderDirection};
use crate::error::{StitchError, StitchResult};
use crate::fragments::FragmentManager;
use crate::ident::Ident;
use crate::meta::TableDef;
use crate::predicate::{CompareOp, Connector, MatchMode, Predicate, Target, TemplateArgs};
use crate::render::{RenderedFragment, Renderer};

/// Fluent builder for one relation's SQL fragment.
///
/// Fallible builder methods return `StitchResult<&mut Self>` and chain
/// with `?`; the cursor methods [`and`](Criteria::and) / [`or`](Criteria::or)
/// are infallible and return `&mut Self` directly.
///
/// ```
/// use sqlstitch::{Criteria, TableDef};
///
/// # fn main() -> sqlstitch::StitchResult<()> {
/// let users = TableDef::new("users")?
///     .column("status", "status")?
///     .column("age", "age")?;
///
/// let mut criteria = Criteria::new(users);
/// criteria.eq("status", "ACTIVE")?.between("age", 18_i32, 30_i32)?;
///
/// let rendered = criteria.render();
/// assert_eq!(
///     rendered.fragment(),
///     "status = :seq_0 AND age BETWEEN :seq_1 AND :seq_2"
/// );
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct Criteria {
    meta: Arc<TableDef>,
    alias: Option<String>,
    dialect: Option<Arc<dyn Dialect>>,
    binder: Arc<ParamBinder>,
    strict: bool,
    cursor: Connector,
    fragments: FragmentManager,
}

impl Criteria {
    /// A strict builder over the given relation with a fresh binder.
    pub fn new(meta: impl Into<Arc<TableDef>>) -> Self {
        Criteria {
            meta: meta.into(),
            alias: None,
            dialect: None,
            binder: Arc::new(ParamBinder::new()),
            strict: true,
            cursor: Connector::And,
            fragments: FragmentManager::new(),
        }
    }

    /// Qualify simple column references with a table alias. The alias must
    /// be a single bare identifier.
    pub fn alias(mut self, alias: &str) -> StitchResult<Self> {
        let ident = Ident::parse(alias)?;
        if !ident.is_simple() {
            return Err(StitchError::identifier(format!(
                "alias must be a single identifier, got '{alias}'"
            )));
        }
        self.alias = Some(ident.sql());
        Ok(self)
    }

    /// Install a dialect for case folding and order-by null precedence.
    pub fn dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Degrade unresolved properties to a logged skip instead of an error.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Join the next appended predicate with `AND` (the default).
    pub fn and(&mut self) -> &mut Self {
        self.cursor = Connector::And;
        self
    }

    /// Join the next appended predicate with `OR`.
    ///
    /// The cursor applies to exactly one append: once a predicate (or a
    /// non-empty group) lands, it resets to `AND`. A suppressed call, e.g.
    /// an `_opt` fed `None`, appends nothing and leaves the cursor armed.
    pub fn or(&mut self) -> &mut Self {
        self.cursor = Connector::Or;
        self
    }

    // ── Conditions ──────────────────────────────────────────────────────

    /// Resolve the predicate's targets and append it under the cursor
    /// connector. Every condition method funnels through here.
    pub fn add_predicate(&mut self, predicate: Predicate) -> StitchResult<&mut Self> {
        let resolved =
            predicate.map_targets(&mut |t| resolve_target(&self.meta, self.strict, t))?;
        let connector = self.cursor;
        self.cursor = Connector::And;
        self.fragments
            .add_condition(resolved.with_connector_if_unset(connector));
        Ok(self)
    }

    pub fn eq<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::eq(target, value))
    }

    pub fn ne<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::ne(target, value))
    }

    pub fn gt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::gt(target, value))
    }

    pub fn ge<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::ge(target, value))
    }

    pub fn lt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::lt(target, value))
    }

    pub fn le<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::le(target, value))
    }

    /// `target BETWEEN begin AND end`.
    pub fn between<B, E>(
        &mut self,
        target: impl Into<Target>,
        begin: B,
        end: E,
    ) -> StitchResult<&mut Self>
    where
        B: ToSql + Send + Sync + 'static,
        E: ToSql + Send + Sync + 'static,
    {
        self.add_predicate(Predicate::between(target, begin, end))
    }

    /// `target NOT BETWEEN begin AND end`.
    pub fn not_between<B, E>(
        &mut self,
        target: impl Into<Target>,
        begin: B,
        end: E,
    ) -> StitchResult<&mut Self>
    where
        B: ToSql + Send + Sync + 'static,
        E: ToSql + Send + Sync + 'static,
    {
        self.add_predicate(Predicate::not_between(target, begin, end))
    }

    /// `target IN (..)`. An empty list renders the constant-false `1=0`.
    pub fn in_list<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        values: impl IntoIterator<Item = T>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::in_list(target, values))
    }

    /// `target NOT IN (..)`. An empty list renders the constant-true `1=1`.
    pub fn not_in_list<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        values: impl IntoIterator<Item = T>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::not_in_list(target, values))
    }

    /// `target LIKE value` with the value bound exactly as given.
    pub fn like(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::like(target, value))
    }

    pub fn not_like(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::not_like(target, value))
    }

    /// `target LIKE 'value%'`.
    pub fn starts_with(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::pattern(
            target,
            value,
            MatchMode::Prefix,
            false,
            false,
            None,
        ))
    }

    /// `target LIKE '%value'`.
    pub fn ends_with(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::pattern(
            target,
            value,
            MatchMode::Suffix,
            false,
            false,
            None,
        ))
    }

    /// `target LIKE '%value%'`.
    pub fn contains(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::pattern(
            target,
            value,
            MatchMode::Contains,
            false,
            false,
            None,
        ))
    }

    /// Case-insensitive `contains`: both sides go through the dialect's
    /// case folding; the bound value itself is never mutated.
    pub fn contains_ci(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::pattern(
            target,
            value,
            MatchMode::Contains,
            false,
            true,
            None,
        ))
    }

    pub fn is_null(&mut self, target: impl Into<Target>) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::is_null(target))
    }

    pub fn is_not_null(&mut self, target: impl Into<Target>) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::is_not_null(target))
    }

    /// A free-form condition with `{0}`/`{1}`../`{name}` markers.
    pub fn template(
        &mut self,
        text: impl Into<String>,
        args: TemplateArgs,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::template(None, text, args)?)
    }

    /// A templated condition over a target: `{0}` is the resolved target
    /// reference and values start at `{1}`.
    ///
    /// ```
    /// use sqlstitch::{col, BindRequest, Criteria, TableDef, TemplateArgs};
    ///
    /// # fn main() -> sqlstitch::StitchResult<()> {
    /// let mut criteria = Criteria::new(TableDef::new("users")?);
    /// criteria.template_on(
    ///     col("name"),
    ///     "LENGTH({0}) > {1}",
    ///     TemplateArgs::single(BindRequest::bind(0_i32)),
    /// )?;
    /// assert_eq!(criteria.render().fragment(), "LENGTH(name) > :seq_0");
    /// # Ok(())
    /// # }
    /// ```
    pub fn template_on(
        &mut self,
        target: impl Into<Target>,
        text: impl Into<String>,
        args: TemplateArgs,
    ) -> StitchResult<&mut Self> {
        self.add_predicate(Predicate::template(Some(target.into()), text, args)?)
    }

    // ── Suppression guards ──────────────────────────────────────────────

    pub fn eq_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        self.compare_opt(target, CompareOp::Eq, value)
    }

    pub fn ne_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        self.compare_opt(target, CompareOp::Ne, value)
    }

    pub fn gt_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        self.compare_opt(target, CompareOp::Gt, value)
    }

    pub fn ge_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        self.compare_opt(target, CompareOp::Ge, value)
    }

    pub fn lt_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        self.compare_opt(target, CompareOp::Lt, value)
    }

    pub fn le_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        self.compare_opt(target, CompareOp::Le, value)
    }

    fn compare_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        op: CompareOp,
        value: Option<T>,
    ) -> StitchResult<&mut Self> {
        match value {
            Some(value) => self.add_predicate(Predicate::compare(target, op, value)),
            None => Ok(self),
        }
    }

    pub fn like_opt(
        &mut self,
        target: impl Into<Target>,
        value: Option<impl Into<String>>,
    ) -> StitchResult<&mut Self> {
        match value {
            Some(value) => self.like(target, value),
            None => Ok(self),
        }
    }

    pub fn contains_opt(
        &mut self,
        target: impl Into<Target>,
        value: Option<impl Into<String>>,
    ) -> StitchResult<&mut Self> {
        match value {
            Some(value) => self.contains(target, value),
            None => Ok(self),
        }
    }

    /// `in_list` when present. Unlike `in_list`, an empty list counts as
    /// absent here and appends nothing.
    pub fn in_opt<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        values: Option<impl IntoIterator<Item = T>>,
    ) -> StitchResult<&mut Self> {
        let Some(values) = values else {
            return Ok(self);
        };
        let values: Vec<Param> = values.into_iter().map(Param::new).collect();
        if values.is_empty() {
            return Ok(self);
        }
        self.add_predicate(Predicate::membership(target, false, values))
    }

    pub fn between_opt<B, E>(
        &mut self,
        target: impl Into<Target>,
        bounds: Option<(B, E)>,
    ) -> StitchResult<&mut Self>
    where
        B: ToSql + Send + Sync + 'static,
        E: ToSql + Send + Sync + 'static,
    {
        match bounds {
            Some((begin, end)) => self.between(target, begin, end),
            None => Ok(self),
        }
    }

    /// `eq` when the matcher accepts the value; nothing otherwise.
    pub fn eq_if<T, F>(
        &mut self,
        target: impl Into<Target>,
        value: T,
        accept: F,
    ) -> StitchResult<&mut Self>
    where
        T: ToSql + Send + Sync + 'static,
        F: FnOnce(&T) -> bool,
    {
        if accept(&value) {
            self.eq(target, value)
        } else {
            Ok(self)
        }
    }

    pub fn ne_if<T, F>(
        &mut self,
        target: impl Into<Target>,
        value: T,
        accept: F,
    ) -> StitchResult<&mut Self>
    where
        T: ToSql + Send + Sync + 'static,
        F: FnOnce(&T) -> bool,
    {
        if accept(&value) {
            self.ne(target, value)
        } else {
            Ok(self)
        }
    }

    pub fn contains_if<F>(
        &mut self,
        target: impl Into<Target>,
        value: impl Into<String>,
        accept: F,
    ) -> StitchResult<&mut Self>
    where
        F: FnOnce(&str) -> bool,
    {
        let value = value.into();
        if accept(&value) {
            self.contains(target, value)
        } else {
            Ok(self)
        }
    }

    /// Apply the whole sub-chain only when `flag` holds.
    pub fn when<F>(&mut self, flag: bool, f: F) -> StitchResult<&mut Self>
    where
        F: for<'c> FnOnce(&'c mut Criteria) -> StitchResult<&'c mut Criteria>,
    {
        if flag {
            f(self)?;
        }
        Ok(self)
    }

    // ── Nesting ─────────────────────────────────────────────────────────

    /// A parenthesized group joined with the cursor connector.
    ///
    /// The closure builds on a child façade sharing this builder's binder,
    /// metadata, alias and strictness; only its condition predicates are
    /// collected. A closure that appends nothing contributes nothing and
    /// leaves the cursor untouched.
    pub fn nested<F>(&mut self, f: F) -> StitchResult<&mut Self>
    where
        F: for<'c> FnOnce(&'c mut Criteria) -> StitchResult<&'c mut Criteria>,
    {
        let connector = self.cursor;
        self.append_group(connector, false, f)
    }

    /// A parenthesized group joined with `AND` regardless of the cursor.
    pub fn and_group<F>(&mut self, f: F) -> StitchResult<&mut Self>
    where
        F: for<'c> FnOnce(&'c mut Criteria) -> StitchResult<&'c mut Criteria>,
    {
        self.append_group(Connector::And, false, f)
    }

    /// A parenthesized group joined with `OR` regardless of the cursor.
    pub fn or_group<F>(&mut self, f: F) -> StitchResult<&mut Self>
    where
        F: for<'c> FnOnce(&'c mut Criteria) -> StitchResult<&'c mut Criteria>,
    {
        self.append_group(Connector::Or, false, f)
    }

    /// A negated group: `NOT (..)`, joined with the cursor connector.
    pub fn not<F>(&mut self, f: F) -> StitchResult<&mut Self>
    where
        F: for<'c> FnOnce(&'c mut Criteria) -> StitchResult<&'c mut Criteria>,
    {
        let connector = self.cursor;
        self.append_group(connector, true, f)
    }

    fn append_group<F>(&mut self, connector: Connector, negate: bool, f: F) -> StitchResult<&mut Self>
    where
        F: for<'c> FnOnce(&'c mut Criteria) -> StitchResult<&'c mut Criteria>,
    {
        let mut child = self.child();
        f(&mut child)?;
        let children = child.fragments.take_conditions();
        if children.is_empty() {
            return Ok(self);
        }
        self.cursor = Connector::And;
        self.fragments
            .add_condition(Predicate::group(negate, children).with_connector_if_unset(connector));
        Ok(self)
    }

    /// A child façade over the same relation, binder and settings.
    fn child(&self) -> Criteria {
        Criteria {
            meta: Arc::clone(&self.meta),
            alias: self.alias.clone(),
            dialect: self.dialect.clone(),
            binder: Arc::clone(&self.binder),
            strict: self.strict,
            cursor: Connector::And,
            fragments: FragmentManager::new(),
        }
    }

    // ── HAVING ──────────────────────────────────────────────────────────

    /// Resolve and append a HAVING predicate under the cursor connector.
    pub fn add_having(&mut self, predicate: Predicate) -> StitchResult<&mut Self> {
        let resolved =
            predicate.map_targets(&mut |t| resolve_target(&self.meta, self.strict, t))?;
        let connector = self.cursor;
        self.cursor = Connector::And;
        self.fragments
            .add_having(resolved.with_connector_if_unset(connector));
        Ok(self)
    }

    /// `HAVING <target> <op> <value>`; the target is usually an
    /// [`expr`](crate::predicate::expr) aggregate.
    pub fn having_cmp<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        op: CompareOp,
        value: T,
    ) -> StitchResult<&mut Self> {
        self.add_having(Predicate::compare(target, op, value))
    }

    /// `HAVING <target> BETWEEN a AND b` from a runtime bound list; the
    /// list must hold exactly two values.
    pub fn having_range<T: ToSql + Send + Sync + 'static>(
        &mut self,
        target: impl Into<Target>,
        bounds: impl IntoIterator<Item = T>,
    ) -> StitchResult<&mut Self> {
        let bounds: Vec<Param> = bounds.into_iter().map(Param::new).collect();
        self.add_having(Predicate::range_from(target, false, bounds)?)
    }

    /// A free-form HAVING condition; a leading `AND `/`OR ` in the text is
    /// dropped when the clause is assembled.
    pub fn having_template(
        &mut self,
        text: impl Into<String>,
        args: TemplateArgs,
    ) -> StitchResult<&mut Self> {
        self.add_having(Predicate::template(None, text, args)?)
    }

    // ── SELECT list ─────────────────────────────────────────────────────

    /// Add explicit selections: properties, `col(..)` paths or `expr(..)`
    /// text. Explicit selections always win over exclusions.
    pub fn select<I, T>(&mut self, targets: I) -> StitchResult<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        for target in targets {
            match resolve_target(&self.meta, self.strict, target.into())? {
                Target::Resolved { column, .. } => {
                    self.fragments.add_select(SelectItem::Column(column));
                }
                Target::Expr(text) => self.fragments.add_select(SelectItem::Raw(text)),
                _ => {}
            }
        }
        Ok(self)
    }

    /// Add `FUNC(expr)` with an optional validated alias. Aggregates are
    /// never alias-qualified.
    pub fn select_aggregate(
        &mut self,
        func: impl Into<String>,
        expr: impl Into<String>,
        alias: Option<&str>,
    ) -> StitchResult<&mut Self> {
        let alias = alias.map(Ident::parse).transpose()?;
        self.fragments.add_select(SelectItem::Aggregate {
            func: func.into(),
            expr: expr.into(),
            alias,
        });
        Ok(self)
    }

    /// Drop a property from the default metadata expansion. Ignored once
    /// any explicit selection exists.
    pub fn exclude(&mut self, property: impl Into<String>) -> &mut Self {
        self.fragments.exclude_property(property.into());
        self
    }

    /// Drop a column (by its SQL name) from the default expansion.
    pub fn exclude_column(&mut self, column: &str) -> StitchResult<&mut Self> {
        let column = Ident::parse(column)?;
        self.fragments.exclude_column(&column);
        Ok(self)
    }

    // ── GROUP BY / ORDER BY / tail ──────────────────────────────────────

    pub fn group_by(&mut self, target: impl Into<Target>) -> StitchResult<&mut Self> {
        if let Some(key) = self.column_ref(target.into())? {
            self.fragments.add_group(key);
        }
        Ok(self)
    }

    pub fn order_by(
        &mut self,
        target: impl Into<Target>,
        direction: OrderDirection,
    ) -> StitchResult<&mut Self> {
        self.order_entry(target.into(), direction, None)
    }

    pub fn order_by_asc(&mut self, target: impl Into<Target>) -> StitchResult<&mut Self> {
        self.order_entry(target.into(), OrderDirection::Asc, None)
    }

    pub fn order_by_desc(&mut self, target: impl Into<Target>) -> StitchResult<&mut Self> {
        self.order_entry(target.into(), OrderDirection::Desc, None)
    }

    /// Order with an explicit null precedence, rendered by the dialect.
    pub fn order_by_nulls(
        &mut self,
        target: impl Into<Target>,
        direction: OrderDirection,
        nulls: NullsOrder,
    ) -> StitchResult<&mut Self> {
        self.order_entry(target.into(), direction, Some(nulls))
    }

    fn order_entry(
        &mut self,
        target: Target,
        direction: OrderDirection,
        nulls: Option<NullsOrder>,
    ) -> StitchResult<&mut Self> {
        if let Some(item) = self.column_ref(target)? {
            self.fragments.add_order(OrderSpec {
                item,
                direction,
                nulls,
            });
        }
        Ok(self)
    }

    /// Raw trailing text (`LIMIT ..`, `FOR UPDATE`), trusted verbatim and
    /// emitted after every rendered clause.
    pub fn tail(&mut self, raw: impl Into<String>) -> &mut Self {
        self.fragments.add_tail(raw.into());
        self
    }

    fn column_ref(&self, target: Target) -> StitchResult<Option<ColumnRef>> {
        Ok(match resolve_target(&self.meta, self.strict, target)? {
            Target::Resolved { column, .. } => Some(ColumnRef::Column(column)),
            Target::Expr(text) => Some(ColumnRef::Expr(text)),
            _ => None,
        })
    }

    // ── Rendering ───────────────────────────────────────────────────────

    /// True when any condition predicate has been appended.
    pub fn has_conditions(&self) -> bool {
        self.fragments.has_conditions()
    }

    /// True when any clause the complete fragment covers holds elements.
    pub fn has_fragment(&self) -> bool {
        self.fragments.has_fragment()
    }

    /// The joined conditions without a `WHERE` keyword, or `None` when no
    /// predicate rendered anything.
    pub fn conditions_fragment(&mut self) -> Option<String> {
        let r = Renderer::new(&self.binder, self.alias.as_deref(), self.dialect.as_deref());
        self.fragments.conditions_fragment(&r)
    }

    /// The whole fragment in clause order: conditions, `GROUP BY` (the
    /// override replaces accumulated keys and is emitted even without
    /// them), `HAVING`, `ORDER BY`, trailing text. Empty string when
    /// nothing rendered.
    pub fn complete_fragment(&mut self, group_by_override: Option<&str>) -> String {
        let r = Renderer::new(&self.binder, self.alias.as_deref(), self.dialect.as_deref());
        self.fragments.complete_fragment(&r, group_by_override)
    }

    /// Snapshot of every parameter bound so far, in sequence order.
    pub fn params(&self) -> Params {
        self.binder.snapshot()
    }

    /// Render the complete fragment together with its parameters.
    pub fn render(&mut self) -> RenderedFragment {
        let fragment = self.complete_fragment(None);
        let params = self.binder.snapshot();
        tracing::debug!(
            target: "sqlstitch",
            sql = %fragment,
            param_count = params.len(),
            "assembled fragment"
        );
        RenderedFragment::new(fragment, params)
    }

    /// Render a full `SELECT` statement over this relation.
    pub fn render_select(&mut self) -> RenderedFragment {
        let r = Renderer::new(&self.binder, self.alias.as_deref(), self.dialect.as_deref());
        let select = self.fragments.select_fragment(&self.meta, &r);
        let mut sql = format!("SELECT {select} FROM {}", self.meta.table().sql());
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(alias);
        }
        if let Some(conditions) = self.fragments.conditions_fragment(&r) {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        if let Some(trailing) = self.fragments.trailing_fragment(&r, None) {
            sql.push(' ');
            sql.push_str(&trailing);
        }
        let params = self.binder.snapshot();
        tracing::debug!(
            target: "sqlstitch",
            sql = %sql,
            param_count = params.len(),
            "assembled select"
        );
        RenderedFragment::new(sql, params)
    }

    /// Render a `SELECT COUNT(*)` over this relation. A grouped fragment
    /// counts its groups through a subquery; `ORDER BY` and trailing text
    /// are dropped either way.
    pub fn render_count(&mut self) -> RenderedFragment {
        let r = Renderer::new(&self.binder, self.alias.as_deref(), self.dialect.as_deref());
        let mut table = self.meta.table().sql();
        if let Some(alias) = &self.alias {
            table.push(' ');
            table.push_str(alias);
        }
        let conditions = self.fragments.conditions_fragment(&r);
        let sql = if self.fragments.has_grouping() {
            let mut inner = format!("SELECT 1 FROM {table}");
            if let Some(conditions) = &conditions {
                inner.push_str(" WHERE ");
                inner.push_str(conditions);
            }
            if let Some(keys) = self.fragments.group_fragment(&r, None) {
                inner.push_str(" GROUP BY ");
                inner.push_str(&keys);
            }
            if let Some(body) = self.fragments.having_fragment(&r) {
                inner.push_str(" HAVING ");
                inner.push_str(&body);
            }
            format!("SELECT COUNT(*) FROM ({inner}) AS t")
        } else {
            let mut sql = format!("SELECT COUNT(*) FROM {table}");
            if let Some(conditions) = &conditions {
                sql.push_str(" WHERE ");
                sql.push_str(conditions);
            }
            sql
        };
        let params = self.binder.snapshot();
        tracing::debug!(
            target: "sqlstitch",
            sql = %sql,
            param_count = params.len(),
            "assembled count"
        );
        RenderedFragment::new(sql, params)
    }
}

impl fmt::Debug for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Dialect is a plain trait object; print presence only.
        f.debug_struct("Criteria")
            .field("meta", &self.meta)
            .field("alias", &self.alias)
            .field("dialect", &self.dialect.as_ref().map(|_| "dyn Dialect"))
            .field("binder", &self.binder)
            .field("strict", &self.strict)
            .field("cursor", &self.cursor)
            .field("fragments", &self.fragments)
            .finish()
    }
}

/// Map a target through relation metadata. Properties resolve to their
/// column (with its declared bind hint); raw columns are validated;
/// expressions pass through untouched. A miss raises in strict mode and
/// degrades to `Unresolved` with a WARN otherwise.
fn resolve_target(meta: &TableDef, strict: bool, target: Target) -> StitchResult<Target> {
    match target {
        Target::Property(name) => match meta.resolve(&name) {
            Some(def) => Ok(Target::Resolved {
                column: def.column().clone(),
                hint: def.hint(),
            }),
            None if strict => Err(StitchError::unresolved(meta.table().sql(), name)),
            None => {
                tracing::warn!(
                    target: "sqlstitch",
                    relation = %meta.table().sql(),
                    property = %name,
                    "property has no column mapping; predicate renders nothing"
                );
                Ok(Target::Unresolved(name))
            }
        },
        Target::Column(raw) => Ok(Target::Resolved {
            column: Ident::parse(&raw)?,
            hint: None,
        }),
        other => Ok(other),
    }
}
