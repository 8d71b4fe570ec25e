//! Clause routing and whole-fragment assembly.
//!
//! [`FragmentManager`] owns one storage per clause kind and concatenates
//! them in a fixed order: conditions, GROUP BY, HAVING, ORDER BY, trailing
//! raw text. Empty clauses are skipped and non-empty ones are joined with a
//! single space, so the result drops straight into a statement after a
//! `WHERE` keyword (or after the table reference when no conditions exist).

use crate::clause::{
    ColumnRef, GroupStore, OrderSpec, OrderStore, PredicateStore, SelectItem, SelectStore,
    TailStore, strip_leading_connector,
};
use crate::ident::Ident;
use crate::meta::TableDef;
use crate::predicate::Predicate;
use crate::render::Renderer;

#[derive(Debug, Clone, Default)]
pub(crate) struct FragmentManager {
    conditions: PredicateStore,
    selects: SelectStore,
    groups: GroupStore,
    having: PredicateStore,
    orders: OrderStore,
    tail: TailStore,
}

impl FragmentManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_condition(&mut self, predicate: Predicate) {
        self.conditions.add(predicate);
    }

    pub(crate) fn add_having(&mut self, predicate: Predicate) {
        self.having.add(predicate);
    }

    pub(crate) fn add_select(&mut self, item: SelectItem) {
        self.selects.add(item);
    }

    pub(crate) fn exclude_property(&mut self, property: String) {
        self.selects.exclude_property(property);
    }

    pub(crate) fn exclude_column(&mut self, column: &Ident) {
        self.selects.exclude_column(column);
    }

    pub(crate) fn add_group(&mut self, key: ColumnRef) {
        self.groups.add(key);
    }

    pub(crate) fn add_order(&mut self, spec: OrderSpec) {
        self.orders.add(spec);
    }

    pub(crate) fn add_tail(&mut self, raw: String) {
        self.tail.add(raw);
    }

    /// Drain the accumulated condition predicates (group wrapping).
    pub(crate) fn take_conditions(&mut self) -> Vec<Predicate> {
        self.conditions.take_all()
    }

    pub(crate) fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// True when any clause the complete fragment covers holds elements.
    pub(crate) fn has_fragment(&self) -> bool {
        !self.conditions.is_empty()
            || !self.groups.is_empty()
            || !self.having.is_empty()
            || !self.orders.is_empty()
            || !self.tail.is_empty()
    }

    /// True when the fragment groups rows (GROUP BY keys or HAVING
    /// predicates); counting such a fragment needs a subquery.
    pub(crate) fn has_grouping(&self) -> bool {
        !self.groups.is_empty() || !self.having.is_empty()
    }

    pub(crate) fn conditions_fragment(&mut self, r: &Renderer<'_>) -> Option<String> {
        self.conditions.fragment(r)
    }

    pub(crate) fn select_fragment(&mut self, meta: &TableDef, r: &Renderer<'_>) -> String {
        self.selects.fragment(meta, r)
    }

    /// GROUP BY keys without the keyword; the override replaces them.
    pub(crate) fn group_fragment(
        &mut self,
        r: &Renderer<'_>,
        group_by_override: Option<&str>,
    ) -> Option<String> {
        match group_by_override {
            Some(keys) => Some(keys.to_string()),
            None => self.groups.fragment(r),
        }
    }

    /// HAVING body without the keyword, leading connector stripped.
    pub(crate) fn having_fragment(&mut self, r: &Renderer<'_>) -> Option<String> {
        self.having
            .fragment(r)
            .map(|text| strip_leading_connector(&text).to_string())
    }

    pub(crate) fn order_fragment(&mut self, r: &Renderer<'_>) -> Option<String> {
        self.orders.fragment(r)
    }

    pub(crate) fn tail_fragment(&mut self) -> Option<String> {
        self.tail.fragment()
    }

    /// Everything after the conditions: GROUP BY, HAVING, ORDER BY, tail.
    pub(crate) fn trailing_fragment(
        &mut self,
        r: &Renderer<'_>,
        group_by_override: Option<&str>,
    ) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(keys) = self.group_fragment(r, group_by_override) {
            parts.push(format!("GROUP BY {keys}"));
        }
        if let Some(body) = self.having_fragment(r) {
            parts.push(format!("HAVING {body}"));
        }
        if let Some(items) = self.order_fragment(r) {
            parts.push(format!("ORDER BY {items}"));
        }
        if let Some(raw) = self.tail_fragment() {
            parts.push(raw);
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// The whole fragment in clause order. Empty string when nothing
    /// accumulated.
    pub(crate) fn complete_fragment(
        &mut self,
        r: &Renderer<'_>,
        group_by_override: Option<&str>,
    ) -> String {
        match (
            self.conditions_fragment(r),
            self.trailing_fragment(r, group_by_override),
        ) {
            (Some(conditions), Some(trailing)) => format!("{conditions} {trailing}"),
            (Some(conditions), None) => conditions,
            (None, Some(trailing)) => trailing,
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ParamBinder;
    use crate::dialect::OrderDirection;
    use crate::predicate::{Connector, Target, TemplateArgs};
    use crate::render::BindRequest;

    fn target(name: &str) -> Target {
        Target::from(Ident::parse(name).unwrap())
    }

    #[test]
    fn clauses_assemble_in_fixed_order() {
        let binder = ParamBinder::new();
        let r = Renderer::new(&binder, None, None);
        let mut manager = FragmentManager::new();
        manager.add_order(OrderSpec {
            item: ColumnRef::Column(Ident::parse("cnt").unwrap()),
            direction: OrderDirection::Desc,
            nulls: None,
        });
        manager.add_tail("LIMIT 5".to_string());
        manager.add_having(Predicate::template(
            None,
            "COUNT(*) > {0}",
            TemplateArgs::single(BindRequest::bind(3_i64)),
        )
        .unwrap());
        manager.add_group(ColumnRef::Column(Ident::parse("role").unwrap()));
        manager.add_condition(
            Predicate::eq(target("status"), "ACTIVE").with_connector_if_unset(Connector::And),
        );

        assert_eq!(
            manager.complete_fragment(&r, None),
            "status = :seq_0 GROUP BY role HAVING COUNT(*) > :seq_1 ORDER BY cnt DESC LIMIT 5"
        );
    }

    #[test]
    fn group_override_replaces_keys_and_forces_the_clause() {
        let binder = ParamBinder::new();
        let r = Renderer::new(&binder, None, None);
        let mut manager = FragmentManager::new();
        assert_eq!(
            manager.complete_fragment(&r, Some("tenant_id")),
            "GROUP BY tenant_id"
        );

        manager.add_group(ColumnRef::Column(Ident::parse("role").unwrap()));
        assert_eq!(
            manager.complete_fragment(&r, Some("tenant_id, role")),
            "GROUP BY tenant_id, role"
        );
        assert_eq!(manager.complete_fragment(&r, None), "GROUP BY role");
    }

    #[test]
    fn having_templates_lose_their_leading_connector() {
        let binder = ParamBinder::new();
        let r = Renderer::new(&binder, None, None);
        let mut manager = FragmentManager::new();
        manager.add_having(Predicate::template(
            None,
            "AND SUM(amount) > {0}",
            TemplateArgs::single(BindRequest::bind(100_i64)),
        )
        .unwrap());
        assert_eq!(
            manager.complete_fragment(&r, None),
            "HAVING SUM(amount) > :seq_0"
        );
    }

    #[test]
    fn empty_manager_renders_an_empty_fragment() {
        let binder = ParamBinder::new();
        let r = Renderer::new(&binder, None, None);
        let mut manager = FragmentManager::new();
        assert!(!manager.has_fragment());
        assert!(!manager.has_conditions());
        assert_eq!(manager.complete_fragment(&r, None), "");
    }

    #[test]
    fn conditions_bind_before_having_in_text_order() {
        let binder = ParamBinder::new();
        let r = Renderer::new(&binder, None, None);
        let mut manager = FragmentManager::new();
        manager.add_having(Predicate::template(
            None,
            "COUNT(*) > {0}",
            TemplateArgs::single(BindRequest::bind(3_i64)),
        )
        .unwrap());
        manager.add_condition(Predicate::eq(target("a"), 1_i32));
        let text = manager.complete_fragment(&r, None);
        // Insertion order does not matter; placeholder numbering follows
        // the rendered text left to right.
        assert_eq!(text, "a = :seq_0 HAVING COUNT(*) > :seq_1");
    }
}
